//! OpenID authentication.
//!
//! Steam acts as an OpenID 2.0 provider. The handshake is short:
//!
//! 1. redirect the user to Steam with a [`LoginForm`] encoded as query
//!    parameters
//! 2. Steam redirects the user back to our callback route with an
//!    [`OpenIdPayload`] in the query string
//! 3. we check that the payload was issued for our callback route, and send it
//!    back to Steam to verify that it actually originated from Steam
//! 4. we extract the user's SteamID from the payload

use serde::{Deserialize, Serialize};
use tap::Tap;
use url::Url;

use super::{Error, Result, SteamId};

/// Steam URL to redirect the user to for login.
///
/// This is also where payloads are sent for verification.
pub const LOGIN_URL: &str = "https://steamcommunity.com/openid/login";

/// Form parameters that will be sent to Steam when redirecting a user for
/// login.
#[derive(Debug, Serialize)]
#[allow(clippy::missing_docs_in_private_items)]
pub struct LoginForm<'a>
{
	#[serde(rename = "openid.ns")]
	namespace: &'static str,

	#[serde(rename = "openid.identity")]
	identity: &'static str,

	#[serde(rename = "openid.claimed_id")]
	claimed_id: &'static str,

	#[serde(rename = "openid.mode")]
	mode: &'static str,

	#[serde(rename = "openid.realm")]
	realm: &'a Url,

	#[serde(rename = "openid.return_to")]
	return_to: &'a Url,
}

impl<'a> LoginForm<'a>
{
	/// Creates a new [`LoginForm`].
	///
	/// `realm` is the platform's base URL, `return_to` is our callback route.
	pub const fn new(realm: &'a Url, return_to: &'a Url) -> Self
	{
		Self {
			namespace: "http://specs.openid.net/auth/2.0",
			identity: "http://specs.openid.net/auth/2.0/identifier_select",
			claimed_id: "http://specs.openid.net/auth/2.0/identifier_select",
			mode: "checkid_setup",
			realm,
			return_to,
		}
	}

	/// Generates the URL users are redirected to for logging in with Steam.
	#[tracing::instrument(level = "trace", name = "LoginForm::url", err(Debug, level = "debug"))]
	pub fn url(&self) -> Result<Url>
	{
		let query_string = serde_urlencoded::to_string(self)?;
		let url = Url::parse(LOGIN_URL)?.tap_mut(|url| url.set_query(Some(&query_string)));

		Ok(url)
	}
}

/// Form parameters that Steam will send to us after a successful login.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[allow(clippy::missing_docs_in_private_items)]
pub struct OpenIdPayload
{
	#[serde(rename = "openid.ns")]
	namespace: String,

	#[serde(rename = "openid.identity")]
	identity: Option<String>,

	#[serde(rename = "openid.claimed_id")]
	claimed_id: Url,

	#[serde(rename = "openid.mode")]
	mode: String,

	#[serde(rename = "openid.return_to")]
	return_to: Url,

	#[serde(rename = "openid.op_endpoint")]
	op_endpoint: String,

	#[serde(rename = "openid.response_nonce")]
	response_nonce: String,

	#[serde(rename = "openid.invalidate_handle")]
	invalidate_handle: Option<String>,

	#[serde(rename = "openid.assoc_handle")]
	assoc_handle: String,

	#[serde(rename = "openid.signed")]
	signed: String,

	#[serde(rename = "openid.sig")]
	sig: String,
}

impl OpenIdPayload
{
	/// Verifies this payload with Steam and extracts the user's SteamID from
	/// it.
	///
	/// Payloads whose `openid.return_to` does not point at `callback_url` are
	/// rejected before Steam is contacted.
	#[tracing::instrument(
		level = "debug",
		name = "OpenIdPayload::verify",
		err(Debug, level = "debug"),
		skip_all,
		fields(claimed_id = %self.claimed_id, return_to = %self.return_to),
	)]
	pub async fn verify(mut self, http_client: &reqwest::Client, callback_url: &Url)
	-> Result<SteamId>
	{
		if !self.returns_to(callback_url) {
			tracing::debug!(%callback_url, "openid payload was issued for a different site");
			return Err(Error::VerifyOpenIdPayload);
		}

		let steam_id = self.steam_id()?;

		self.mode = String::from("check_authentication");

		let response = http_client
			.post(LOGIN_URL)
			.form(&self)
			.send()
			.await
			.and_then(reqwest::Response::error_for_status)?
			.text()
			.await?;

		if response
			.lines()
			.rfind(|&line| line == "is_valid:true")
			.is_none()
		{
			tracing::debug!(%response, "steam login invalid");
			return Err(Error::VerifyOpenIdPayload);
		}

		tracing::debug!(%steam_id, "user logged in");

		Ok(steam_id)
	}

	/// Whether `openid.return_to` is `callback_url`, ignoring the query string.
	fn returns_to(&self, callback_url: &Url) -> bool
	{
		self.return_to.origin() == callback_url.origin()
			&& self.return_to.path() == callback_url.path()
	}

	/// Extracts the SteamID from this payload, without verifying it.
	pub fn steam_id(&self) -> Result<SteamId>
	{
		SteamId::from_claimed_id(&self.claimed_id).ok_or(Error::InvalidClaimedId)
	}
}
