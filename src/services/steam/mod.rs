//! The [`SteamStrategy`] is responsible for communicating with Steam.
//!
//! It can generate OpenID login URLs, verify the payloads Steam sends back,
//! and fetch profile information about the accounts that logged in.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::url::UrlExt;

mod error;
pub use error::{Error, Result};

pub mod openid;
pub use openid::OpenIdPayload;

mod profile;
pub use profile::Profile;

mod steam_id;
pub use steam_id::SteamId;

/// Steam Web API URL for fetching user information.
const USER_URL: &str = "https://api.steampowered.com/ISteamUser/GetPlayerSummaries/v0002";

/// The name of our strategy.
pub const STRATEGY_NAME: &str = "steam";

/// The route that starts the login flow.
pub const LOGIN_PATH: &str = "/auth/steam";

/// The route Steam redirects users back to.
pub const CALLBACK_PATH: &str = "/auth/steam/callback";

/// The icon used for Steam across the UI.
pub const ICON: &str = "fa-steam";

/// Describes a login strategy to the platform, so it can offer it on the login
/// page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StrategyDescriptor
{
	/// Name of the strategy.
	pub name: String,

	/// Route that starts the login flow.
	pub url: String,

	/// Route the provider redirects back to.
	#[serde(rename = "callbackURL")]
	pub callback_url: String,

	/// Whether the platform should verify a `state` parameter on callback.
	pub check_state: bool,

	/// Icon to display next to the login button.
	pub icon: String,

	/// What we are asking the provider for.
	pub scope: String,
}

/// A configured Steam login strategy.
#[derive(Clone)]
#[allow(clippy::missing_docs_in_private_items)]
pub struct SteamStrategy
{
	realm: Arc<Url>,
	callback_url: Arc<Url>,
	api_key: Arc<str>,
	http_client: reqwest::Client,
}

impl fmt::Debug for SteamStrategy
{
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
	{
		f.debug_struct("SteamStrategy")
			.field("realm", &format_args!("{:?}", self.realm.as_str()))
			.field("callback_url", &format_args!("{:?}", self.callback_url.as_str()))
			.field("api_key", &"*****")
			.finish_non_exhaustive()
	}
}

impl SteamStrategy
{
	/// Creates a new [`SteamStrategy`].
	///
	/// `realm` is the base URL of the platform; the callback URL is derived
	/// from it.
	pub fn new(realm: Arc<Url>, api_key: &str, http_client: reqwest::Client) -> Result<Self>
	{
		let callback_url = realm.join_path(CALLBACK_PATH).map(Arc::new)?;

		Ok(Self { realm, callback_url, api_key: api_key.into(), http_client })
	}

	/// The realm we identify as towards Steam.
	pub fn realm(&self) -> &Url
	{
		&self.realm
	}

	/// The URL Steam redirects users back to.
	pub fn callback_url(&self) -> &Url
	{
		&self.callback_url
	}

	/// Describes this strategy to the platform.
	pub fn descriptor(&self) -> StrategyDescriptor
	{
		StrategyDescriptor {
			name: String::from(STRATEGY_NAME),
			url: String::from(LOGIN_PATH),
			callback_url: String::from(CALLBACK_PATH),
			check_state: false,
			icon: String::from(ICON),
			scope: String::from("user:username"),
		}
	}

	/// Generates the URL to redirect users to for logging in with Steam.
	#[tracing::instrument(level = "debug", skip(self), err(Debug, level = "debug"))]
	pub fn login_url(&self) -> Result<Url>
	{
		openid::LoginForm::new(&self.realm, &self.callback_url).url()
	}

	/// Verifies an OpenID payload and returns the SteamID of the user who
	/// logged in.
	#[tracing::instrument(level = "debug", skip_all, err(Debug, level = "debug"))]
	pub async fn verify(&self, payload: OpenIdPayload) -> Result<SteamId>
	{
		payload.verify(&self.http_client, &self.callback_url).await
	}

	/// Fetches profile information about a user.
	#[tracing::instrument(level = "debug", skip(self), fields(%steam_id), err(Debug, level = "debug"))]
	pub async fn fetch_profile(&self, steam_id: &SteamId) -> Result<Profile>
	{
		#[allow(clippy::missing_docs_in_private_items)]
		#[derive(Serialize)]
		struct Query<'a>
		{
			key: &'a str,

			#[serde(rename = "steamids")]
			steam_id: &'a str,
		}

		tracing::debug!(url = USER_URL, "making http request to steam");

		let response = self
			.http_client
			.get(USER_URL)
			.query(&Query { key: &self.api_key, steam_id: steam_id.as_str() })
			.send()
			.await?;

		if let Err(error) = response.error_for_status_ref() {
			let response_body = response.text().await.ok();

			tracing::error! {
				?error,
				?response_body,
				"failed to fetch profile information from steam",
			};

			return Err(Error::Http(error));
		}

		let profile::PlayerSummaries(profiles) = response.json().await?;

		profiles
			.into_iter()
			.find(|profile| profile.steam_id == *steam_id)
			.ok_or(Error::MissingProfile)
	}
}

#[cfg(test)]
mod tests
{
	use super::*;
	use crate::testing;

	fn strategy(base_url: &str) -> color_eyre::Result<SteamStrategy>
	{
		let realm = Url::parse(base_url).map(Arc::new)?;

		Ok(SteamStrategy::new(realm, "secret", reqwest::Client::new())?)
	}

	#[test]
	fn callback_url_keeps_base_path() -> color_eyre::Result<()>
	{
		let strategy = strategy("https://example.org/forum/")?;

		testing::assert_eq!(
			strategy.callback_url().as_str(),
			"https://example.org/forum/auth/steam/callback"
		);

		Ok(())
	}

	#[test]
	fn descriptor_shape() -> color_eyre::Result<()>
	{
		let descriptor = strategy("https://forum.example.org")?.descriptor();
		let json = serde_json::to_value(&descriptor)?;

		testing::assert_eq!(json, serde_json::json!({
			"name": "steam",
			"url": "/auth/steam",
			"callbackURL": "/auth/steam/callback",
			"checkState": false,
			"icon": "fa-steam",
			"scope": "user:username",
		}));

		Ok(())
	}

	#[test]
	fn debug_hides_api_key() -> color_eyre::Result<()>
	{
		let strategy = strategy("https://forum.example.org")?;

		testing::assert!(!format!("{strategy:?}").contains("secret"));

		Ok(())
	}
}
