//! The errors that can occur when interacting with Steam.

use thiserror::Error;

use crate::http::problem_details::{IntoProblemDetails, ProblemType};

/// Type alias with a default `Err` type of [`Error`].
///
/// [`Error`]: enum@Error
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// The errors that can occur when interacting with Steam.
#[derive(Debug, Error)]
pub enum Error
{
	/// We failed to build one of the URLs involved in the OpenID handshake.
	#[error("failed to build url")]
	Url(#[from] url::ParseError),

	/// We failed to encode an OpenID form.
	#[error("failed to encode openid form")]
	EncodeForm(#[from] serde_urlencoded::ser::Error),

	/// An OpenID payload we sent to Steam for verification came back as
	/// invalid.
	#[error("failed to verify openid payload with Steam")]
	VerifyOpenIdPayload,

	/// A verified OpenID payload did not contain a SteamID.
	#[error("openid payload did not contain a valid SteamID")]
	InvalidClaimedId,

	/// Steam did not return a profile for a SteamID it just authenticated.
	#[error("steam did not return a profile for this account")]
	MissingProfile,

	/// We failed to make an HTTP request to Steam.
	#[error("failed to make http request")]
	Http(#[from] reqwest::Error),
}

impl IntoProblemDetails for Error
{
	fn problem_type(&self) -> ProblemType
	{
		match self {
			Self::VerifyOpenIdPayload | Self::InvalidClaimedId => ProblemType::InvalidOpenIdPayload,
			Self::MissingProfile => ProblemType::ExternalService,
			Self::Http(source) => source.problem_type(),
			Self::Url(_) | Self::EncodeForm(_) => ProblemType::Internal,
		}
	}
}
