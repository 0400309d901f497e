//! This module contains the [`ProblemType`] enum.
//!
//! It represents an exhaustive list of all the possible error conditions the
//! service might return.

use std::sync::OnceLock;

use axum::http::StatusCode;
use serde::{Serialize, Serializer};
use url::Url;

/// The base URL for the problem type documentation.
static BASE_URL: OnceLock<Url> = OnceLock::new();

/// Sets the base URL problem types are resolved against.
///
/// Only the first call has any effect.
pub(crate) fn set_base_url(url: Url)
{
	if BASE_URL.set(url).is_err() {
		tracing::debug!("problem type base url already set");
	}
}

/// A problem type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProblemType
{
	/// The username derived from an external profile cannot be used for a new
	/// account.
	InvalidUsername,

	/// During the OpenID authentication flow, our callback route was hit with a
	/// payload that could not be verified by Steam.
	InvalidOpenIdPayload,

	/// The request requires a logged-in user, but nobody is logged in.
	Unauthorized,

	/// The logged-in user is not allowed to access this resource.
	Forbidden,

	/// The platform refused to let the user log in.
	LoginRejected,

	/// Steam login is not offered because no Web API key is configured.
	StrategyNotConfigured,

	/// A requested resource could not be found.
	ResourceNotFound,

	/// A request for creating a resource was made, but rejected because the
	/// resource already exists.
	ResourceAlreadyExists,

	/// The Steam account or the local account is already linked to a different
	/// account.
	AccountAlreadyLinked,

	/// You provided a query string which could not be deserialized.
	InvalidQueryString,

	/// We made a request to an external service and failed to decode the
	/// response.
	DecodeExternal,

	/// An internal failure occurred.
	///
	/// Any occurrence of this problem type is considered a bug!
	Internal,

	/// We failed to communicate with an external service, such as Steam.
	ExternalService,

	/// The platform's storage is currently unavailable.
	StorageUnavailable,
}

impl ProblemType
{
	/// Every problem type.
	pub const fn all() -> &'static [Self]
	{
		&[
			Self::InvalidUsername,
			Self::InvalidOpenIdPayload,
			Self::Unauthorized,
			Self::Forbidden,
			Self::LoginRejected,
			Self::StrategyNotConfigured,
			Self::ResourceNotFound,
			Self::ResourceAlreadyExists,
			Self::AccountAlreadyLinked,
			Self::InvalidQueryString,
			Self::DecodeExternal,
			Self::Internal,
			Self::ExternalService,
			Self::StorageUnavailable,
		]
	}

	/// The HTTP status code responses of this type have.
	pub const fn status(self) -> StatusCode
	{
		match self {
			Self::InvalidUsername => StatusCode::BAD_REQUEST,
			Self::InvalidOpenIdPayload | Self::Unauthorized => StatusCode::UNAUTHORIZED,
			Self::Forbidden | Self::LoginRejected => StatusCode::FORBIDDEN,
			Self::StrategyNotConfigured | Self::ResourceNotFound => StatusCode::NOT_FOUND,
			Self::ResourceAlreadyExists | Self::AccountAlreadyLinked => StatusCode::CONFLICT,
			Self::InvalidQueryString => StatusCode::UNPROCESSABLE_ENTITY,
			Self::DecodeExternal | Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
			Self::ExternalService => StatusCode::BAD_GATEWAY,
			Self::StorageUnavailable => StatusCode::SERVICE_UNAVAILABLE,
		}
	}

	/// A short, human-readable, description of this problem type.
	pub const fn title(self) -> &'static str
	{
		match self {
			Self::InvalidUsername => "invalid username",
			Self::InvalidOpenIdPayload => "authentication failed",
			Self::Unauthorized => "you are not logged in",
			Self::Forbidden => "you are not allowed to access this resource",
			Self::LoginRejected => "login rejected",
			Self::StrategyNotConfigured => "steam login is not configured",
			Self::ResourceNotFound => "resource not found",
			Self::ResourceAlreadyExists => "resource already exists",
			Self::AccountAlreadyLinked => "account already linked",
			Self::InvalidQueryString => "invalid query string",
			Self::DecodeExternal => "failed to decode response from external service",
			Self::Internal => "internal server error",
			Self::ExternalService => "external service failure",
			Self::StorageUnavailable => "storage unavailable",
		}
	}

	/// The URL fragment identifying this problem type.
	pub const fn slug(self) -> &'static str
	{
		match self {
			Self::InvalidUsername => "invalid-username",
			Self::InvalidOpenIdPayload => "invalid-openid-payload",
			Self::Unauthorized => "unauthorized",
			Self::Forbidden => "forbidden",
			Self::LoginRejected => "login-rejected",
			Self::StrategyNotConfigured => "strategy-not-configured",
			Self::ResourceNotFound => "resource-not-found",
			Self::ResourceAlreadyExists => "resource-already-exists",
			Self::AccountAlreadyLinked => "account-already-linked",
			Self::InvalidQueryString => "invalid-query-string",
			Self::DecodeExternal => "decode-external",
			Self::Internal => "internal",
			Self::ExternalService => "external-service",
			Self::StorageUnavailable => "storage-unavailable",
		}
	}
}

impl Serialize for ProblemType
{
	// Serialize as a URI as specified by the RFC.
	fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		let base = BASE_URL
			.get()
			.map(|url| crate::url::join(url, "/problem-types"))
			.unwrap_or_else(|| String::from("/problem-types"));

		serializer.collect_str(&format_args!("{base}#{}", self.slug()))
	}
}
