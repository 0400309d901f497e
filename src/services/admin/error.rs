//! The errors that can occur when interacting with this service.

use thiserror::Error;

use crate::http::problem_details::{IntoProblemDetails, ProblemType};
use crate::platform;

/// Type alias with a default `Err` type of [`Error`].
///
/// [`Error`]: enum@Error
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// The errors that can occur when accessing admin pages.
#[derive(Debug, Error)]
pub enum Error
{
	/// Nobody is logged in.
	#[error("you need to log in to access admin pages")]
	Unauthorized,

	/// The logged-in user is not an administrator.
	#[error("only administrators can access admin pages")]
	Forbidden,

	/// The platform failed to look up the user's permissions.
	#[error(transparent)]
	Platform(#[from] platform::Error),
}

impl IntoProblemDetails for Error
{
	fn problem_type(&self) -> ProblemType
	{
		match self {
			Self::Unauthorized => ProblemType::Unauthorized,
			Self::Forbidden => ProblemType::Forbidden,
			Self::Platform(source) => source.problem_type(),
		}
	}
}
