//! The errors that can occur when interacting with this service.

use thiserror::Error;

use crate::http::problem_details::{ExtensionMembers, IntoProblemDetails, ProblemType};
use crate::platform;
use crate::services::{linker, steam};

/// Type alias with a default `Err` type of [`Error`].
///
/// [`Error`]: enum@Error
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// The errors that can occur when interacting with the identity broker.
#[derive(Debug, Error)]
pub enum Error
{
	/// Steam login is not offered because no Web API key is configured.
	#[error("steam login is not configured")]
	NotConfigured,

	/// An operation using the steam strategy failed.
	#[error(transparent)]
	Steam(#[from] steam::Error),

	/// Resolving or linking the local account failed.
	#[error(transparent)]
	Linker(#[from] linker::Error),

	/// The platform failed to start a session or run its login hook.
	#[error("something went wrong")]
	Platform(#[from] platform::Error),
}

impl IntoProblemDetails for Error
{
	fn problem_type(&self) -> ProblemType
	{
		match self {
			Self::NotConfigured => ProblemType::StrategyNotConfigured,
			Self::Steam(source) => source.problem_type(),
			Self::Linker(source) => source.problem_type(),
			Self::Platform(source) => source.problem_type(),
		}
	}

	fn add_extension_members(&self, ext: &mut ExtensionMembers)
	{
		if let Self::Linker(source) = self {
			source.add_extension_members(ext);
		}
	}
}
