//! The errors that can occur when interacting with this service.

use thiserror::Error;

use crate::http::problem_details::{ExtensionMembers, IntoProblemDetails, ProblemType};
use crate::platform;
use crate::services::steam::SteamId;

/// Type alias with a default `Err` type of [`Error`].
///
/// [`Error`]: enum@Error
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// The errors that can occur when interacting with the account linker.
#[derive(Debug, Error)]
pub enum Error
{
	/// A Steam account tried to sign up with a display name the platform does
	/// not accept as a username.
	#[error(
		"Invalid username! Your username can only contain alphanumeric letters (a-z, numbers, \
		 spaces)."
	)]
	InvalidUsername
	{
		/// The rejected display name.
		username: String,
	},

	/// The Steam account is already linked to a different local user.
	#[error("this Steam account is already linked to another user")]
	AlreadyLinked
	{
		/// The Steam account.
		steam_id: SteamId,
	},

	/// The local user is already linked to a different Steam account.
	#[error("this user is already linked to another Steam account")]
	UserAlreadyLinked
	{
		/// The Steam account the user is linked to.
		linked_to: SteamId,
	},

	/// The platform refused to create a new user.
	#[error("failed to create user: {0}")]
	CreateUser(#[source] platform::Error),

	/// Any other failure reported by the platform's storage.
	#[error(transparent)]
	Storage(#[from] platform::Error),
}

impl IntoProblemDetails for Error
{
	fn problem_type(&self) -> ProblemType
	{
		match self {
			Self::InvalidUsername { .. } => ProblemType::InvalidUsername,
			Self::AlreadyLinked { .. } | Self::UserAlreadyLinked { .. } => {
				ProblemType::AccountAlreadyLinked
			}
			Self::CreateUser(source) | Self::Storage(source) => source.problem_type(),
		}
	}

	fn add_extension_members(&self, ext: &mut ExtensionMembers)
	{
		match self {
			Self::InvalidUsername { username } => ext.add("username", username),
			Self::AlreadyLinked { steam_id } => ext.add("steam_id", steam_id),
			Self::UserAlreadyLinked { .. }
			| Self::CreateUser(_)
			| Self::Storage(_) => {}
		}
	}
}
