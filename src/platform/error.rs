//! The errors that can occur when talking to the platform.

use thiserror::Error;

/// Type alias with a default `Err` type of [`Error`].
///
/// [`Error`]: enum@Error
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// The errors that can occur when talking to the platform.
#[derive(Debug, Error)]
pub enum Error
{
	/// The backing store could not be reached.
	#[error("storage backend is unavailable")]
	Unavailable,

	/// A value read from storage does not have the expected shape.
	#[error("invalid value stored at `{key}`: {value:?}")]
	Corrupted
	{
		/// Where the value was found.
		key: String,

		/// The raw value.
		value: String,
	},

	/// A new user could not be created because the name is taken.
	#[error("username `{username}` is already taken")]
	UsernameTaken
	{
		/// The requested username.
		username: String,
	},

	/// The platform refused to let a user log in.
	#[error("login was rejected by the platform")]
	LoginRejected,

	/// A field was written for a user that does not exist.
	#[error("user does not exist")]
	UnknownUser,

	/// Something went wrong communicating with the database.
	#[error("something went wrong")]
	Database(#[from] sqlx::Error),

	/// We failed to run database migrations.
	#[error("failed to run migrations")]
	Migrate(#[from] sqlx::migrate::MigrateError),
}
