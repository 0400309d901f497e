//! The host platform this plugin is integrated into.
//!
//! The platform owns users, sessions, settings, and a generic key-value
//! store. We only ever talk to it through the narrow traits in this module, so
//! the same services can run on top of the [in-memory backend] (used for
//! development and tests) or the [MySQL backend].
//!
//! [in-memory backend]: MemoryPlatform
//! [MySQL backend]: MySqlPlatform

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

mod error;
pub use error::{Error, Result};

mod ids;
pub use ids::{ParseUserIdError, SessionId, UserId};

pub mod username;

mod memory;
pub use memory::MemoryPlatform;

mod mysql;
pub use mysql::MySqlPlatform;

/// A hash-like key-value store.
///
/// Every `key` holds an object, which is a flat map of `field -> value`.
#[async_trait]
pub trait ObjectStore: Send + Sync + 'static
{
	/// Reads a single field of an object.
	async fn get_object_field(&self, key: &str, field: &str) -> Result<Option<String>>;

	/// Writes a single field of an object, overwriting any previous value.
	async fn set_object_field(&self, key: &str, field: &str, value: &str) -> Result<()>;

	/// Writes a single field of an object, but only if it is not set yet.
	///
	/// Returns the value that is already stored if the field was taken, in
	/// which case nothing was written.
	async fn set_object_field_if_absent(
		&self,
		key: &str,
		field: &str,
		value: &str,
	) -> Result<Option<String>>;

	/// Deletes a single field of an object.
	///
	/// Deleting a field that does not exist is not an error.
	async fn delete_object_field(&self, key: &str, field: &str) -> Result<()>;
}

/// The platform's user records.
#[async_trait]
pub trait UserStore: Send + Sync + 'static
{
	/// Checks whether `username` may be used for a new account.
	fn is_username_valid(&self, username: &str) -> bool
	{
		username::is_valid(username)
	}

	/// Creates a new user with the given name.
	async fn create_user(&self, username: &str) -> Result<UserId>;

	/// Reads a field on a user record.
	async fn get_user_field(&self, user_id: UserId, field: &str) -> Result<Option<String>>;

	/// Writes a field on a user record.
	async fn set_user_field(&self, user_id: UserId, field: &str, value: &str) -> Result<()>;

	/// Checks whether a user may access admin pages.
	async fn is_administrator(&self, user_id: UserId) -> Result<bool>;
}

/// The platform's login sessions.
#[async_trait]
pub trait SessionStore: Send + Sync + 'static
{
	/// Returns the user a live session belongs to.
	async fn resolve_session(&self, session_id: SessionId) -> Result<Option<UserId>>;

	/// Starts a new session for a user.
	async fn create_session(&self, user_id: UserId) -> Result<SessionId>;

	/// Invalidates every live session of a user.
	async fn revoke_all_sessions(&self, user_id: UserId) -> Result<()>;
}

/// Plugin settings, grouped into named bundles.
#[async_trait]
pub trait SettingsStore: Send + Sync + 'static
{
	/// Reads a settings bundle.
	///
	/// A bundle that was never written is returned as empty.
	async fn get_settings(&self, bundle: &str) -> Result<Settings>;
}

/// Notifications the platform wants to receive about authentication events.
#[async_trait]
pub trait LoginHooks: Send + Sync + 'static
{
	/// Called after a user successfully logged in.
	async fn on_successful_login(&self, user_id: UserId) -> Result<()>;
}

/// Everything we need from the host platform.
pub trait Platform: ObjectStore + UserStore + SessionStore + SettingsStore + LoginHooks {}

impl<T> Platform for T where T: ObjectStore + UserStore + SessionStore + SettingsStore + LoginHooks {}

/// A bundle of plugin settings.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Settings(HashMap<String, String>);

impl Settings
{
	/// Returns the value of an option.
	///
	/// Options that are set to an empty string are treated as absent.
	pub fn get(&self, name: &str) -> Option<&str>
	{
		self.0
			.get(name)
			.map(String::as_str)
			.filter(|value| !value.is_empty())
	}

	/// Sets an option.
	pub fn insert<K, V>(&mut self, name: K, value: V)
	where
		K: Into<String>,
		V: Into<String>,
	{
		self.0.insert(name.into(), value.into());
	}
}

impl<K, V> FromIterator<(K, V)> for Settings
where
	K: Into<String>,
	V: Into<String>,
{
	fn from_iter<I>(iter: I) -> Self
	where
		I: IntoIterator<Item = (K, V)>,
	{
		Self(
			iter.into_iter()
				.map(|(name, value)| (name.into(), value.into()))
				.collect(),
		)
	}
}
