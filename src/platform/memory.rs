//! An in-memory [`Platform`] implementation.
//!
//! This is used for local development and tests. Nothing is persisted.
//!
//! [`Platform`]: super::Platform

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{self, AtomicBool};

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{
	Error,
	LoginHooks,
	ObjectStore,
	Result,
	SessionId,
	SessionStore,
	Settings,
	SettingsStore,
	UserId,
	UserStore,
};

/// An in-memory platform.
#[derive(Debug, Default)]
pub struct MemoryPlatform
{
	/// Everything we store.
	state: RwLock<State>,

	/// When set, every storage operation fails with [`Error::Unavailable`].
	unavailable: AtomicBool,

	/// When set, [`LoginHooks::on_successful_login()`] fails with
	/// [`Error::LoginRejected`].
	reject_logins: AtomicBool,
}

#[derive(Debug, Default)]
#[allow(clippy::missing_docs_in_private_items)]
struct State
{
	objects: HashMap<String, HashMap<String, String>>,
	users: Vec<User>,
	usernames: HashSet<String>,
	sessions: HashMap<SessionId, Session>,
	settings: HashMap<String, Settings>,
	logins: Vec<UserId>,
	administrators: HashSet<UserId>,
}

#[derive(Debug)]
#[allow(clippy::missing_docs_in_private_items)]
struct User
{
	id: UserId,
	fields: HashMap<String, String>,
}

#[derive(Debug)]
#[allow(clippy::missing_docs_in_private_items)]
struct Session
{
	user_id: UserId,
	revoked: bool,
}

impl State
{
	/// Looks up a user by ID.
	fn user_mut(&mut self, user_id: UserId) -> Result<&mut User>
	{
		self.users
			.iter_mut()
			.find(|user| user.id == user_id)
			.ok_or(Error::UnknownUser)
	}
}

impl MemoryPlatform
{
	/// Creates a new, empty, [`MemoryPlatform`].
	pub fn new() -> Self
	{
		Self::default()
	}

	/// Simulates an outage of the backing store.
	pub fn set_unavailable(&self, unavailable: bool)
	{
		self.unavailable
			.store(unavailable, atomic::Ordering::SeqCst);
	}

	/// Makes the login hook reject every login.
	pub fn set_login_hook_failing(&self, failing: bool)
	{
		self.reject_logins.store(failing, atomic::Ordering::SeqCst);
	}

	/// Replaces a settings bundle.
	pub async fn put_settings(&self, bundle: &str, settings: Settings)
	{
		self.state
			.write()
			.await
			.settings
			.insert(bundle.to_owned(), settings);
	}

	/// Lets a user access admin pages.
	pub async fn grant_administrator(&self, user_id: UserId)
	{
		self.state.write().await.administrators.insert(user_id);
	}

	/// Returns how many users exist.
	pub async fn user_count(&self) -> usize
	{
		self.state.read().await.users.len()
	}

	/// Returns every user ID that was reported to [`LoginHooks::on_successful_login()`],
	/// in order.
	pub async fn logins(&self) -> Vec<UserId>
	{
		self.state.read().await.logins.clone()
	}

	/// Returns how many live sessions a user has.
	pub async fn live_sessions(&self, user_id: UserId) -> usize
	{
		self.state
			.read()
			.await
			.sessions
			.values()
			.filter(|session| session.user_id == user_id && !session.revoked)
			.count()
	}

	/// Fails if [`MemoryPlatform::set_unavailable()`] was turned on.
	fn ensure_available(&self) -> Result<()>
	{
		if self.unavailable.load(atomic::Ordering::SeqCst) {
			return Err(Error::Unavailable);
		}

		Ok(())
	}
}

#[async_trait]
impl ObjectStore for MemoryPlatform
{
	async fn get_object_field(&self, key: &str, field: &str) -> Result<Option<String>>
	{
		self.ensure_available()?;

		let state = self.state.read().await;
		let value = state
			.objects
			.get(key)
			.and_then(|object| object.get(field))
			.cloned();

		Ok(value)
	}

	async fn set_object_field(&self, key: &str, field: &str, value: &str) -> Result<()>
	{
		self.ensure_available()?;

		self.state
			.write()
			.await
			.objects
			.entry(key.to_owned())
			.or_default()
			.insert(field.to_owned(), value.to_owned());

		Ok(())
	}

	async fn set_object_field_if_absent(
		&self,
		key: &str,
		field: &str,
		value: &str,
	) -> Result<Option<String>>
	{
		self.ensure_available()?;

		let mut state = self.state.write().await;
		let object = state.objects.entry(key.to_owned()).or_default();

		if let Some(existing) = object.get(field) {
			return Ok(Some(existing.clone()));
		}

		object.insert(field.to_owned(), value.to_owned());

		Ok(None)
	}

	async fn delete_object_field(&self, key: &str, field: &str) -> Result<()>
	{
		self.ensure_available()?;

		if let Some(object) = self.state.write().await.objects.get_mut(key) {
			object.remove(field);
		}

		Ok(())
	}
}

#[async_trait]
impl UserStore for MemoryPlatform
{
	async fn create_user(&self, username: &str) -> Result<UserId>
	{
		self.ensure_available()?;

		let mut state = self.state.write().await;
		let next_id = u64::try_from(state.users.len())
			.ok()
			.and_then(|count| count.checked_add(1))
			.and_then(UserId::new)
			.ok_or_else(|| Error::Corrupted {
				key: String::from("users"),
				value: state.users.len().to_string(),
			})?;

		if !state.usernames.insert(username.to_lowercase()) {
			return Err(Error::UsernameTaken { username: username.to_owned() });
		}

		state.users.push(User {
			id: next_id,
			fields: HashMap::from([(String::from("username"), username.to_owned())]),
		});

		tracing::debug!(user.id = %next_id, user.name = %username, "created user");

		Ok(next_id)
	}

	async fn get_user_field(&self, user_id: UserId, field: &str) -> Result<Option<String>>
	{
		self.ensure_available()?;

		let state = self.state.read().await;
		let value = state
			.users
			.iter()
			.find(|user| user.id == user_id)
			.ok_or(Error::UnknownUser)?
			.fields
			.get(field)
			.cloned();

		Ok(value)
	}

	async fn set_user_field(&self, user_id: UserId, field: &str, value: &str) -> Result<()>
	{
		self.ensure_available()?;

		self.state
			.write()
			.await
			.user_mut(user_id)?
			.fields
			.insert(field.to_owned(), value.to_owned());

		Ok(())
	}

	async fn is_administrator(&self, user_id: UserId) -> Result<bool>
	{
		self.ensure_available()?;

		Ok(self.state.read().await.administrators.contains(&user_id))
	}
}

#[async_trait]
impl SessionStore for MemoryPlatform
{
	async fn resolve_session(&self, session_id: SessionId) -> Result<Option<UserId>>
	{
		self.ensure_available()?;

		let user_id = self
			.state
			.read()
			.await
			.sessions
			.get(&session_id)
			.filter(|session| !session.revoked)
			.map(|session| session.user_id);

		Ok(user_id)
	}

	async fn create_session(&self, user_id: UserId) -> Result<SessionId>
	{
		self.ensure_available()?;

		let session_id = SessionId::new();

		self.state
			.write()
			.await
			.sessions
			.insert(session_id, Session { user_id, revoked: false });

		Ok(session_id)
	}

	async fn revoke_all_sessions(&self, user_id: UserId) -> Result<()>
	{
		self.ensure_available()?;

		self.state
			.write()
			.await
			.sessions
			.values_mut()
			.filter(|session| session.user_id == user_id)
			.for_each(|session| session.revoked = true);

		Ok(())
	}
}

#[async_trait]
impl SettingsStore for MemoryPlatform
{
	async fn get_settings(&self, bundle: &str) -> Result<Settings>
	{
		self.ensure_available()?;

		let settings = self
			.state
			.read()
			.await
			.settings
			.get(bundle)
			.cloned()
			.unwrap_or_default();

		Ok(settings)
	}
}

#[async_trait]
impl LoginHooks for MemoryPlatform
{
	async fn on_successful_login(&self, user_id: UserId) -> Result<()>
	{
		self.ensure_available()?;

		if self.reject_logins.load(atomic::Ordering::SeqCst) {
			return Err(Error::LoginRejected);
		}

		self.state.write().await.logins.push(user_id);

		Ok(())
	}
}
