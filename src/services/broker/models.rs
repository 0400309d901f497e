//! Request / Response types for this service.

use crate::platform::{SessionId, UserId};

/// Who is making a request, as far as the platform's session layer knows.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RequestContext
{
	/// The logged-in user, if any.
	pub user_id: Option<UserId>,
}

impl RequestContext
{
	/// A request made by a logged-in user.
	pub const fn authenticated(user_id: UserId) -> Self
	{
		Self { user_id: Some(user_id) }
	}

	/// A request made by someone who is not logged in.
	pub const fn anonymous() -> Self
	{
		Self { user_id: None }
	}
}

/// The outcome of a successful provider callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocalUser
{
	/// The user the Steam account belongs to.
	pub user_id: UserId,

	/// Which path the callback took.
	pub flow: LoginFlow,
}

/// The two things a provider callback can mean.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginFlow
{
	/// A logged-in user linked their Steam account. Their session continues
	/// unchanged.
	Link,

	/// Someone logged in with Steam, possibly creating a new user.
	Login
	{
		/// The session that was started for them.
		session_id: SessionId,
	},
}

impl LocalUser
{
	/// The session started by this callback, if it started one.
	pub const fn session_id(&self) -> Option<SessionId>
	{
		match self.flow {
			LoginFlow::Link => None,
			LoginFlow::Login { session_id } => Some(session_id),
		}
	}
}
