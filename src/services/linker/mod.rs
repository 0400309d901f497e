//! A service for linking Steam accounts to local users.
//!
//! The link is stored twice, once in each direction:
//!
//! - `steam-sso:uid-link` maps a SteamID to a local user ID
//! - `steam-sso:steamid-link` maps a local user ID to a SteamID
//!
//! Both halves are always written and deleted together. A Steam account can be
//! linked to at most one user, and a user can be linked to at most one Steam
//! account.

use std::fmt;
use std::sync::Arc;

use url::Url;

use crate::platform::{self, ObjectStore, Platform, SessionStore, UserId, UserStore};
use crate::services::steam::{self, SteamId};

mod error;
pub use error::{Error, Result};

pub(crate) mod models;
pub use models::{Association, UserRecord};

mod locks;
use locks::ProvisioningLocks;

/// Object key mapping SteamIDs to user IDs.
pub const UID_LINK: &str = "steam-sso:uid-link";

/// Object key mapping user IDs to SteamIDs.
pub const STEAMID_LINK: &str = "steam-sso:steamid-link";

/// User field holding the raw SteamID.
pub const STEAMID_FIELD: &str = "steam-sso:steamid";

/// User field holding the Steam profile URL.
pub const PROFILE_FIELD: &str = "steam-sso:profile";

/// User field holding the user's avatar.
pub const PICTURE_FIELD: &str = "picture";

/// Display name of the provider.
pub const PROVIDER_NAME: &str = "Steam";

/// A service for linking Steam accounts to local users.
#[derive(Clone)]
#[allow(clippy::missing_docs_in_private_items)]
pub struct AccountLinker
{
	platform: Arc<dyn Platform>,
	base_url: Arc<Url>,
	provisioning: Arc<ProvisioningLocks>,
}

impl fmt::Debug for AccountLinker
{
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
	{
		f.debug_struct("AccountLinker")
			.field("base_url", &format_args!("{:?}", self.base_url.as_str()))
			.finish_non_exhaustive()
	}
}

/// The mapping halves a single [`AccountLinker::link_account()`] call wrote.
///
/// Only these are rolled back if linking fails halfway.
#[derive(Debug, Default, Clone, Copy)]
#[allow(clippy::missing_docs_in_private_items)]
struct Claims
{
	uid_link: bool,
	steamid_link: bool,
}

impl AccountLinker
{
	/// Creates a new [`AccountLinker`].
	#[tracing::instrument(skip(platform))]
	pub fn new(platform: Arc<dyn Platform>, base_url: Arc<Url>) -> Self
	{
		Self { platform, base_url, provisioning: Arc::default() }
	}

	/// Links a Steam account to an existing user.
	///
	/// Linking the same pair twice is a no-op. Linking a Steam account that is
	/// already linked to someone else, or a user that is already linked to a
	/// different Steam account, is rejected and leaves the existing link
	/// untouched.
	#[tracing::instrument(level = "debug", skip(self), fields(%user_id, %steam_id), err(Debug, level = "debug"))]
	pub async fn link_account(&self, user_id: UserId, steam_id: &SteamId) -> Result<()>
	{
		let mut claims = Claims::default();
		let result = self.claim_links(user_id, steam_id, &mut claims).await;

		if result.is_err() {
			self.release_claims(user_id, steam_id, claims).await;
		} else {
			tracing::info!(target: "steam_sso::audit_log", %user_id, %steam_id, "linked steam account");
		}

		result
	}

	/// Writes both halves of the mapping plus the profile fields, recording
	/// which halves were newly written in `claims`.
	async fn claim_links(&self, user_id: UserId, steam_id: &SteamId, claims: &mut Claims)
	-> Result<()>
	{
		let uid = user_id.to_string();

		match self
			.platform
			.set_object_field_if_absent(UID_LINK, steam_id.as_str(), &uid)
			.await?
		{
			None => claims.uid_link = true,
			Some(existing) if existing == uid => {}
			Some(existing) => {
				tracing::debug!(%existing, "steam account is linked to another user");
				return Err(Error::AlreadyLinked { steam_id: steam_id.clone() });
			}
		}

		match self
			.platform
			.set_object_field_if_absent(STEAMID_LINK, &uid, steam_id.as_str())
			.await?
		{
			None => claims.steamid_link = true,
			Some(existing) if existing == steam_id.as_str() => {}
			Some(existing) => {
				return Err(Error::UserAlreadyLinked { linked_to: SteamId::new(existing) });
			}
		}

		self.platform
			.set_user_field(user_id, STEAMID_FIELD, steam_id.as_str())
			.await?;

		self.platform
			.set_user_field(user_id, PROFILE_FIELD, &steam_id.profile_url())
			.await?;

		Ok(())
	}

	/// Deletes the mapping halves a failed [`AccountLinker::link_account()`]
	/// call wrote.
	async fn release_claims(&self, user_id: UserId, steam_id: &SteamId, claims: Claims)
	{
		if claims.uid_link {
			if let Err(error) = self
				.platform
				.delete_object_field(UID_LINK, steam_id.as_str())
				.await
			{
				tracing::error!(?error, %steam_id, "failed to roll back uid link");
			}
		}

		if claims.steamid_link {
			if let Err(error) = self
				.platform
				.delete_object_field(STEAMID_LINK, &user_id.to_string())
				.await
			{
				tracing::error!(?error, %user_id, "failed to roll back steamid link");
			}
		}
	}

	/// Returns the user linked to a Steam account, creating a new one if there
	/// is none yet.
	///
	/// Existing users are returned as-is; their name and avatar are not
	/// updated.
	#[tracing::instrument(level = "debug", skip(self, avatar_url), fields(%steam_id), err(Debug, level = "debug"))]
	pub async fn resolve_or_create(
		&self,
		steam_id: &SteamId,
		display_name: &str,
		avatar_url: &str,
	) -> Result<UserId>
	{
		if let Some(user_id) = self.get_local_user_id(steam_id).await? {
			return Ok(user_id);
		}

		let _guard = self.provisioning.lock(steam_id).await;

		// someone else might have finished provisioning while we waited
		if let Some(user_id) = self.get_local_user_id(steam_id).await? {
			return Ok(user_id);
		}

		if !self.platform.is_username_valid(display_name) {
			return Err(Error::InvalidUsername { username: display_name.to_owned() });
		}

		let user_id = self
			.platform
			.create_user(display_name)
			.await
			.map_err(Error::CreateUser)?;

		tracing::info!(target: "steam_sso::audit_log", %user_id, %steam_id, "provisioned new user");

		self.link_account(user_id, steam_id).await?;
		self.platform
			.set_user_field(user_id, PICTURE_FIELD, avatar_url)
			.await?;

		Ok(user_id)
	}

	/// Returns the user linked to a Steam account.
	#[tracing::instrument(level = "debug", skip(self), fields(%steam_id), err(Debug, level = "debug"))]
	pub async fn get_local_user_id(&self, steam_id: &SteamId) -> Result<Option<UserId>>
	{
		let Some(raw) = self
			.platform
			.get_object_field(UID_LINK, steam_id.as_str())
			.await?
		else {
			return Ok(None);
		};

		let user_id = raw.parse::<UserId>().map_err(|error| {
			tracing::warn!(%error, %raw, "corrupted uid link");
			platform::Error::Corrupted { key: format!("{UID_LINK}/{steam_id}"), value: raw.clone() }
		})?;

		Ok(Some(user_id))
	}

	/// Returns the Steam account linked to a user.
	#[tracing::instrument(level = "debug", skip(self), fields(%user_id), err(Debug, level = "debug"))]
	pub async fn get_external_id(&self, user_id: UserId) -> Result<Option<SteamId>>
	{
		let steam_id = self
			.platform
			.get_object_field(STEAMID_LINK, &user_id.to_string())
			.await?
			.map(SteamId::new);

		Ok(steam_id)
	}

	/// Describes a user's Steam link for account-settings pages.
	#[tracing::instrument(level = "debug", skip(self), fields(%user_id), err(Debug, level = "debug"))]
	pub async fn association_view(&self, user_id: UserId) -> Result<Association>
	{
		let association = match self.get_external_id(user_id).await? {
			Some(steam_id) => Association {
				associated: true,
				url: steam_id.profile_url(),
				steam_id: Some(steam_id),
				name: String::from(PROVIDER_NAME),
				icon: String::from(steam::ICON),
			},
			None => Association {
				associated: false,
				url: crate::url::join(&self.base_url, steam::LOGIN_PATH),
				steam_id: None,
				name: String::from(PROVIDER_NAME),
				icon: String::from(steam::ICON),
			},
		};

		Ok(association)
	}

	/// Appends a user's Steam [`Association`] to the list the platform is
	/// collecting.
	pub async fn collect_associations(
		&self,
		user_id: UserId,
		associations: &mut Vec<Association>,
	) -> Result<()>
	{
		associations.push(self.association_view(user_id).await?);

		Ok(())
	}

	/// Adds the Steam fields to a user record, if the user is linked.
	///
	/// Lookup failures leave the record as it was.
	#[tracing::instrument(level = "debug", skip(self, record), fields(%user_id))]
	pub async fn attach_profile_fields(&self, user_id: UserId, mut record: UserRecord)
	-> UserRecord
	{
		match self.get_external_id(user_id).await {
			Ok(Some(steam_id)) => {
				record.insert(String::from(PROFILE_FIELD), steam_id.profile_url().into());
				record.insert(String::from(STEAMID_FIELD), steam_id.as_str().into());
			}
			Ok(None) => {}
			Err(error) => {
				tracing::warn!(?error, "failed to look up steam account for user record");
			}
		}

		record
	}

	/// Deletes everything we know about a user.
	///
	/// All of the user's sessions are revoked before the link is removed. If
	/// the user is not linked, the sessions are still revoked.
	#[tracing::instrument(level = "debug", skip(self), fields(%user_id), err(Debug, level = "debug"))]
	pub async fn delete_user_data(&self, user_id: UserId) -> Result<UserId>
	{
		let steam_id = self.get_external_id(user_id).await?;

		self.platform.revoke_all_sessions(user_id).await?;

		if let Some(steam_id) = &steam_id {
			self.platform
				.delete_object_field(UID_LINK, steam_id.as_str())
				.await?;
		}

		self.platform
			.delete_object_field(STEAMID_LINK, &user_id.to_string())
			.await?;

		tracing::info!(target: "steam_sso::audit_log", %user_id, ?steam_id, "deleted user data");

		Ok(user_id)
	}
}
