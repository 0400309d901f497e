//! A [`Platform`] implementation backed by MySQL.
//!
//! The schema lives in `database/migrations`.
//!
//! [`Platform`]: super::Platform

use async_trait::async_trait;
use sqlx::{MySql, Pool};
use time::OffsetDateTime;
use uuid::Uuid;

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

/// How often [`MySqlPlatform::set_object_field_if_absent()`] tries to claim a
/// field before giving up.
const CLAIM_ATTEMPTS: usize = 3;

/// A platform backed by a MySQL database.
#[derive(Debug, Clone)]
pub struct MySqlPlatform
{
	/// Connection pool to the backing database.
	database: Pool<MySql>,
}

impl MySqlPlatform
{
	/// Creates a new [`MySqlPlatform`] and runs pending migrations.
	#[tracing::instrument(skip(database), err(Debug))]
	pub async fn new(database: Pool<MySql>) -> Result<Self>
	{
		sqlx::migrate!("./database/migrations")
			.run(&database)
			.await?;

		tracing::debug!("ran database migrations");

		Ok(Self { database })
	}

	/// Writes a single settings option.
	#[tracing::instrument(level = "debug", skip(self, value), err(Debug, level = "debug"))]
	pub async fn put_setting(&self, bundle: &str, name: &str, value: &str) -> Result<()>
	{
		sqlx::query(
			r"
			INSERT INTO
			  Settings (bundle, name, value)
			VALUES
			  (?, ?, ?)
			ON DUPLICATE KEY UPDATE
			  value = VALUES(value)
			",
		)
		.bind(bundle)
		.bind(name)
		.bind(value)
		.execute(&self.database)
		.await?;

		Ok(())
	}
}

/// Extension trait for dealing with SQL errors.
trait SqlErrorExt
{
	/// Checks if this is a "duplicate entry" error.
	fn is_duplicate_entry(&self) -> bool;

	/// Checks if this is a foreign key violation.
	fn is_fk_violation(&self) -> bool;
}

impl SqlErrorExt for sqlx::Error
{
	fn is_duplicate_entry(&self) -> bool
	{
		self.as_database_error()
			.is_some_and(|err| err.is_unique_violation())
	}

	fn is_fk_violation(&self) -> bool
	{
		self.as_database_error()
			.is_some_and(|err| err.is_foreign_key_violation())
	}
}

/// Turns a raw database ID into a [`UserId`].
fn user_id_from_row(key: &str, raw: u64) -> Result<UserId>
{
	UserId::new(raw).ok_or_else(|| Error::Corrupted {
		key: key.to_owned(),
		value: raw.to_string(),
	})
}

#[async_trait]
impl ObjectStore for MySqlPlatform
{
	async fn get_object_field(&self, key: &str, field: &str) -> Result<Option<String>>
	{
		let value = sqlx::query_scalar::<_, String>(
			r"
			SELECT
			  value
			FROM
			  Objects
			WHERE
			  object_key = ?
			  AND field = ?
			",
		)
		.bind(key)
		.bind(field)
		.fetch_optional(&self.database)
		.await?;

		Ok(value)
	}

	async fn set_object_field(&self, key: &str, field: &str, value: &str) -> Result<()>
	{
		sqlx::query(
			r"
			INSERT INTO
			  Objects (object_key, field, value)
			VALUES
			  (?, ?, ?)
			ON DUPLICATE KEY UPDATE
			  value = VALUES(value)
			",
		)
		.bind(key)
		.bind(field)
		.bind(value)
		.execute(&self.database)
		.await?;

		Ok(())
	}

	async fn set_object_field_if_absent(
		&self,
		key: &str,
		field: &str,
		value: &str,
	) -> Result<Option<String>>
	{
		let mut txn = self.database.begin().await?;

		// A concurrent delete can remove the conflicting row between the insert
		// and the select, in which case the insert is tried again.
		for _ in 0..CLAIM_ATTEMPTS {
			let inserted = sqlx::query(
				r"
				INSERT IGNORE INTO
				  Objects (object_key, field, value)
				VALUES
				  (?, ?, ?)
				",
			)
			.bind(key)
			.bind(field)
			.bind(value)
			.execute(txn.as_mut())
			.await?
			.rows_affected()
				> 0;

			if inserted {
				txn.commit().await?;
				return Ok(None);
			}

			let existing = sqlx::query_scalar::<_, String>(
				r"
				SELECT
				  value
				FROM
				  Objects
				WHERE
				  object_key = ?
				  AND field = ?
				FOR UPDATE
				",
			)
			.bind(key)
			.bind(field)
			.fetch_optional(txn.as_mut())
			.await?;

			if let Some(existing) = existing {
				txn.commit().await?;
				return Ok(Some(existing));
			}

			tracing::debug!(key, field, "claimed field vanished; retrying");
		}

		tracing::warn!(key, field, "gave up claiming contended field");

		Err(Error::Unavailable)
	}

	async fn delete_object_field(&self, key: &str, field: &str) -> Result<()>
	{
		sqlx::query(
			r"
			DELETE FROM
			  Objects
			WHERE
			  object_key = ?
			  AND field = ?
			",
		)
		.bind(key)
		.bind(field)
		.execute(&self.database)
		.await?;

		Ok(())
	}
}

#[async_trait]
impl UserStore for MySqlPlatform
{
	async fn create_user(&self, username: &str) -> Result<UserId>
	{
		let raw_id = sqlx::query(
			r"
			INSERT INTO
			  Users (name)
			VALUES
			  (?)
			",
		)
		.bind(username)
		.execute(&self.database)
		.await
		.map_err(|err| {
			if err.is_duplicate_entry() {
				Error::UsernameTaken { username: username.to_owned() }
			} else {
				Error::Database(err)
			}
		})?
		.last_insert_id();

		let user_id = user_id_from_row("Users.id", raw_id)?;

		tracing::debug!(user.id = %user_id, user.name = %username, "created user");

		Ok(user_id)
	}

	async fn get_user_field(&self, user_id: UserId, field: &str) -> Result<Option<String>>
	{
		let value = sqlx::query_scalar::<_, String>(
			r"
			SELECT
			  value
			FROM
			  UserFields
			WHERE
			  user_id = ?
			  AND field = ?
			",
		)
		.bind(user_id.get())
		.bind(field)
		.fetch_optional(&self.database)
		.await?;

		Ok(value)
	}

	async fn set_user_field(&self, user_id: UserId, field: &str, value: &str) -> Result<()>
	{
		sqlx::query(
			r"
			INSERT INTO
			  UserFields (user_id, field, value)
			VALUES
			  (?, ?, ?)
			ON DUPLICATE KEY UPDATE
			  value = VALUES(value)
			",
		)
		.bind(user_id.get())
		.bind(field)
		.bind(value)
		.execute(&self.database)
		.await
		.map_err(|err| {
			if err.is_fk_violation() {
				Error::UnknownUser
			} else {
				Error::Database(err)
			}
		})?;

		Ok(())
	}

	async fn is_administrator(&self, user_id: UserId) -> Result<bool>
	{
		let is_admin = sqlx::query_scalar::<_, u64>(
			r"
			SELECT
			  user_id
			FROM
			  Administrators
			WHERE
			  user_id = ?
			",
		)
		.bind(user_id.get())
		.fetch_optional(&self.database)
		.await?
		.is_some();

		Ok(is_admin)
	}
}

#[async_trait]
impl SessionStore for MySqlPlatform
{
	async fn resolve_session(&self, session_id: SessionId) -> Result<Option<UserId>>
	{
		let Some(raw_id) = sqlx::query_scalar::<_, u64>(
			r"
			SELECT
			  user_id
			FROM
			  Sessions
			WHERE
			  id = ?
			  AND expires_at > NOW()
			",
		)
		.bind(session_id.as_uuid())
		.fetch_optional(&self.database)
		.await?
		else {
			return Ok(None);
		};

		user_id_from_row("Sessions.user_id", raw_id).map(Some)
	}

	async fn create_session(&self, user_id: UserId) -> Result<SessionId>
	{
		let session_id = SessionId::from(Uuid::new_v4());
		let expires_at = OffsetDateTime::now_utc() + (time::Duration::WEEK * 2);

		sqlx::query(
			r"
			INSERT INTO
			  Sessions (id, user_id, expires_at)
			VALUES
			  (?, ?, ?)
			",
		)
		.bind(session_id.as_uuid())
		.bind(user_id.get())
		.bind(expires_at)
		.execute(&self.database)
		.await?;

		tracing::debug!(session.id = %session_id, session.expires_at = %expires_at, "created session");

		Ok(session_id)
	}

	async fn revoke_all_sessions(&self, user_id: UserId) -> Result<()>
	{
		let revoked = sqlx::query(
			r"
			UPDATE
			  Sessions
			SET
			  expires_at = NOW()
			WHERE
			  user_id = ?
			  AND expires_at > NOW()
			",
		)
		.bind(user_id.get())
		.execute(&self.database)
		.await?
		.rows_affected();

		tracing::debug!(user.id = %user_id, revoked, "revoked sessions");

		Ok(())
	}
}

#[async_trait]
impl SettingsStore for MySqlPlatform
{
	async fn get_settings(&self, bundle: &str) -> Result<Settings>
	{
		let settings = sqlx::query_as::<_, (String, String)>(
			r"
			SELECT
			  name,
			  value
			FROM
			  Settings
			WHERE
			  bundle = ?
			",
		)
		.bind(bundle)
		.fetch_all(&self.database)
		.await?
		.into_iter()
		.collect();

		Ok(settings)
	}
}

#[async_trait]
impl LoginHooks for MySqlPlatform
{
	async fn on_successful_login(&self, user_id: UserId) -> Result<()>
	{
		sqlx::query(
			r"
			UPDATE
			  Users
			SET
			  last_login_at = NOW()
			WHERE
			  id = ?
			",
		)
		.bind(user_id.get())
		.execute(&self.database)
		.await?;

		Ok(())
	}
}
