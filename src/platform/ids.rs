//! Identifiers handed out by the platform.

use std::num::{NonZeroU64, ParseIntError};
use std::str::FromStr;

use derive_more::Display;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// A local user's ID.
///
/// User IDs are always positive; `0` is reserved by the platform for guests.
#[derive(
	Debug, Display, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct UserId(NonZeroU64);

impl UserId
{
	/// Creates a new [`UserId`].
	///
	/// Returns [`None`] for `0`.
	pub const fn new(value: u64) -> Option<Self>
	{
		match NonZeroU64::new(value) {
			Some(value) => Some(Self(value)),
			None => None,
		}
	}

	/// Returns the raw integer value.
	pub const fn get(self) -> u64
	{
		self.0.get()
	}
}

/// Error returned when parsing a [`UserId`] fails.
#[derive(Debug, Error)]
pub enum ParseUserIdError
{
	/// The input was not an integer.
	#[error(transparent)]
	NotAnInteger(#[from] ParseIntError),

	/// The input was `0`.
	#[error("user IDs cannot be 0")]
	Zero,
}

impl FromStr for UserId
{
	type Err = ParseUserIdError;

	fn from_str(value: &str) -> Result<Self, Self::Err>
	{
		value
			.trim()
			.parse::<u64>()
			.map_err(ParseUserIdError::from)
			.and_then(|value| Self::new(value).ok_or(ParseUserIdError::Zero))
	}
}

/// A login session's ID.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(Uuid);

impl SessionId
{
	/// Generates a new random [`SessionId`].
	#[allow(clippy::new_without_default)]
	pub fn new() -> Self
	{
		Self(Uuid::new_v4())
	}

	/// Returns the underlying UUID.
	pub const fn as_uuid(&self) -> &Uuid
	{
		&self.0
	}
}

impl From<Uuid> for SessionId
{
	fn from(uuid: Uuid) -> Self
	{
		Self(uuid)
	}
}

impl FromStr for SessionId
{
	type Err = uuid::Error;

	fn from_str(value: &str) -> Result<Self, Self::Err>
	{
		value.parse::<Uuid>().map(Self)
	}
}

#[cfg(test)]
mod tests
{
	use super::*;
	use crate::testing;

	#[test]
	fn parse_user_id() -> color_eyre::Result<()>
	{
		testing::assert_eq!("42".parse::<UserId>()?.get(), 42);
		testing::assert_matches!("0".parse::<UserId>(), Err(ParseUserIdError::Zero));
		testing::assert_matches!("-1".parse::<UserId>(), Err(ParseUserIdError::NotAnInteger(_)));

		Ok(())
	}

	#[test]
	fn reject_zero_when_deserializing() -> color_eyre::Result<()>
	{
		testing::assert!(serde_json::from_str::<UserId>("0").is_err());
		testing::assert_eq!(serde_json::from_str::<UserId>("7")?, UserId::new(7).unwrap());

		Ok(())
	}
}
