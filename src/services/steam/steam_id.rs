//! Steam account identifiers.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use url::Url;

/// Base URL of public Steam community profiles.
const PROFILE_URL: &str = "https://steamcommunity.com/profiles/";

/// The stable identifier Steam uses for an account.
///
/// In practice this is a stringified SteamID64, but we never do arithmetic on
/// it and store it exactly as the provider handed it to us.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SteamId(Arc<str>);

impl SteamId
{
	/// Creates a new [`SteamId`].
	pub fn new<S>(value: S) -> Self
	where
		S: Into<Arc<str>>,
	{
		Self(value.into())
	}

	/// Returns the raw identifier.
	pub fn as_str(&self) -> &str
	{
		&self.0
	}

	/// Returns the URL of this account's public Steam community profile.
	pub fn profile_url(&self) -> String
	{
		format!("{PROFILE_URL}{}", self.0)
	}

	/// Extracts the SteamID from the `openid.claimed_id` URL Steam sends us.
	///
	/// The claimed ID looks like `https://steamcommunity.com/openid/id/<SteamID64>`.
	pub fn from_claimed_id(claimed_id: &Url) -> Option<Self>
	{
		claimed_id
			.path_segments()
			.and_then(|segments| segments.last())
			.filter(|segment| !segment.is_empty() && segment.bytes().all(|b| b.is_ascii_digit()))
			.map(Self::new)
	}
}

impl fmt::Display for SteamId
{
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
	{
		f.write_str(&self.0)
	}
}

#[cfg(test)]
mod tests
{
	use super::*;
	use crate::testing;

	#[test]
	fn profile_url() -> color_eyre::Result<()>
	{
		let steam_id = SteamId::new("76561198000000001");

		testing::assert_eq!(
			steam_id.profile_url(),
			"https://steamcommunity.com/profiles/76561198000000001"
		);

		Ok(())
	}

	#[test]
	fn parse_claimed_id() -> color_eyre::Result<()>
	{
		let claimed_id = Url::parse("https://steamcommunity.com/openid/id/76561198282622073")?;

		testing::assert_eq!(
			SteamId::from_claimed_id(&claimed_id),
			Some(SteamId::new("76561198282622073"))
		);

		let bogus = Url::parse("https://steamcommunity.com/openid/id/alice")?;

		testing::assert_eq!(SteamId::from_claimed_id(&bogus), None);

		Ok(())
	}
}
