//! This module contains the [`Profile`] type, which represents the public
//! profile information of a Steam account.

use serde::{Deserialize, Deserializer, Serialize};

use super::SteamId;

/// Public profile information about a Steam account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile
{
	/// The account's SteamID.
	#[serde(rename(deserialize = "steamid"))]
	pub steam_id: SteamId,

	/// The account's display name.
	#[serde(rename(deserialize = "personaname"))]
	pub display_name: String,

	/// URL to the account's full-size avatar.
	#[serde(rename(deserialize = "avatarfull"))]
	pub avatar_full: String,

	/// URL to the account's community profile.
	#[serde(rename(deserialize = "profileurl"))]
	pub profile_url: String,
}

/// The body of a `GetPlayerSummaries` response.
///
/// Steam wraps the profiles in two layers of objects, and returns an empty list
/// for accounts it does not know about.
#[derive(Debug)]
pub(super) struct PlayerSummaries(pub Vec<Profile>);

impl<'de> Deserialize<'de> for PlayerSummaries
{
	#[allow(clippy::missing_docs_in_private_items)]
	fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
	where
		D: Deserializer<'de>,
	{
		#[derive(Deserialize)]
		struct Helper1
		{
			response: Helper2,
		}

		#[derive(Deserialize)]
		struct Helper2
		{
			#[serde(default)]
			players: Vec<Profile>,
		}

		Helper1::deserialize(deserializer).map(|Helper1 { response }| Self(response.players))
	}
}
