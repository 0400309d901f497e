//! Request / Response types for this service.

use serde::{Deserialize, Serialize};

use crate::services::steam::SteamId;

/// How a user's Steam link is presented on account-settings pages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Association
{
	/// Whether the user has linked a Steam account.
	pub associated: bool,

	/// The linked account's profile, or the route that starts linking one.
	pub url: String,

	/// The linked account's SteamID.
	#[serde(rename = "steamid", skip_serializing_if = "Option::is_none")]
	pub steam_id: Option<SteamId>,

	/// Display name of the provider.
	pub name: String,

	/// Icon of the provider.
	pub icon: String,
}

/// A user record as the platform hands it to plugins for enrichment.
pub type UserRecord = serde_json::Map<String, serde_json::Value>;
