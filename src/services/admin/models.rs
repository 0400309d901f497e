//! Request / Response types for this service.

use serde::{Deserialize, Serialize};

use crate::services::steam::StrategyDescriptor;

/// An entry in the platform's admin navigation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminMenuItem
{
	/// Admin route of the page, relative to `/admin`.
	pub route: String,

	/// Icon shown next to the entry.
	pub icon: String,

	/// Label of the entry.
	pub name: String,
}

/// The admin navigation sections plugins can add entries to.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminHeader
{
	/// Pages related to authentication.
	#[serde(default)]
	pub authentication: Vec<AdminMenuItem>,
}

/// Response body for the admin page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AdminPage
{
	/// Whether Steam login is currently offered.
	pub configured: bool,

	/// The settings bundle the Web API key is read from.
	pub settings_bundle: &'static str,

	/// The option inside the bundle that holds the key.
	pub settings_option: &'static str,

	/// The URL Steam redirects back to.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub callback_url: Option<String>,

	/// The strategy as registered with the platform.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub strategy: Option<StrategyDescriptor>,
}
