//! A service for the plugin's admin pages.

use std::fmt;

use axum::extract::FromRef;

use crate::platform::{UserId, UserStore};
use crate::services::broker::{self, IdentityBroker, RequestContext};
use crate::services::{linker, steam};

pub(crate) mod http;

mod error;
pub use error::{Error, Result};

pub(crate) mod models;
pub use models::{AdminHeader, AdminMenuItem, AdminPage};

/// Admin route of our settings page, relative to `/admin`.
pub const ROUTE: &str = "/plugins/sso-steam";

/// A service for the plugin's admin pages.
#[derive(Clone)]
#[allow(clippy::missing_docs_in_private_items)]
pub struct AdminService
{
	broker: IdentityBroker,
}

impl fmt::Debug for AdminService
{
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
	{
		f.debug_struct("AdminService").finish_non_exhaustive()
	}
}

impl FromRef<AdminService> for IdentityBroker
{
	fn from_ref(svc: &AdminService) -> Self
	{
		svc.broker.clone()
	}
}

impl AdminService
{
	/// Create a new [`AdminService`].
	#[tracing::instrument]
	pub fn new(broker: IdentityBroker) -> Self
	{
		Self { broker }
	}

	/// Our entry in the admin navigation.
	pub fn menu_item() -> AdminMenuItem
	{
		AdminMenuItem {
			route: String::from(ROUTE),
			icon: String::from(steam::ICON),
			name: String::from(linker::PROVIDER_NAME),
		}
	}

	/// Adds our entry to the platform's admin navigation.
	pub fn add_menu_item(header: &mut AdminHeader)
	{
		header.authentication.push(Self::menu_item());
	}

	/// Checks that the request was made by an administrator.
	#[tracing::instrument(level = "debug", skip(self), err(Debug, level = "debug"))]
	pub async fn authorize(&self, ctx: &RequestContext) -> Result<UserId>
	{
		let user_id = ctx.user_id.ok_or(Error::Unauthorized)?;

		if !self.broker.platform().is_administrator(user_id).await? {
			return Err(Error::Forbidden);
		}

		Ok(user_id)
	}

	/// Builds the admin page.
	#[tracing::instrument(level = "debug")]
	pub fn page(&self) -> AdminPage
	{
		let strategy = self.broker.strategy().ok();

		AdminPage {
			configured: strategy.is_some(),
			settings_bundle: broker::SETTINGS_BUNDLE,
			settings_option: broker::API_KEY_OPTION,
			callback_url: strategy.map(|strategy| strategy.callback_url().to_string()),
			strategy: self.broker.descriptor(),
		}
	}
}
