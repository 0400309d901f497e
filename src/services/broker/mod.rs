//! A service for driving the Steam login flow.
//!
//! The broker owns the configured [`SteamStrategy`] (if any), and decides what a
//! successful provider callback means:
//!
//! - a logged-in user hitting the callback is **linking** their Steam account
//! - anybody else is **logging in**, which may create a new user
//!
//! It never touches storage itself; everything goes through the
//! [`AccountLinker`] and the platform.

use std::fmt;
use std::sync::Arc;

use url::Url;

use crate::platform::{LoginHooks, Platform, SessionStore, Settings, SettingsStore};
use crate::services::steam::{Profile, SteamId, SteamStrategy, StrategyDescriptor};
use crate::services::AccountLinker;

pub(crate) mod http;

mod error;
pub use error::{Error, Result};

pub(crate) mod models;
pub use models::{LocalUser, LoginFlow, RequestContext};

pub mod session;

/// The settings bundle holding our configuration.
pub const SETTINGS_BUNDLE: &str = "sso-steam";

/// The option in [`SETTINGS_BUNDLE`] holding the Steam Web API key.
pub const API_KEY_OPTION: &str = "key";

/// Builds the Steam strategy from the plugin settings.
///
/// Returns `None` if no API key is configured, in which case Steam login is
/// not offered at all.
#[tracing::instrument(skip(settings, http_client), err(Debug, level = "debug"))]
pub fn configure_strategy(
	base_url: Arc<Url>,
	settings: &Settings,
	http_client: reqwest::Client,
) -> Result<Option<SteamStrategy>>
{
	let Some(api_key) = settings.get(API_KEY_OPTION) else {
		tracing::info!("no steam web api key configured; steam login disabled");
		return Ok(None);
	};

	let strategy = SteamStrategy::new(base_url, api_key, http_client)?;

	tracing::debug!(callback_url = %strategy.callback_url(), "configured steam strategy");

	Ok(Some(strategy))
}

/// A service for driving the Steam login flow.
#[derive(Clone)]
#[allow(clippy::missing_docs_in_private_items)]
pub struct IdentityBroker
{
	platform: Arc<dyn Platform>,
	linker: AccountLinker,
	base_url: Arc<Url>,
	strategy: Option<SteamStrategy>,
	cookie_domain: Option<Arc<str>>,
}

impl fmt::Debug for IdentityBroker
{
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
	{
		f.debug_struct("IdentityBroker")
			.field("base_url", &format_args!("{:?}", self.base_url.as_str()))
			.field("strategy", &self.strategy)
			.field("cookie_domain", &self.cookie_domain)
			.finish_non_exhaustive()
	}
}

impl IdentityBroker
{
	/// Creates a new [`IdentityBroker`].
	#[tracing::instrument(skip(platform, linker))]
	pub fn new(
		platform: Arc<dyn Platform>,
		linker: AccountLinker,
		base_url: Arc<Url>,
		strategy: Option<SteamStrategy>,
		cookie_domain: Option<Arc<str>>,
	) -> Self
	{
		Self { platform, linker, base_url, strategy, cookie_domain }
	}

	/// Creates a new [`IdentityBroker`], reading the strategy configuration
	/// from the platform's settings.
	#[tracing::instrument(skip(platform, linker, http_client), err(Debug, level = "debug"))]
	pub async fn from_settings(
		platform: Arc<dyn Platform>,
		linker: AccountLinker,
		base_url: Arc<Url>,
		http_client: reqwest::Client,
		cookie_domain: Option<Arc<str>>,
	) -> Result<Self>
	{
		let settings = platform.get_settings(SETTINGS_BUNDLE).await?;
		let strategy = configure_strategy(Arc::clone(&base_url), &settings, http_client)?;

		Ok(Self::new(platform, linker, base_url, strategy, cookie_domain))
	}

	/// The configured strategy.
	pub fn strategy(&self) -> Result<&SteamStrategy>
	{
		self.strategy.as_ref().ok_or(Error::NotConfigured)
	}

	/// Describes our strategy to the platform, if one is configured.
	pub fn descriptor(&self) -> Option<StrategyDescriptor>
	{
		self.strategy.as_ref().map(SteamStrategy::descriptor)
	}

	/// Appends our strategy to the platform's list of login strategies.
	///
	/// Nothing is added if Steam login is not configured.
	pub fn login_strategies(&self, strategies: &mut Vec<StrategyDescriptor>)
	{
		strategies.extend(self.descriptor());
	}

	/// The platform this broker talks to.
	pub(crate) fn platform(&self) -> &dyn Platform
	{
		&*self.platform
	}

	/// The domain session cookies are scoped to.
	pub fn cookie_domain(&self) -> Option<&str>
	{
		self.cookie_domain.as_deref()
	}

	/// Handles a verified provider callback.
	///
	/// A logged-in user links `steam_id` to their account and keeps their
	/// session. Anybody else is logged in as the user linked to `steam_id`,
	/// which is created from `profile` if it does not exist yet.
	///
	/// On login, the session is created before the platform's login hook runs.
	/// If the hook fails, the session ID is never handed out.
	#[tracing::instrument(level = "debug", skip(self, profile), fields(%steam_id), err(Debug, level = "debug"))]
	pub async fn on_callback(
		&self,
		ctx: &RequestContext,
		steam_id: &SteamId,
		profile: &Profile,
	) -> Result<LocalUser>
	{
		if let Some(user_id) = ctx.user_id {
			self.linker.link_account(user_id, steam_id).await?;

			return Ok(LocalUser { user_id, flow: LoginFlow::Link });
		}

		let user_id = self
			.linker
			.resolve_or_create(steam_id, &profile.display_name, &profile.avatar_full)
			.await?;

		let session_id = self.platform.create_session(user_id).await?;

		self.platform.on_successful_login(user_id).await?;

		tracing::debug!(%user_id, "user logged in with steam");

		Ok(LocalUser { user_id, flow: LoginFlow::Login { session_id } })
	}
}

#[cfg(test)]
mod tests
{
	use crate::platform::{Error as PlatformError, MemoryPlatform, UserStore};
	use crate::services::linker::{self, PICTURE_FIELD};

	use super::*;
	use crate::testing;

	const ALICE: &str = "76561198000000001";

	fn profile(display_name: &str) -> Profile
	{
		Profile {
			steam_id: SteamId::new(ALICE),
			display_name: display_name.to_owned(),
			avatar_full: String::from("https://x/a.jpg"),
			profile_url: String::from("https://steamcommunity.com/id/alice/"),
		}
	}

	fn broker() -> color_eyre::Result<(Arc<MemoryPlatform>, IdentityBroker)>
	{
		let platform = Arc::new(MemoryPlatform::new());
		let base_url = Url::parse("https://forum.example.org").map(Arc::new)?;
		let linker = AccountLinker::new(
			Arc::clone(&platform) as Arc<dyn Platform>,
			Arc::clone(&base_url),
		);

		let broker = IdentityBroker::new(
			Arc::clone(&platform) as Arc<dyn Platform>,
			linker,
			base_url,
			None,
			None,
		);

		Ok((platform, broker))
	}

	#[test]
	fn missing_key_registers_nothing() -> color_eyre::Result<()>
	{
		let base_url = Url::parse("https://forum.example.org").map(Arc::new)?;

		for settings in [
			Settings::default(),
			Settings::from_iter([(API_KEY_OPTION, "")]),
		] {
			let strategy = configure_strategy(Arc::clone(&base_url), &settings, reqwest::Client::new())?;

			testing::assert!(strategy.is_none());
		}

		Ok(())
	}

	#[test]
	fn key_registers_strategy() -> color_eyre::Result<()>
	{
		let base_url = Url::parse("https://forum.example.org").map(Arc::new)?;
		let settings = Settings::from_iter([(API_KEY_OPTION, "secret")]);
		let strategy = configure_strategy(base_url, &settings, reqwest::Client::new())?;

		let Some(strategy) = strategy else {
			color_eyre::eyre::bail!("expected a strategy");
		};

		testing::assert_eq!(strategy.realm().as_str(), "https://forum.example.org/");
		testing::assert_eq!(
			strategy.callback_url().as_str(),
			"https://forum.example.org/auth/steam/callback"
		);

		let mut strategies = Vec::new();
		let (platform, broker) = broker()?;
		let broker = IdentityBroker::new(
			platform as Arc<dyn Platform>,
			broker.linker,
			broker.base_url,
			Some(strategy),
			None,
		);

		broker.login_strategies(&mut strategies);

		testing::assert_eq!(strategies.len(), 1);
		testing::assert_eq!(strategies.first().map(|s| s.name.as_str()), Some("steam"));

		Ok(())
	}

	#[tokio::test]
	async fn unconfigured_broker_offers_nothing() -> color_eyre::Result<()>
	{
		let (platform, _) = broker()?;
		let base_url = Url::parse("https://forum.example.org").map(Arc::new)?;
		let linker = AccountLinker::new(
			Arc::clone(&platform) as Arc<dyn Platform>,
			Arc::clone(&base_url),
		);

		let broker = IdentityBroker::from_settings(
			platform as Arc<dyn Platform>,
			linker,
			base_url,
			reqwest::Client::new(),
			None,
		)
		.await?;

		let mut strategies = Vec::new();

		broker.login_strategies(&mut strategies);

		testing::assert!(strategies.is_empty());
		testing::assert_matches!(broker.strategy(), Err(Error::NotConfigured));

		Ok(())
	}

	#[tokio::test]
	async fn anonymous_callback_provisions_and_logs_in() -> color_eyre::Result<()>
	{
		let (platform, broker) = broker()?;
		let steam_id = SteamId::new(ALICE);

		let user = broker
			.on_callback(&RequestContext::anonymous(), &steam_id, &profile("Alice Smith"))
			.await?;

		testing::assert_matches!(user.flow, LoginFlow::Login { .. });
		testing::assert_eq!(platform.logins().await, [user.user_id]);
		testing::assert_eq!(
			platform.get_user_field(user.user_id, PICTURE_FIELD).await?.as_deref(),
			Some("https://x/a.jpg")
		);

		let Some(session_id) = user.session_id() else {
			color_eyre::eyre::bail!("login did not start a session");
		};

		testing::assert_eq!(platform.resolve_session(session_id).await?, Some(user.user_id));
		testing::assert_eq!(platform.live_sessions(user.user_id).await, 1);

		Ok(())
	}

	#[tokio::test]
	async fn returning_user_logs_in_without_provisioning() -> color_eyre::Result<()>
	{
		let (platform, broker) = broker()?;
		let steam_id = SteamId::new(ALICE);
		let ctx = RequestContext::anonymous();

		let first = broker
			.on_callback(&ctx, &steam_id, &profile("Alice Smith"))
			.await?;

		let second = broker
			.on_callback(&ctx, &steam_id, &profile("Renamed"))
			.await?;

		testing::assert_eq!(first.user_id, second.user_id);
		testing::assert!(first.session_id() != second.session_id());
		testing::assert_eq!(platform.user_count().await, 1);
		testing::assert_eq!(platform.logins().await.len(), 2);

		Ok(())
	}

	#[tokio::test]
	async fn authenticated_callback_links_without_login() -> color_eyre::Result<()>
	{
		let (platform, broker) = broker()?;
		let bob = platform.create_user("Bob").await?;
		let steam_id = SteamId::new(ALICE);

		let user = broker
			.on_callback(&RequestContext::authenticated(bob), &steam_id, &profile("Alice Smith"))
			.await?;

		testing::assert_eq!(user, LocalUser { user_id: bob, flow: LoginFlow::Link });
		testing::assert_eq!(platform.user_count().await, 1);
		testing::assert!(platform.logins().await.is_empty());
		testing::assert_eq!(user.session_id(), None);
		testing::assert_eq!(broker.linker.get_local_user_id(&steam_id).await?, Some(bob));

		Ok(())
	}

	#[tokio::test]
	async fn invalid_username_fails_handshake() -> color_eyre::Result<()>
	{
		let (platform, broker) = broker()?;

		let result = broker
			.on_callback(
				&RequestContext::anonymous(),
				&SteamId::new(ALICE),
				&profile("xX_alice_Xx"),
			)
			.await;

		testing::assert_matches!(
			result,
			Err(Error::Linker(linker::Error::InvalidUsername { .. }))
		);
		testing::assert!(platform.logins().await.is_empty());
		testing::assert_eq!(platform.user_count().await, 0);

		Ok(())
	}

	#[tokio::test]
	async fn failing_login_hook_fails_handshake() -> color_eyre::Result<()>
	{
		let (platform, broker) = broker()?;
		let steam_id = SteamId::new(ALICE);

		platform.set_login_hook_failing(true);

		let result = broker
			.on_callback(&RequestContext::anonymous(), &steam_id, &profile("Alice Smith"))
			.await;

		testing::assert_matches!(result, Err(Error::Platform(PlatformError::LoginRejected)));
		testing::assert!(platform.logins().await.is_empty());

		let Some(user_id) = broker.linker.get_local_user_id(&steam_id).await? else {
			color_eyre::eyre::bail!("user should have been provisioned");
		};

		platform.set_login_hook_failing(false);

		let user = broker
			.on_callback(&RequestContext::anonymous(), &steam_id, &profile("Alice Smith"))
			.await?;

		testing::assert_eq!(user.user_id, user_id);
		testing::assert_eq!(platform.logins().await, [user_id]);

		Ok(())
	}
}
