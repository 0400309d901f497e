#![doc = include_str!("../README.md")]
// TODO: remove once https://github.com/tokio-rs/tracing/issues/2912 lands
#![allow(clippy::blocks_in_conditions)]

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::extract::connect_info::IntoMakeServiceWithConnectInfo;
use axum::extract::ConnectInfo;
use axum::Router;
use sqlx::mysql::MySqlPoolOptions;
use ::url::Url;
use tokio::net::TcpListener;

use crate::platform::{MemoryPlatform, MySqlPlatform, Platform, Settings};
use crate::services::broker::{API_KEY_OPTION, SETTINGS_BUNDLE};
use crate::services::{AccountLinker, AdminService, IdentityBroker};
use crate::url::UrlExt;

#[cfg(test)]
mod testing;

mod url;

pub mod runtime;
pub use runtime::Config;

pub mod platform;
pub mod http;
pub mod middleware;
pub mod services;

#[allow(clippy::missing_docs_in_private_items)]
type Server = axum::serve::Serve<
	IntoMakeServiceWithConnectInfo<Router, SocketAddr>,
	axum::middleware::AddExtension<Router, ConnectInfo<SocketAddr>>,
>;

/// Run the server.
///
/// This function will not exit until a SIGINT or SIGTERM signal is received.
/// If you want to supply a custom signal for graceful shutdown, use
/// [`run_until()`] instead.
pub async fn run(config: Config) -> anyhow::Result<()>
{
	server(config)
		.await
		.context("build http server")?
		.with_graceful_shutdown(runtime::signals::shutdown())
		.await
		.context("run http server")
}

/// Run the server until a given future completes.
///
/// This function is the same as [`run()`], except that it also waits for the
/// provided `until` future, and shuts down the server when that future
/// resolves.
pub async fn run_until<Until>(config: Config, until: Until) -> anyhow::Result<()>
where
	Until: Future<Output = ()> + Send + 'static,
{
	server(config)
		.await
		.context("build http server")?
		.with_graceful_shutdown(async move {
			tokio::select! {
				() = until => {}
				() = runtime::signals::shutdown() => {}
			}
		})
		.await
		.context("run http server")
}

/// Runs the necessary setup and returns a future that will run the server when
/// polled.
///
/// See [`run()`] and [`run_until()`].
async fn server(config: Config) -> anyhow::Result<Server>
{
	tracing::debug!(addr = %config.addr, "establishing TCP connection");

	let tcp_listener = TcpListener::bind(config.addr)
		.await
		.context("bind tcp socket")?;

	let addr = tcp_listener.local_addr().context("get tcp addr")?;

	tracing::info!(%addr, prod = cfg!(feature = "production"), "listening for requests");

	http::problem_details::problem_type::set_base_url(config.public_url.clone());

	let public_url = Arc::new(config.public_url.clone());
	let cookie_domain = config
		.cookie_domain
		.as_deref()
		.or_else(|| public_url.cookie_domain())
		.map(Arc::<str>::from);

	let platform = connect_platform(&config).await.context("initialize platform")?;
	let service = router(platform, public_url, cookie_domain)
		.await?
		.into_make_service_with_connect_info::<SocketAddr>();

	Ok(axum::serve(tcp_listener, service))
}

/// Connects to the platform's storage.
///
/// Without a database URL, everything is kept in memory.
#[tracing::instrument(skip_all, err(Debug))]
async fn connect_platform(config: &Config) -> anyhow::Result<Arc<dyn Platform>>
{
	let Some(database_url) = &config.database_url else {
		tracing::warn!("no database configured; all data will be lost on shutdown");

		let platform = MemoryPlatform::new();

		if let Some(api_key) = &config.steam_api_key {
			platform
				.put_settings(SETTINGS_BUNDLE, Settings::from_iter([(API_KEY_OPTION, api_key)]))
				.await;
		}

		return Ok(Arc::new(platform));
	};

	tracing::debug!("connecting to database");

	let database = MySqlPoolOptions::new()
		.min_connections(1)
		.max_connections(16)
		.connect(database_url.as_str())
		.await
		.context("connect to database")?;

	let platform = MySqlPlatform::new(database)
		.await
		.context("run migrations")?;

	if let Some(api_key) = &config.steam_api_key {
		platform
			.put_setting(SETTINGS_BUNDLE, API_KEY_OPTION, api_key)
			.await
			.context("store steam web api key")?;
	}

	Ok(Arc::new(platform))
}

/// Builds the HTTP router for all of our routes.
///
/// The Steam strategy is configured from the platform's `sso-steam` settings.
pub async fn router(
	platform: Arc<dyn Platform>,
	public_url: Arc<Url>,
	cookie_domain: Option<Arc<str>>,
) -> anyhow::Result<Router>
{
	let linker = AccountLinker::new(Arc::clone(&platform), Arc::clone(&public_url));
	let broker = IdentityBroker::from_settings(
		platform,
		linker,
		public_url,
		reqwest::Client::new(),
		cookie_domain,
	)
	.await
	.context("initialize identity broker")?;

	let admin = AdminService::new(broker.clone());

	Ok(Router::new()
		.merge(Router::from(broker))
		.merge(Router::from(admin))
		.layer(middleware::logging::layer!()))
}
