//! The `steam-sso` server.

use anyhow::Context;
use clap::Parser;
use steam_sso::runtime::{self, Config};

mod tracing;

#[tokio::main]
async fn main() -> anyhow::Result<()>
{
	if let Err(error) = dotenvy::dotenv() {
		eprintln!("WARNING: failed to load `.env` file: {error}");
	}

	tracing::init().context("initialize tracing")?;
	runtime::panic_hook::install();

	let config = Config::parse();

	::tracing::debug!(?config, "loaded configuration");

	if cfg!(not(feature = "production")) {
		::tracing::warn!("running in development mode");
	}

	steam_sso::run(config).await
}
