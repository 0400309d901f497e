//! Trace capturing facilities.

use std::io;

use anyhow::Context;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// The filter used if `RUST_LOG` is not set.
const DEFAULT_FILTER: &str = "steam_sso=info,warn";

/// Initializes [`tracing-subscriber`].
///
/// Logs are written to stderr, filtered by `RUST_LOG`.
///
/// [`tracing-subscriber`]: tracing_subscriber
pub fn init() -> anyhow::Result<()>
{
	let filter = EnvFilter::try_from_default_env()
		.or_else(|_| EnvFilter::try_new(DEFAULT_FILTER))
		.context("parse log filter")?;

	let stderr = tracing_subscriber::fmt::layer()
		.with_ansi(cfg!(not(feature = "production")))
		.with_file(true)
		.with_level(true)
		.with_line_number(true)
		.with_span_events(FmtSpan::NEW | FmtSpan::CLOSE)
		.with_target(true)
		.with_thread_ids(true)
		.with_thread_names(true)
		.with_writer(io::stderr)
		.with_filter(filter);

	tracing_subscriber::registry()
		.with(stderr)
		.try_init()
		.context("install global subscriber")?;

	::tracing::info!("initialized tracing");

	Ok(())
}
