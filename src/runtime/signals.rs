//! This module contains OS signal handlers.
//!
//! These are used for graceful shutdown.

use tokio::signal;

/// The future returned by this function will resolve when the program receives
/// a `SIGINT` signal from the OS.
#[tracing::instrument]
pub async fn sigint()
{
	match signal::ctrl_c().await {
		Ok(()) => tracing::warn!("received SIGINT, shutting down"),
		Err(error) => tracing::error!(%error, "failed to receive SIGINT"),
	}
}

/// The future returned by this function will resolve when the program receives
/// either `SIGINT` or `SIGTERM`.
///
/// On non-unix platforms this is the same as [`sigint()`].
#[tracing::instrument]
pub async fn shutdown()
{
	#[cfg(unix)]
	{
		let sigterm = async {
			match signal::unix::signal(signal::unix::SignalKind::terminate()) {
				Ok(mut stream) => {
					stream.recv().await;
					tracing::warn!("received SIGTERM, shutting down");
				}
				Err(error) => {
					tracing::error!(%error, "failed to install SIGTERM handler");
					std::future::pending::<()>().await;
				}
			}
		};

		tokio::select! {
			() = sigint() => {}
			() = sigterm => {}
		}
	}

	#[cfg(not(unix))]
	sigint().await;
}
