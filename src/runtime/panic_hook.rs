//! Reporting panics through `tracing`.

use std::any::Any;
use std::backtrace::Backtrace;
use std::panic;
use std::sync::atomic::{self, AtomicBool};

/// Whether [`install()`] already ran.
static INSTALLED: AtomicBool = AtomicBool::new(false);

/// Installs a global panic hook that records panics as `error` events on the
/// `steam_sso::audit_log` target, with the panic's message (`reason`) and
/// location as separate fields.
///
/// The previous hook is invoked after ours. Only the first call installs
/// anything; it returns whether this call did.
#[tracing::instrument(target = "steam_sso::runtime", name = "panic_hook")]
pub fn install() -> bool
{
	if INSTALLED.swap(true, atomic::Ordering::SeqCst) {
		tracing::debug!("panic hook already installed");
		return false;
	}

	let old_hook = panic::take_hook();

	panic::set_hook(Box::new(move |info| {
		let thread = std::thread::current();
		let location = info
			.location()
			.map(|location| format!("{}:{}", location.file(), location.line()));

		tracing::error!(
			target: "steam_sso::audit_log",
			reason = panic_message(info.payload()),
			location = location.as_deref(),
			thread = thread.name(),
			backtrace = %Backtrace::force_capture(),
			"panicked",
		);

		old_hook(info)
	}));

	tracing::debug!("installed panic hook");

	true
}

/// Extracts the message a panic was raised with.
fn panic_message(payload: &(dyn Any + Send)) -> &str
{
	payload
		.downcast_ref::<&str>()
		.copied()
		.or_else(|| payload.downcast_ref::<String>().map(String::as_str))
		.unwrap_or("<non-string panic payload>")
}

#[cfg(test)]
mod tests
{
	use super::*;
	use crate::testing;

	#[test]
	fn extract_panic_messages() -> color_eyre::Result<()>
	{
		let literal: Box<dyn Any + Send> = Box::new("boom");
		let formatted: Box<dyn Any + Send> = Box::new(String::from("boom 42"));
		let other: Box<dyn Any + Send> = Box::new(42_u8);

		testing::assert_eq!(panic_message(&*literal), "boom");
		testing::assert_eq!(panic_message(&*formatted), "boom 42");
		testing::assert_eq!(panic_message(&*other), "<non-string panic payload>");

		Ok(())
	}

	#[test]
	fn install_only_once() -> color_eyre::Result<()>
	{
		install();

		testing::assert!(!install(), "second install should be a no-op");

		Ok(())
	}
}
