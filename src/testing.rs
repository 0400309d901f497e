//! This module contains helpers for unit tests.

/// Global constructor that will run before tests.
#[ctor::ctor]
fn ctor()
{
	use tracing_subscriber::fmt::format::FmtSpan;
	use tracing_subscriber::EnvFilter;

	if let Err(error) = color_eyre::install() {
		eprintln!("failed to install color-eyre: {error}");
	}

	let result = tracing_subscriber::fmt()
		.compact()
		.with_ansi(true)
		.with_file(true)
		.with_level(true)
		.with_line_number(true)
		.with_span_events(FmtSpan::NEW | FmtSpan::CLOSE)
		.with_target(true)
		.with_test_writer()
		.with_thread_ids(true)
		.with_thread_names(true)
		.with_env_filter(EnvFilter::from_default_env())
		.try_init();

	if let Err(error) = result {
		eprintln!("failed to install tracing subscriber: {error}");
	}
}

macro_rules! assert {
	($expr:expr $(, $($msg:tt)*)?) => {
		::color_eyre::eyre::ensure!($expr $(, $($msg)*)?)
	};
}

macro_rules! assert_eq {
	($lhs:expr, $rhs:expr $(, $($msg:tt)*)?) => {
		match (&$lhs, &$rhs) {
			(lhs, rhs) => {
				if lhs != rhs {
					::color_eyre::eyre::bail!(
						"assertion `{} == {}` failed{}\n  lhs: {lhs:?}\n  rhs: {rhs:?}",
						stringify!($lhs),
						stringify!($rhs),
						$crate::testing::context!($($($msg)*)?),
					);
				}
			}
		}
	};
}

macro_rules! assert_matches {
	($expr:expr, $pat:pat $(if $cond:expr)? $(, $($msg:tt)*)?) => {
		match &$expr {
			value => {
				::color_eyre::eyre::ensure!(
					matches!(value, $pat $(if $cond)?),
					"assertion `{}` does not match `{}`{}\n  value: {value:?}",
					stringify!($expr),
					stringify!($pat),
					$crate::testing::context!($($($msg)*)?),
				);
			}
		}
	};
}

/// Formats an optional message for the assertion macros.
macro_rules! context {
	() => {
		""
	};
	($($msg:tt)+) => {
		format!(" ({})", format_args!($($msg)+))
	};
}

pub(crate) use {assert, assert_eq, assert_matches, context};
