//! Helpers for building URLs relative to the platform's base URL.

use url::{Host, Url};

/// Extension methods for [`Url`].
pub trait UrlExt
{
	/// Appends `path` to this URL, keeping any path the URL already has.
	///
	/// Unlike [`Url::join()`], `https://example.org/forum` joined with
	/// `/auth/steam` is `https://example.org/forum/auth/steam`.
	fn join_path(&self, path: &str) -> Result<Url, url::ParseError>;

	/// The domain cookies for this URL should be scoped to.
	///
	/// IP addresses and URLs without a host have none.
	fn cookie_domain(&self) -> Option<&str>;
}

impl UrlExt for Url
{
	fn join_path(&self, path: &str) -> Result<Url, url::ParseError>
	{
		Url::parse(&join(self, path))
	}

	fn cookie_domain(&self) -> Option<&str>
	{
		match self.host()? {
			Host::Domain(domain) => Some(domain),
			Host::Ipv4(_) | Host::Ipv6(_) => None,
		}
	}
}

/// Appends `path` to `base` as a plain string.
pub fn join(base: &Url, path: &str) -> String
{
	format!(
		"{}/{}",
		base.as_str().trim_end_matches('/'),
		path.trim_start_matches('/'),
	)
}
