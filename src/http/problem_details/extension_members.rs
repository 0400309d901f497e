//! This module contains the [`ExtensionMembers`] struct.
//!
//! It represents arbitrary additional fields to add to an error response.

use std::fmt;

use serde::Serialize;

/// [RFC 9457] [Extension Members].
///
/// [RFC 9457]: https://www.rfc-editor.org/rfc/rfc9457.html
/// [Extension Members]: https://www.rfc-editor.org/rfc/rfc9457.html#name-extension-members
#[derive(Default, Serialize)]
#[serde(transparent)]
pub struct ExtensionMembers
{
	/// JSON object that encodes the extra values.
	obj: serde_json::Map<String, serde_json::Value>,
}

impl ExtensionMembers
{
	/// Creates a new [`ExtensionMembers`].
	pub fn new() -> Self
	{
		Self::default()
	}

	/// Adds an extension member.
	///
	/// Values that cannot be represented as JSON are skipped.
	pub fn add<N, V>(&mut self, name: N, value: &V)
	where
		N: Into<String>,
		V: Serialize + ?Sized,
	{
		match serde_json::to_value(value) {
			Ok(value) => {
				self.obj.insert(name.into(), value);
			}
			Err(error) => {
				tracing::warn!(%error, "skipping extension member");
			}
		}
	}

	/// Returns the value of an extension member.
	pub fn get(&self, name: &str) -> Option<&serde_json::Value>
	{
		self.obj.get(name)
	}
}

impl fmt::Debug for ExtensionMembers
{
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
	{
		fmt::Debug::fmt(&self.obj, f)
	}
}
