//! The platform's username rule.

/// Checks whether `username` is a valid name for a new account.
///
/// Names must be non-empty and may only consist of alphanumeric characters and
/// spaces.
pub fn is_valid(username: &str) -> bool
{
	!username.is_empty()
		&& username
			.chars()
			.all(|c| c.is_alphanumeric() || c == ' ')
}
