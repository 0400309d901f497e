//! Per-account locks for provisioning new users.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use crate::services::steam::SteamId;

/// Serializes provisioning of new users per Steam account.
///
/// Two first-time logins with the same Steam account would otherwise both
/// observe "no link yet" and both create a user.
#[derive(Debug, Default)]
pub(super) struct ProvisioningLocks
{
	/// One lock per Steam account that is currently being provisioned.
	guards: Mutex<HashMap<SteamId, Arc<AsyncMutex<()>>>>,
}

impl ProvisioningLocks
{
	/// Waits until nobody else is provisioning `steam_id`.
	///
	/// The lock is held until the returned guard is dropped.
	pub(super) async fn lock(&self, steam_id: &SteamId) -> OwnedMutexGuard<()>
	{
		let lock = {
			let mut guards = self.guards.lock().unwrap_or_else(PoisonError::into_inner);

			// nobody holds or waits for these anymore
			guards.retain(|_, lock| Arc::strong_count(lock) > 1);

			Arc::clone(guards.entry(steam_id.clone()).or_default())
		};

		lock.lock_owned().await
	}

	/// How many locks are currently tracked.
	#[cfg(test)]
	fn tracked(&self) -> usize
	{
		self.guards
			.lock()
			.unwrap_or_else(PoisonError::into_inner)
			.len()
	}
}

#[cfg(test)]
mod tests
{
	use std::time::Duration;

	use super::*;
	use crate::testing;

	#[tokio::test]
	async fn same_account_is_exclusive() -> color_eyre::Result<()>
	{
		let locks = ProvisioningLocks::default();
		let steam_id = SteamId::new("76561198000000001");
		let guard = locks.lock(&steam_id).await;

		let second = tokio::time::timeout(Duration::from_millis(50), locks.lock(&steam_id)).await;

		testing::assert!(second.is_err(), "second lock should block");

		drop(guard);

		let _second = locks.lock(&steam_id).await;

		Ok(())
	}

	#[tokio::test]
	async fn different_accounts_do_not_block() -> color_eyre::Result<()>
	{
		let locks = ProvisioningLocks::default();
		let _alice = locks.lock(&SteamId::new("1")).await;
		let bob = tokio::time::timeout(Duration::from_millis(50), locks.lock(&SteamId::new("2"))).await;

		testing::assert!(bob.is_ok(), "unrelated accounts should not block each other");

		Ok(())
	}

	#[tokio::test]
	async fn released_locks_are_pruned() -> color_eyre::Result<()>
	{
		let locks = ProvisioningLocks::default();

		drop(locks.lock(&SteamId::new("1")).await);
		drop(locks.lock(&SteamId::new("2")).await);

		testing::assert_eq!(locks.tracked(), 1);

		Ok(())
	}
}
