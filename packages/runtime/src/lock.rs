//! Distributed advisory locks, one per actor address.

use std::sync::Arc;

use actor_core::{ActorAddress, ActorPid};
use store::Store;

use crate::RuntimeError;

/// Proof of one successful lock acquisition.
///
/// The token carries the holder identity written into the store and is
/// only ever threaded from [`LockManager::try_acquire`] to
/// [`LockManager::release`], never kept in ambient state. Dropping a
/// token does NOT release the lock.
#[derive(Debug)]
pub struct LockToken {
    address: ActorAddress,
    holder: ActorPid,
}

impl LockToken {
    /// Address this token locks.
    pub fn address(&self) -> &ActorAddress {
        &self.address
    }

    /// Holder identity written into the lock key.
    pub fn holder(&self) -> ActorPid {
        self.holder
    }
}

/// Acquires and releases per-address locks in the shared store.
///
/// Mutual exclusion rests on one atomic set-if-absent plus a read-back:
/// whoever reads back their own pid holds the lock. There is no lease or
/// heartbeat; a held lock persists until released by the drain pass that
/// acquired it, or by [`LockManager::force_release`].
pub struct LockManager<S> {
    store: Arc<S>,
}

impl<S: Store> LockManager<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Attempt to acquire the lock for `address`.
    ///
    /// Returns `None` on contention, an expected outcome rather than an
    /// error.
    pub async fn try_acquire(
        &self,
        address: &ActorAddress,
    ) -> Result<Option<LockToken>, RuntimeError> {
        let holder = ActorPid::new();
        let key = address.lock_key();

        self.store.set_if_absent(&key, &holder.to_string()).await?;
        let written = self.store.get(&key).await?;

        if written.as_deref() == Some(holder.to_string().as_str()) {
            tracing::debug!("acquired lock for {}", address);
            Ok(Some(LockToken {
                address: address.clone(),
                holder,
            }))
        } else {
            Ok(None)
        }
    }

    /// Release a held lock.
    ///
    /// The delete is unconditional and idempotent: releasing an already
    /// released lock is a no-op.
    pub async fn release(&self, token: LockToken) -> Result<(), RuntimeError> {
        self.store.delete(&token.address.lock_key()).await?;
        tracing::debug!("released lock for {}", token.address);
        Ok(())
    }

    /// Delete a lock key without holding its token.
    ///
    /// The operator escape hatch for a lock orphaned by a crashed or
    /// aborted drain pass.
    pub async fn force_release(&self, address: &ActorAddress) -> Result<(), RuntimeError> {
        tracing::warn!("force-releasing lock for {}", address);
        self.store.delete(&address.lock_key()).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use store::MemoryStore;

    #[tokio::test]
    async fn lock_is_exclusive_until_released() -> Result<(), RuntimeError> {
        let locks = LockManager::new(Arc::new(MemoryStore::new()));
        let address = ActorAddress::new("excl");

        let token = locks.try_acquire(&address).await?.expect("first acquire");
        assert!(locks.try_acquire(&address).await?.is_none());

        locks.release(token).await?;
        assert!(locks.try_acquire(&address).await?.is_some());
        Ok(())
    }

    #[tokio::test]
    async fn release_of_unheld_lock_is_a_noop() -> Result<(), RuntimeError> {
        let locks = LockManager::new(Arc::new(MemoryStore::new()));
        let address = ActorAddress::new("idle");

        locks.force_release(&address).await?;
        assert!(locks.try_acquire(&address).await?.is_some());
        Ok(())
    }

    #[tokio::test]
    async fn force_release_breaks_an_orphaned_lock() -> Result<(), RuntimeError> {
        let locks = LockManager::new(Arc::new(MemoryStore::new()));
        let address = ActorAddress::new("orphan");

        let _orphaned = locks.try_acquire(&address).await?.expect("acquire");
        assert!(locks.try_acquire(&address).await?.is_none());

        locks.force_release(&address).await?;
        assert!(locks.try_acquire(&address).await?.is_some());
        Ok(())
    }
}
