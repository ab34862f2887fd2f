// SPDX-FileCopyrightText: 2026 Botfleet Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Keyed lock tables.
//!
//! The pipeline serializes runs per (user, tenant) with [`SessionLocks`];
//! the registry and the admin service serialize work per tenant with
//! [`TenantLocks`].

use std::hash::Hash;
use std::sync::Arc;

use botfleet_core::types::TenantId;
use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// One async mutex per key, created on demand.
///
/// Different keys never contend. Entries nobody holds are removed by
/// [`KeyedLocks::prune_idle`].
pub struct KeyedLocks<K: Eq + Hash> {
    locks: DashMap<K, Arc<Mutex<()>>>,
}

pub type SessionLocks = KeyedLocks<(String, TenantId)>;
pub type TenantLocks = KeyedLocks<TenantId>;

impl<K: Eq + Hash> Default for KeyedLocks<K> {
    fn default() -> Self {
        Self {
            locks: DashMap::new(),
        }
    }
}

impl<K: Eq + Hash> KeyedLocks<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits until nobody else holds the lock for `key`.
    pub async fn acquire(&self, key: K) -> OwnedMutexGuard<()> {
        let lock = self.locks.entry(key).or_default().clone();
        lock.lock_owned().await
    }

    /// Drops entries that are neither held nor awaited.
    pub fn prune_idle(&self) {
        self.locks.retain(|_, lock| Arc::strong_count(lock) > 1);
    }

    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn key(user: &str, tenant: i64) -> (String, TenantId) {
        (user.to_string(), TenantId(tenant))
    }

    #[tokio::test]
    async fn same_pair_is_serialized() {
        let locks = Arc::new(SessionLocks::new());
        let guard = locks.acquire(key("42", 1)).await;

        let waiter = {
            let locks = locks.clone();
            tokio::spawn(async move {
                let _g = locks.acquire(key("42", 1)).await;
            })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());

        drop(guard);
        waiter.await.unwrap();
    }

    #[tokio::test]
    async fn different_pairs_do_not_contend() {
        let locks = SessionLocks::new();
        let _a = locks.acquire(key("42", 1)).await;
        let _b = locks.acquire(key("42", 2)).await;
        let _c = locks.acquire(key("43", 1)).await;
        assert_eq!(locks.len(), 3);
    }

    #[tokio::test]
    async fn prune_keeps_held_locks() {
        let locks = TenantLocks::new();
        let held = locks.acquire(TenantId(1)).await;
        drop(locks.acquire(TenantId(2)).await);

        locks.prune_idle();
        assert_eq!(locks.len(), 1);

        drop(held);
        locks.prune_idle();
        assert!(locks.is_empty());
    }
}
