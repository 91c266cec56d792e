//! Per-key locking for the tiered store
//!
//! A `put` holds the key's write lock across both tiers, so a concurrent `get`
//! of the same key never sees a redirect marker whose bulk copy is not yet
//! written. Different keys never contend.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// Shared handle to one key's async read-write lock.
pub type KeyLock = Arc<tokio::sync::RwLock<()>>;

/// Per-key lock manager
pub struct KeyLockManager {
    /// Map from storage key to its lock
    locks: Arc<RwLock<HashMap<String, KeyLock>>>,
}

impl KeyLockManager {
    pub fn new() -> Self {
        Self {
            locks: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Get or create the lock for `key`.
    pub fn get_lock(&self, key: &str) -> KeyLock {
        {
            let map = self.locks.read();
            if let Some(lock) = map.get(key) {
                return Arc::clone(lock);
            }
        }

        // Re-check under the write lock; another caller may have inserted it
        let mut map = self.locks.write();
        Arc::clone(
            map.entry(key.to_string())
                .or_insert_with(|| Arc::new(tokio::sync::RwLock::new(()))),
        )
    }

    /// Drop locks nobody currently holds a handle to.
    pub fn prune(&self) -> usize {
        let mut map = self.locks.write();
        let before = map.len();
        map.retain(|_, lock| Arc::strong_count(lock) > 1);
        before - map.len()
    }

    pub fn len(&self) -> usize {
        self.locks.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.read().is_empty()
    }
}

impl Default for KeyLockManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn test_same_key_shares_lock() {
        let manager = KeyLockManager::new();
        let a = manager.get_lock("concatenatedFiles");
        let b = manager.get_lock("concatenatedFiles");
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(manager.len(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_write_excludes_other_writes() {
        let manager = Arc::new(KeyLockManager::new());
        let counter = Arc::new(AtomicUsize::new(0));

        let mut handles = vec![];
        for _ in 0..5 {
            let manager = Arc::clone(&manager);
            let counter = Arc::clone(&counter);
            handles.push(tokio::spawn(async move {
                let lock = manager.get_lock("k");
                let _guard = lock.write().await;
                let current = counter.load(Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(1)).await;
                counter.store(current + 1, Ordering::SeqCst);
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        // No lost updates
        assert_eq!(counter.load(Ordering::SeqCst), 5);
    }

    #[tokio::test]
    async fn test_different_keys_dont_block() {
        let manager = KeyLockManager::new();
        let a = manager.get_lock("a");
        let b = manager.get_lock("b");
        let _held = a.write().await;
        assert!(b.try_write().is_ok());
    }

    #[tokio::test]
    async fn test_prune_keeps_held_locks() {
        let manager = KeyLockManager::new();
        let held = manager.get_lock("held");
        drop(manager.get_lock("released"));
        assert_eq!(manager.prune(), 1);
        assert_eq!(manager.len(), 1);
        drop(held);
        assert_eq!(manager.prune(), 1);
        assert!(manager.is_empty());
    }
}
