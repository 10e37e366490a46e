//! Named locks serializing mutations of the same parent object
//!
//! Read-modify-write of an embedded list is not atomic against the API, so
//! every operation on one parent takes the parent's lock key first. Locks are
//! created on first use and kept for the life of the registry.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// Table of lock keys to mutexes, owned by a client session
#[derive(Debug)]
pub struct MutexRegistry {
    locks: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
    enabled: bool,
}

/// Held lock; released on drop
#[derive(Debug)]
pub struct KeyGuard {
    key: String,
    guard: Option<OwnedMutexGuard<()>>,
}

impl KeyGuard {
    pub fn key(&self) -> &str {
        &self.key
    }
}

impl Drop for KeyGuard {
    fn drop(&mut self) {
        if self.guard.is_some() {
            tracing::debug!("Unlocked {:?}", self.key);
        }
    }
}

impl MutexRegistry {
    pub fn new() -> Self {
        Self {
            locks: Mutex::new(HashMap::new()),
            enabled: true,
        }
    }

    /// A registry whose locks never block. Only for reproducing races in tests.
    pub fn unlocked() -> Self {
        Self {
            locks: Mutex::new(HashMap::new()),
            enabled: false,
        }
    }

    /// Wait until no other holder has `key`
    pub async fn lock(&self, key: &str) -> KeyGuard {
        if !self.enabled {
            return KeyGuard {
                key: key.to_string(),
                guard: None,
            };
        }

        let mutex = {
            let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
            locks
                .entry(key.to_string())
                .or_insert_with(|| Arc::new(AsyncMutex::new(())))
                .clone()
        };

        tracing::debug!("Locking {:?}", key);
        let guard = mutex.lock_owned().await;
        tracing::debug!("Locked {:?}", key);

        KeyGuard {
            key: key.to_string(),
            guard: Some(guard),
        }
    }

    /// Number of distinct keys ever locked
    pub fn len(&self) -> usize {
        self.locks.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for MutexRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::{assert_pending, assert_ready, task};

    #[tokio::test]
    async fn test_same_key_blocks_until_release() {
        let registry = MutexRegistry::new();
        let first = registry.lock("router/us-central1/r1").await;

        let mut second = task::spawn(registry.lock("router/us-central1/r1"));
        assert_pending!(second.poll());

        drop(first);
        assert!(second.is_woken());
        let guard = assert_ready!(second.poll());
        assert_eq!(guard.key(), "router/us-central1/r1");
    }

    #[tokio::test]
    async fn test_different_keys_do_not_block() {
        let registry = MutexRegistry::new();
        let _a = registry.lock("router/us-central1/a").await;

        let mut other = task::spawn(registry.lock("router/us-central1/b"));
        assert_ready!(other.poll());
        assert_eq!(registry.len(), 2);
    }

    #[tokio::test]
    async fn test_locks_are_kept_after_release() {
        let registry = MutexRegistry::new();
        drop(registry.lock("k").await);
        drop(registry.lock("k").await);
        assert_eq!(registry.len(), 1);
    }

    #[tokio::test]
    async fn test_unlocked_registry_never_blocks() {
        let registry = MutexRegistry::unlocked();
        let _held = registry.lock("k").await;

        let mut again = task::spawn(registry.lock("k"));
        assert_ready!(again.poll());
        assert!(registry.is_empty());
    }
}
