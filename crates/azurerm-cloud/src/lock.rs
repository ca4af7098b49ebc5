//! Named locks
//!
//! Serialises operations that touch the same parent resource from
//! concurrently running reconcilers. The API does not arbitrate concurrent
//! writes to some server-side collections, so callers take the lock keyed by
//! the parent's id around the conflicting call.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// Registry of mutexes keyed by an arbitrary string
///
/// Locks are created on first use and kept for the lifetime of the registry.
/// Cloning yields another handle to the same table.
#[derive(Clone, Default)]
pub struct NamedLocks {
    table: Arc<Mutex<HashMap<String, Arc<AsyncMutex<()>>>>>,
}

impl NamedLocks {
    pub fn new() -> Self {
        Self::default()
    }

    fn entry(&self, key: &str) -> Arc<AsyncMutex<()>> {
        let mut table = self.table.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        table
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(AsyncMutex::new(())))
            .clone()
    }

    /// Wait until the lock for `key` is held exclusively
    pub async fn lock(&self, key: &str) -> NamedLockGuard {
        tracing::debug!("Locking {:?}", key);
        let guard = self.entry(key).lock_owned().await;
        tracing::debug!("Locked {:?}", key);
        NamedLockGuard {
            key: key.to_string(),
            _guard: guard,
        }
    }

    /// Take the lock for `key` only if nobody holds it
    pub fn try_lock(&self, key: &str) -> Option<NamedLockGuard> {
        let guard = self.entry(key).try_lock_owned().ok()?;
        Some(NamedLockGuard {
            key: key.to_string(),
            _guard: guard,
        })
    }

    /// Number of keys seen so far
    pub fn len(&self) -> usize {
        self.table
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for NamedLocks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NamedLocks").field("keys", &self.len()).finish()
    }
}

/// Exclusive ownership of one key; released on [`unlock`](Self::unlock) or drop
pub struct NamedLockGuard {
    key: String,
    _guard: OwnedMutexGuard<()>,
}

impl NamedLockGuard {
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn unlock(self) {
        tracing::debug!("Unlocking {:?}", self.key);
    }
}
