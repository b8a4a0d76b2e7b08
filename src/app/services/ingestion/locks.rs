//! Per-file-name serialization of ingestions
//!
//! Two ingestions of the same file name must not interleave their
//! read-delete-insert sequences. Each file name maps to an async mutex that
//! lives only while someone holds or waits for it.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, Weak};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tracing::trace;

/// Registry of per-file-name locks
#[derive(Debug, Default)]
pub struct FileLocks {
    entries: Mutex<HashMap<String, Weak<AsyncMutex<()>>>>,
}

/// Held while an ingestion for one file name is in progress
#[derive(Debug)]
pub struct FileLockGuard {
    _guard: OwnedMutexGuard<()>,
}

impl FileLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait until no other ingestion holds `file_name`, then hold it
    pub async fn acquire(&self, file_name: &str) -> FileLockGuard {
        let lock = self.lock_for(file_name);
        trace!("Waiting for lock on '{}'", file_name);
        FileLockGuard {
            _guard: lock.lock_owned().await,
        }
    }

    /// Number of file names with a live lock
    pub fn active_keys(&self) -> usize {
        let entries = self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        entries.values().filter(|weak| weak.strong_count() > 0).count()
    }

    fn lock_for(&self, file_name: &str) -> Arc<AsyncMutex<()>> {
        let mut entries = self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

        // Drop entries nobody references any more
        entries.retain(|_, weak| weak.strong_count() > 0);

        if let Some(existing) = entries.get(file_name).and_then(Weak::upgrade) {
            return existing;
        }

        let lock = Arc::new(AsyncMutex::new(()));
        entries.insert(file_name.to_string(), Arc::downgrade(&lock));
        lock
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_same_key_is_exclusive() {
        let locks = FileLocks::new();
        let guard = locks.acquire("a.csv").await;

        let second = tokio::time::timeout(Duration::from_millis(50), locks.acquire("a.csv")).await;
        assert!(second.is_err(), "second acquire should wait");

        drop(guard);
        let third = tokio::time::timeout(Duration::from_millis(50), locks.acquire("a.csv")).await;
        assert!(third.is_ok());
    }

    #[tokio::test]
    async fn test_different_keys_do_not_block() {
        let locks = FileLocks::new();
        let _a = locks.acquire("a.csv").await;

        let b = tokio::time::timeout(Duration::from_millis(50), locks.acquire("b.csv")).await;
        assert!(b.is_ok());
    }

    #[tokio::test]
    async fn test_entries_are_pruned_when_released() {
        let locks = FileLocks::new();
        {
            let _a = locks.acquire("a.csv").await;
            assert_eq!(locks.active_keys(), 1);
        }
        assert_eq!(locks.active_keys(), 0);
    }
}
