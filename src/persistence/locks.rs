//! In-process serialization of read-modify-write sequences per store key.
//!
//! The key/value store has no compare-and-swap, so two requests updating
//! the same slot sequence, index, or counter could otherwise both read the
//! old value and lose one update. Holding the key's lock across the read
//! and the write closes that window for every request served by this
//! process. Several processes sharing one database are still subject to
//! lost updates.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// Lock table size above which idle entries are pruned.
const PRUNE_THRESHOLD: usize = 1024;

/// Map of per-key async mutexes. Cloning shares the same table.
#[derive(Clone, Default)]
pub struct KeyLocks {
    table: Arc<Mutex<HashMap<String, Arc<AsyncMutex<()>>>>>,
}

impl KeyLocks {
    /// Create an empty lock table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `key`; released when the guard drops.
    pub async fn lock(&self, key: &str) -> OwnedMutexGuard<()> {
        let entry = {
            let mut table = self.table.lock().unwrap_or_else(PoisonError::into_inner);
            if table.len() > PRUNE_THRESHOLD {
                // Only the table itself references an idle entry.
                table.retain(|_, lock| Arc::strong_count(lock) > 1);
            }
            Arc::clone(table.entry(key.to_owned()).or_default())
        };
        entry.lock_owned().await
    }

    /// Number of keys currently tracked.
    #[must_use]
    pub fn len(&self) -> usize {
        self.table
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether no key is tracked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
