//! Slot capacity ledger.
//!
//! Each slot occurrence (`slot:<day>:<time>:<date>`) maps to the ordered
//! ids of every appointment ever placed into it. Capacity is checked
//! against the length of that sequence, cancelled entries included:
//! cancelling a booking does not free its place. Only a hard delete
//! removes an id.

use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::models::slot::SlotKey;
use crate::Result;

use super::kv::{get_json, put_json, KeyValueStore};
use super::locks::KeyLocks;

/// Key prefix shared by every slot sequence.
pub const SLOT_PREFIX: &str = "slot:";

/// Outcome of a reservation attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reservation {
    /// The id was appended; `position` is its zero-based index.
    Accepted {
        /// Index of the new id within the slot sequence.
        position: usize,
    },
    /// The slot already holds `holders` ids, at or above capacity.
    SlotFull {
        /// Current sequence length.
        holders: usize,
    },
}

/// Capacity-bounded ledger of slot sequences.
#[derive(Clone)]
pub struct SlotLedger {
    store: Arc<dyn KeyValueStore>,
    locks: KeyLocks,
    ttl: Duration,
}

impl SlotLedger {
    /// Create a ledger over the shared store and lock table.
    #[must_use]
    pub fn new(store: Arc<dyn KeyValueStore>, locks: KeyLocks, ttl: Duration) -> Self {
        Self { store, locks, ttl }
    }

    /// Append `appointment_id` to the slot unless it already holds
    /// `max_capacity` ids.
    ///
    /// The read and the write happen under the slot's key lock.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the sequence cannot be read or written.
    pub async fn try_reserve(
        &self,
        slot: &SlotKey,
        appointment_id: &str,
        max_capacity: u32,
    ) -> Result<Reservation> {
        let key = slot.store_key();
        let _guard = self.locks.lock(&key).await;

        let mut holders = self.read(&key).await?;
        let capacity = usize::try_from(max_capacity).unwrap_or(usize::MAX);
        if holders.len() >= capacity {
            debug!(slot = %key, holders = holders.len(), "slot full");
            return Ok(Reservation::SlotFull {
                holders: holders.len(),
            });
        }

        holders.push(appointment_id.to_owned());
        put_json(self.store.as_ref(), &key, &holders, Some(self.ttl)).await?;
        Ok(Reservation::Accepted {
            position: holders.len() - 1,
        })
    }

    /// Remove `appointment_id` from the slot sequence.
    ///
    /// Returns whether the id was present.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the sequence cannot be read or written.
    pub async fn release(&self, slot: &SlotKey, appointment_id: &str) -> Result<bool> {
        let key = slot.store_key();
        let _guard = self.locks.lock(&key).await;

        let mut holders = self.read(&key).await?;
        let before = holders.len();
        holders.retain(|id| id != appointment_id);
        if holders.len() == before {
            return Ok(false);
        }

        if holders.is_empty() {
            self.store.delete(&key).await?;
        } else {
            put_json(self.store.as_ref(), &key, &holders, Some(self.ttl)).await?;
        }
        Ok(true)
    }

    /// Ids currently held by the slot, in reservation order.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the read fails.
    pub async fn holders(&self, slot: &SlotKey) -> Result<Vec<String>> {
        self.read(&slot.store_key()).await
    }

    /// Remove every slot sequence, returning how many were dropped.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if listing or deleting fails.
    pub async fn clear_all(&self) -> Result<usize> {
        let keys = self.store.keys_with_prefix(SLOT_PREFIX).await?;
        for key in &keys {
            let _guard = self.locks.lock(key).await;
            self.store.delete(key).await?;
        }
        Ok(keys.len())
    }

    async fn read(&self, key: &str) -> Result<Vec<String>> {
        Ok(get_json(self.store.as_ref(), key).await?.unwrap_or_default())
    }
}
