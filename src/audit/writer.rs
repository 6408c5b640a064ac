//! Key/value backed audit trail with a newest-first index.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};

use super::{Actor, AuditEntry, AuditLogger};
use crate::persistence::kv::{get_json, put_json, KeyValueStore};
use crate::persistence::locks::KeyLocks;
use crate::Result;

/// Store key of the audit index.
pub const AUDIT_INDEX_KEY: &str = "audit:list";

fn entry_key(id: &str) -> String {
    format!("audit:{id}")
}

/// Audit trail stored in the shared key/value store.
///
/// Entries and the index both carry the audit retention TTL. The index
/// holds at most `max_entries` ids; each write drops the oldest ids past
/// that cap together with their entries.
#[derive(Clone)]
pub struct AuditTrail {
    store: Arc<dyn KeyValueStore>,
    locks: KeyLocks,
    ttl: Duration,
    max_entries: usize,
}

impl AuditTrail {
    /// Construct a trail over the shared store and lock table.
    #[must_use]
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        locks: KeyLocks,
        ttl: Duration,
        max_entries: usize,
    ) -> Self {
        Self {
            store,
            locks,
            ttl,
            max_entries: max_entries.max(1),
        }
    }

    /// Most recent entries, newest first, at most `limit` of them.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the index or an entry cannot be read.
    pub async fn list(&self, limit: usize) -> Result<Vec<AuditEntry>> {
        let ids = self.index().await?;
        let mut entries = Vec::with_capacity(ids.len().min(limit));
        for id in ids.into_iter().take(limit) {
            match get_json::<AuditEntry>(self.store.as_ref(), &entry_key(&id)).await? {
                Some(entry) => entries.push(entry),
                None => debug!(audit_id = %id, "indexed audit entry expired"),
            }
        }
        Ok(entries)
    }

    /// Delete every entry and the index, then record one entry describing
    /// the clear. Returns the number of entries removed.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if any delete or the closing write fails.
    pub async fn clear(&self, actor: &Actor) -> Result<usize> {
        let removed = {
            let _guard = self.locks.lock(AUDIT_INDEX_KEY).await;
            let ids = self.index().await?;
            for id in &ids {
                self.store.delete(&entry_key(id)).await?;
            }
            self.store.delete(AUDIT_INDEX_KEY).await?;
            ids.len()
        };

        self.record(
            AuditEntry::new(
                "audit log cleared",
                format!("removed {removed} audit entries"),
            )
            .with_actor(actor),
        )
        .await?;
        Ok(removed)
    }

    async fn index(&self) -> Result<Vec<String>> {
        Ok(get_json(self.store.as_ref(), AUDIT_INDEX_KEY)
            .await?
            .unwrap_or_default())
    }
}

#[async_trait]
impl AuditLogger for AuditTrail {
    async fn record(&self, entry: AuditEntry) -> Result<()> {
        put_json(
            self.store.as_ref(),
            &entry_key(&entry.id),
            &entry,
            Some(self.ttl),
        )
        .await?;

        let _guard = self.locks.lock(AUDIT_INDEX_KEY).await;
        let mut ids = self.index().await?;
        ids.insert(0, entry.id.clone());
        let dropped = if ids.len() > self.max_entries {
            ids.split_off(self.max_entries)
        } else {
            Vec::new()
        };
        if let Err(err) = put_json(self.store.as_ref(), AUDIT_INDEX_KEY, &ids, Some(self.ttl)).await
        {
            warn!(audit_id = %entry.id, %err, "audit index update failed");
            return Err(err);
        }

        for id in &dropped {
            if let Err(err) = self.store.delete(&entry_key(id)).await {
                warn!(audit_id = %id, %err, "dropping audit entry past the index cap failed");
            }
        }
        if !dropped.is_empty() {
            debug!(dropped = dropped.len(), cap = self.max_entries, "audit index trimmed");
        }
        Ok(())
    }
}
