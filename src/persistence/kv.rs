//! Durable key/value contract and its `SQLite` implementation.
//!
//! The store offers per-key reads and writes with an optional time to live.
//! It has no multi-key transactions and no compare-and-swap; callers that
//! read, modify, and write a shared key serialize through [`KeyLocks`].
//!
//! [`KeyLocks`]: super::locks::KeyLocks

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::db::Database;
use crate::Result;

/// Per-key durable storage with expiry.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read a value. Expired entries read as absent.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Insert or replace a value, optionally expiring after `ttl`.
    async fn put(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<()>;

    /// Remove a value. Removing a missing key is not an error.
    async fn delete(&self, key: &str) -> Result<()>;

    /// List live keys starting with `prefix`.
    async fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>>;

    /// Physically remove expired entries, returning how many were dropped.
    async fn purge_expired(&self) -> Result<u64>;
}

/// Read and decode a JSON value.
///
/// # Errors
///
/// Returns `AppError::Db` if the read fails or the stored JSON is malformed.
pub async fn get_json<T: DeserializeOwned>(
    store: &dyn KeyValueStore,
    key: &str,
) -> Result<Option<T>> {
    match store.get(key).await? {
        Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
        None => Ok(None),
    }
}

/// Encode and write a JSON value.
///
/// # Errors
///
/// Returns `AppError::Db` if encoding or the write fails.
pub async fn put_json<T: Serialize + Sync>(
    store: &dyn KeyValueStore,
    key: &str,
    value: &T,
    ttl: Option<Duration>,
) -> Result<()> {
    let raw = serde_json::to_string(value)?;
    store.put(key, &raw, ttl).await
}

/// [`KeyValueStore`] backed by the `kv_entry` table.
#[derive(Clone)]
pub struct SqliteKvStore {
    db: Arc<Database>,
}

impl SqliteKvStore {
    /// Create a new store over a connected pool.
    #[must_use]
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }
}

fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

#[async_trait]
impl KeyValueStore for SqliteKvStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let row: Option<(String,)> = sqlx::query_as(
            "SELECT value FROM kv_entry WHERE key = ?1 AND (expires_at IS NULL OR expires_at > ?2)",
        )
        .bind(key)
        .bind(now_millis())
        .fetch_optional(self.db.as_ref())
        .await?;

        Ok(row.map(|(value,)| value))
    }

    async fn put(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<()> {
        let expires_at = ttl.map(|ttl| {
            now_millis().saturating_add(i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX))
        });

        sqlx::query(
            "INSERT INTO kv_entry (key, value, expires_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, expires_at = excluded.expires_at",
        )
        .bind(key)
        .bind(value)
        .bind(expires_at)
        .execute(self.db.as_ref())
        .await?;

        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        sqlx::query("DELETE FROM kv_entry WHERE key = ?1")
            .bind(key)
            .execute(self.db.as_ref())
            .await?;
        Ok(())
    }

    async fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>> {
        // substr() instead of LIKE: keys may contain LIKE wildcards.
        let rows: Vec<(String,)> = sqlx::query_as(
            "SELECT key FROM kv_entry
             WHERE substr(key, 1, length(?1)) = ?1
               AND (expires_at IS NULL OR expires_at > ?2)
             ORDER BY key",
        )
        .bind(prefix)
        .bind(now_millis())
        .fetch_all(self.db.as_ref())
        .await?;

        Ok(rows.into_iter().map(|(key,)| key).collect())
    }

    async fn purge_expired(&self) -> Result<u64> {
        let result =
            sqlx::query("DELETE FROM kv_entry WHERE expires_at IS NOT NULL AND expires_at <= ?1")
                .bind(now_millis())
                .execute(self.db.as_ref())
                .await?;
        Ok(result.rows_affected())
    }
}
