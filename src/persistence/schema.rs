//! `SQLite` schema bootstrap logic.
//!
//! The service persists everything through a single key/value table.
//! The DDL uses `CREATE ... IF NOT EXISTS` and is safe to re-run on
//! every server startup.

use sqlx::SqlitePool;

use crate::Result;

/// Apply the key/value table definition to the connected database.
///
/// # Errors
///
/// Returns `AppError::Db` if any DDL statement fails.
pub async fn bootstrap_schema(pool: &SqlitePool) -> Result<()> {
    let ddl = r"
CREATE TABLE IF NOT EXISTS kv_entry (
    key         TEXT PRIMARY KEY NOT NULL,
    value       TEXT NOT NULL,
    expires_at  INTEGER
);

CREATE INDEX IF NOT EXISTS idx_kv_expires ON kv_entry(expires_at);
";

    sqlx::raw_sql(ddl).execute(pool).await?;
    Ok(())
}
