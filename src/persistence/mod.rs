//! Persistence layer modules.

pub mod appointment_repo;
pub mod db;
pub mod kv;
pub mod locks;
pub mod retention;
pub mod schema;
pub mod settings_repo;
pub mod slot_ledger;

/// Re-export the database pool type for convenience.
pub use sqlx::SqlitePool;
