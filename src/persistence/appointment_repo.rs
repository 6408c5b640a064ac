//! Appointment records and the global appointment index.
//!
//! Layout: `appointment:<id>` holds the JSON record and `appointments:list`
//! holds the ordered array of every live appointment id. Both carry the
//! record retention TTL.

use std::sync::Arc;
use std::time::Duration;

use tracing::warn;

use crate::models::appointment::Appointment;
use crate::Result;

use super::kv::{get_json, put_json, KeyValueStore};
use super::locks::KeyLocks;

/// Store key of the global appointment index.
pub const INDEX_KEY: &str = "appointments:list";

/// Store key of one appointment record.
#[must_use]
pub fn record_key(id: &str) -> String {
    format!("appointment:{id}")
}

/// Repository wrapper around the key/value store for appointment records.
#[derive(Clone)]
pub struct AppointmentRepo {
    store: Arc<dyn KeyValueStore>,
    locks: KeyLocks,
    ttl: Duration,
}

impl AppointmentRepo {
    /// Create a new repository instance.
    #[must_use]
    pub fn new(store: Arc<dyn KeyValueStore>, locks: KeyLocks, ttl: Duration) -> Self {
        Self { store, locks, ttl }
    }

    /// Retrieve an appointment by identifier.
    ///
    /// Returns `Ok(None)` if the appointment does not exist or has expired.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the read fails.
    pub async fn get_by_id(&self, id: &str) -> Result<Option<Appointment>> {
        get_json(self.store.as_ref(), &record_key(id)).await
    }

    /// Write (insert or replace) an appointment record.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the write fails.
    pub async fn save(&self, appointment: &Appointment) -> Result<()> {
        put_json(
            self.store.as_ref(),
            &record_key(&appointment.id),
            appointment,
            Some(self.ttl),
        )
        .await
    }

    /// Remove an appointment record. The index is not touched.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the delete fails.
    pub async fn delete(&self, id: &str) -> Result<()> {
        self.store.delete(&record_key(id)).await
    }

    /// Append an id to the global index if it is not present yet.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the index read or write fails.
    pub async fn add_to_index(&self, id: &str) -> Result<()> {
        let _guard = self.locks.lock(INDEX_KEY).await;
        let mut ids = self.index().await?;
        if ids.iter().any(|existing| existing == id) {
            return Ok(());
        }
        ids.push(id.to_owned());
        put_json(self.store.as_ref(), INDEX_KEY, &ids, Some(self.ttl)).await
    }

    /// Remove an id from the global index.
    ///
    /// Returns whether the id was present.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the index read or write fails.
    pub async fn remove_from_index(&self, id: &str) -> Result<bool> {
        let _guard = self.locks.lock(INDEX_KEY).await;
        let mut ids = self.index().await?;
        let before = ids.len();
        ids.retain(|existing| existing != id);
        if ids.len() == before {
            return Ok(false);
        }
        put_json(self.store.as_ref(), INDEX_KEY, &ids, Some(self.ttl)).await?;
        Ok(true)
    }

    /// Drop the global index entirely.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the delete fails.
    pub async fn clear_index(&self) -> Result<()> {
        let _guard = self.locks.lock(INDEX_KEY).await;
        self.store.delete(INDEX_KEY).await
    }

    /// Ordered ids in the global index.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the read fails.
    pub async fn index(&self) -> Result<Vec<String>> {
        Ok(get_json(self.store.as_ref(), INDEX_KEY)
            .await?
            .unwrap_or_default())
    }

    /// Load every indexed appointment, skipping ids whose record expired.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if any read fails.
    pub async fn list_all(&self) -> Result<Vec<Appointment>> {
        let ids = self.index().await?;
        let mut appointments = Vec::with_capacity(ids.len());
        for id in ids {
            match self.get_by_id(&id).await? {
                Some(appointment) => appointments.push(appointment),
                None => warn!(appointment_id = %id, "indexed appointment has no record"),
            }
        }
        Ok(appointments)
    }

    /// Find a live (non-cancelled) appointment booked with `email`.
    ///
    /// Comparison is case-insensitive. This scans the whole index, one
    /// point read per appointment.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if any read fails.
    pub async fn find_live_by_email(&self, email: &str) -> Result<Option<Appointment>> {
        let needle = email.trim().to_lowercase();
        for id in self.index().await? {
            if let Some(appointment) = self.get_by_id(&id).await? {
                if appointment.is_live()
                    && appointment.contact.email.trim().to_lowercase() == needle
                {
                    return Ok(Some(appointment));
                }
            }
        }
        Ok(None)
    }
}
