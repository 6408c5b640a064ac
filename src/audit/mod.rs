//! Append-only audit trail of state-changing actions.
//!
//! Provides the [`AuditLogger`] trait and associated types. The primary
//! implementation, [`AuditTrail`], stores one record per entry under
//! `audit:<id>` plus a newest-first index under `audit:list`.

pub mod writer;

use std::fmt::{Display, Formatter};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use async_trait::async_trait;

/// Who triggered an audited action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Actor {
    /// Automated work performed by the service itself.
    System,
    /// An authenticated administrator.
    Admin,
    /// A customer, identified by the email on their booking.
    Customer(String),
}

impl Display for Actor {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::System => f.write_str("system"),
            Self::Admin => f.write_str("Admin"),
            Self::Customer(email) => f.write_str(email),
        }
    }
}

/// A single audit record. Never mutated once written.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AuditEntry {
    /// Unique entry identifier.
    pub id: String,
    /// ISO 8601 timestamp with timezone.
    pub timestamp: DateTime<Utc>,
    /// Short action label, e.g. `requested` or `calendar delete failed`.
    pub action: String,
    /// Free-text details.
    pub details: String,
    /// Appointment the action concerns, if any.
    pub appointment_id: Option<String>,
    /// Actor label: `system`, `Admin`, or a customer email.
    pub actor: Option<String>,
}

impl AuditEntry {
    /// Construct an entry with a fresh id and the current timestamp.
    #[must_use]
    pub fn new(action: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            action: action.into(),
            details: details.into(),
            appointment_id: None,
            actor: None,
        }
    }

    /// Set the appointment identifier for this entry.
    #[must_use]
    pub fn with_appointment(mut self, appointment_id: impl Into<String>) -> Self {
        self.appointment_id = Some(appointment_id.into());
        self
    }

    /// Set the actor label for this entry.
    #[must_use]
    pub fn with_actor(mut self, actor: &Actor) -> Self {
        self.actor = Some(actor.to_string());
        self
    }
}

/// Writes audit entries to a persistent store.
///
/// Implementations must be [`Send`] and [`Sync`] to allow sharing across
/// async task boundaries via [`std::sync::Arc`].
#[async_trait]
pub trait AuditLogger: Send + Sync {
    /// Record a single audit entry.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying write operation fails.
    async fn record(&self, entry: AuditEntry) -> crate::Result<()>;
}

pub use writer::AuditTrail;
