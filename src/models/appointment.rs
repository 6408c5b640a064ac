//! Appointment model and lifecycle helpers.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::slot::{Day, SlotKey, SlotTime};

/// Lifecycle status for an appointment.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    /// Awaiting staff confirmation.
    Pending,
    /// Confirmed by staff or by the automatic booking mode.
    Confirmed,
    /// Rejected or cancelled; terminal.
    Cancelled,
}

impl AppointmentStatus {
    /// Lower-case label used in audit entries and payloads.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Cancelled => "cancelled",
        }
    }
}

/// Customer contact fields captured at booking time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct ContactDetails {
    /// Customer's full name.
    pub name: String,
    /// Optional company or organisation.
    pub company: Option<String>,
    /// Phone number as entered.
    pub phone: String,
    /// Email address as entered.
    pub email: String,
    /// Optional free-text message to staff.
    pub message: Option<String>,
}

/// One reservation of a slot, persisted under `appointment:<id>`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct Appointment {
    /// Unique record identifier.
    pub id: String,
    /// Event day tag.
    pub day: Day,
    /// Start time on the grid.
    pub time: SlotTime,
    /// Local calendar date of the occurrence.
    pub slot_date: NaiveDate,
    /// Absolute start instant.
    pub appointment_date: DateTime<Utc>,
    /// Customer contact details.
    #[serde(flatten)]
    pub contact: ContactDetails,
    /// Current lifecycle status.
    pub status: AppointmentStatus,
    /// External calendar event, present only while confirmed.
    pub google_event_id: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Timestamp of the last status change.
    pub updated_at: Option<DateTime<Utc>>,
    /// Reason given when the appointment was cancelled or rejected.
    pub cancellation_reason: Option<String>,
}

impl Appointment {
    /// Construct a new appointment with a freshly generated identifier.
    #[must_use]
    pub fn new(
        slot: SlotKey,
        appointment_date: DateTime<Utc>,
        contact: ContactDetails,
        status: AppointmentStatus,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            day: slot.day,
            time: slot.time,
            slot_date: slot.date,
            appointment_date,
            contact,
            status,
            google_event_id: None,
            created_at: Utc::now(),
            updated_at: None,
            cancellation_reason: None,
        }
    }

    /// Slot this appointment was reserved into.
    #[must_use]
    pub fn slot_key(&self) -> SlotKey {
        SlotKey {
            day: self.day,
            time: self.time,
            date: self.slot_date,
        }
    }

    /// End instant for an appointment of `duration_minutes`.
    #[must_use]
    pub fn end_time(&self, duration_minutes: u32) -> DateTime<Utc> {
        self.appointment_date + Duration::minutes(i64::from(duration_minutes))
    }

    /// Determine whether a lifecycle transition is permitted.
    #[must_use]
    pub fn can_transition_to(&self, next: AppointmentStatus) -> bool {
        matches!(
            (self.status, next),
            (AppointmentStatus::Pending, AppointmentStatus::Confirmed)
                | (
                    AppointmentStatus::Pending | AppointmentStatus::Confirmed,
                    AppointmentStatus::Cancelled
                )
        )
    }

    /// Whether the booking still occupies its holder's email address.
    #[must_use]
    pub fn is_live(&self) -> bool {
        self.status != AppointmentStatus::Cancelled
    }
}
