//! Customer and staff email notifications.
//!
//! [`templates`] renders one message per recipient role and notification
//! kind, [`providers`] holds the interchangeable delivery backends, and
//! [`NotificationDispatcher`] ties them together with the audit trail.

pub mod dispatcher;
pub mod providers;
pub mod templates;

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::AppError;

pub use dispatcher::{DeliveryOutcome, NotificationDispatcher};
pub use providers::NotificationProvider;

/// Who a notification is addressed to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// The person who made the booking.
    Customer,
    /// Event staff.
    Admin,
}

impl Role {
    /// Lower-case label.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Customer => "customer",
            Self::Admin => "admin",
        }
    }
}

impl Display for Role {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "customer" => Ok(Self::Customer),
            "admin" => Ok(Self::Admin),
            other => Err(AppError::validation("role", format!("unknown role '{other}'"))),
        }
    }
}

/// Lifecycle event a notification reports.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    /// A pending booking was received.
    Requested,
    /// A booking was confirmed on creation.
    InstantBooked,
    /// Staff confirmed a pending booking.
    Confirmed,
    /// A booking was cancelled.
    Cancelled,
    /// Staff rejected a pending booking.
    Rejected,
    /// Reminder ahead of the appointment.
    Reminder,
}

impl NotificationKind {
    /// Every kind, in lifecycle order.
    pub const ALL: [NotificationKind; 6] = [
        Self::Requested,
        Self::InstantBooked,
        Self::Confirmed,
        Self::Cancelled,
        Self::Rejected,
        Self::Reminder,
    ];

    /// Snake-case label.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Requested => "requested",
            Self::InstantBooked => "instant_booked",
            Self::Confirmed => "confirmed",
            Self::Cancelled => "cancelled",
            Self::Rejected => "rejected",
            Self::Reminder => "reminder",
        }
    }

    /// Whether messages of this kind carry the calendar file.
    #[must_use]
    pub fn attaches_calendar(self) -> bool {
        matches!(self, Self::InstantBooked | Self::Confirmed)
    }
}

impl Display for NotificationKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NotificationKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| AppError::validation("kind", format!("unknown notification '{s}'")))
    }
}

/// File attached to an outgoing message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    /// File name shown to the recipient.
    pub filename: String,
    /// MIME type including parameters.
    pub content_type: String,
    /// Raw file content.
    pub content: String,
}

/// Fully rendered message ready for delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    /// Recipient address.
    pub to: String,
    /// Subject line, possibly non-ASCII.
    pub subject: String,
    /// HTML body.
    pub html: String,
    /// Plain text body.
    pub text: String,
    /// Attached files.
    pub attachments: Vec<Attachment>,
}
