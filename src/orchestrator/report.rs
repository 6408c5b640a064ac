//! Outcome types returned by lifecycle operations.

use serde::Serialize;

use crate::models::appointment::Appointment;
use crate::models::settings::BookingMode;
use crate::notify::{DeliveryOutcome, NotificationKind, Role};

/// What happened on the external calendar during a transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum CalendarOutcome {
    /// The transition has no calendar side effect.
    NotAttempted,
    /// The calendar is not configured.
    NotConfigured,
    /// An event was created.
    Created {
        /// External event id.
        event_id: String,
    },
    /// An event was removed.
    Deleted {
        /// External event id.
        event_id: String,
    },
    /// The calendar call failed; the transition still completed.
    Failed {
        /// Integration error message.
        error: String,
    },
}

/// One notification sent as part of a transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NotificationReport {
    /// Recipient role.
    pub role: Role,
    /// Template kind.
    pub kind: NotificationKind,
    /// Delivery result.
    pub delivery: DeliveryOutcome,
}

/// Result of a lifecycle transition.
///
/// The appointment snapshot is authoritative; calendar and notification
/// failures are reported here instead of failing the transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransitionReport {
    /// Appointment state after the transition.
    pub appointment: Appointment,
    /// Calendar side effect.
    pub calendar: CalendarOutcome,
    /// Notifications attempted or skipped, in send order.
    pub notifications: Vec<NotificationReport>,
}

impl TransitionReport {
    pub(crate) fn new(appointment: Appointment, calendar: CalendarOutcome) -> Self {
        Self {
            appointment,
            calendar,
            notifications: Vec::new(),
        }
    }

    /// Integration errors raised during the transition, for display.
    #[must_use]
    pub fn integration_errors(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if let CalendarOutcome::Failed { error } = &self.calendar {
            errors.push(format!("calendar: {error}"));
        }
        for report in &self.notifications {
            if let DeliveryOutcome::Failed { reason, .. } = &report.delivery {
                errors.push(format!("{} {} notification: {reason}", report.role, report.kind));
            }
        }
        errors
    }
}

/// Which integrations are fully configured.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthReport {
    /// Calendar credentials present.
    pub calendar_configured: bool,
    /// Provider the notification waterfall would use.
    pub email_provider: Option<&'static str>,
    /// Staff notifications enabled with an address set.
    pub admin_notifications: bool,
    /// Current booking mode.
    pub booking_mode: BookingMode,
    /// The store answered a read.
    pub store_reachable: bool,
}

/// Result of a live calendar connectivity check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CalendarProbe {
    /// Whether the calendar answered.
    pub ok: bool,
    /// Calendar display name on success.
    pub calendar: Option<String>,
    /// Error message on failure.
    pub error: Option<String>,
}
