//! External calendar synchronisation for confirmed appointments.
//!
//! Provides the [`CalendarSync`] trait and two implementations:
//! [`GoogleCalendar`] when OAuth credentials are present and
//! [`DisabledCalendar`] otherwise. Every failure surfaces as
//! `AppError::Integration`; callers decide how to absorb it.

pub mod google;
pub mod oauth;

use async_trait::async_trait;

use crate::models::appointment::Appointment;
use crate::{AppError, Result};

pub use google::GoogleCalendar;
pub use oauth::OAuthClient;

/// Creates and deletes calendar events mirroring confirmed appointments.
#[async_trait]
pub trait CalendarSync: Send + Sync {
    /// Whether credentials for the external calendar are present.
    fn is_configured(&self) -> bool;

    /// Create an event for `appointment` and return its external id.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Integration` if the calendar is unavailable.
    async fn create_event(&self, appointment: &Appointment) -> Result<String>;

    /// Delete a previously created event.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Integration` if the calendar is unavailable.
    async fn delete_event(&self, event_id: &str) -> Result<()>;

    /// Live connectivity check returning the calendar's display name.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Integration` if the calendar cannot be reached.
    async fn probe(&self) -> Result<String>;
}

/// Stand-in used when no calendar credentials are configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledCalendar;

#[async_trait]
impl CalendarSync for DisabledCalendar {
    fn is_configured(&self) -> bool {
        false
    }

    async fn create_event(&self, _appointment: &Appointment) -> Result<String> {
        Err(not_configured())
    }

    async fn delete_event(&self, _event_id: &str) -> Result<()> {
        Err(not_configured())
    }

    async fn probe(&self) -> Result<String> {
        Err(not_configured())
    }
}

fn not_configured() -> AppError {
    AppError::Integration("calendar is not configured".into())
}
