//! Administrative settings singleton stored under the `settings` key.

use std::fmt::{Display, Formatter};

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use super::slot::Day;
use crate::validation::is_valid_email;
use crate::{AppError, Result};

/// How new bookings enter the lifecycle.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum BookingMode {
    /// New bookings wait for staff confirmation.
    #[default]
    Manual,
    /// New bookings are confirmed immediately.
    Automatic,
}

impl BookingMode {
    fn as_str(self) -> &'static str {
        match self {
            Self::Manual => "manual",
            Self::Automatic => "automatic",
        }
    }
}

/// Fixed-window limits for the public booking endpoint.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case", default)]
pub struct RateLimitSettings {
    /// Requests allowed per client within one window.
    pub max_requests: u32,
    /// Window length in seconds.
    pub window_seconds: u64,
}

impl Default for RateLimitSettings {
    fn default() -> Self {
        Self {
            max_requests: 5,
            window_seconds: 3600,
        }
    }
}

/// Concrete dates of the three event days, when already scheduled.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case", default)]
pub struct EventDates {
    /// Date of the Friday.
    pub friday: Option<NaiveDate>,
    /// Date of the Saturday.
    pub saturday: Option<NaiveDate>,
    /// Date of the Sunday.
    pub sunday: Option<NaiveDate>,
}

impl EventDates {
    /// Configured date for `day`, if any.
    #[must_use]
    pub fn for_day(&self, day: Day) -> Option<NaiveDate> {
        match day {
            Day::Friday => self.friday,
            Day::Saturday => self.saturday,
            Day::Sunday => self.sunday,
        }
    }
}

/// One field that differs between two settings snapshots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldChange {
    /// Dotted field path.
    pub field: &'static str,
    /// Previous value rendered as text.
    pub old: String,
    /// New value rendered as text.
    pub new: String,
}

impl Display for FieldChange {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {} \u{2192} {}", self.field, self.old, self.new)
    }
}

/// Process-wide booking policy, re-read at the start of every operation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case", default)]
pub struct Settings {
    /// Manual or automatic confirmation.
    pub booking_mode: BookingMode,
    /// Maximum appointment ids a single slot may hold.
    pub max_bookings_per_slot: u32,
    /// Reject a booking whose email already holds a live booking.
    pub prevent_duplicate_email: bool,
    /// Send staff copies of booking notifications.
    pub admin_notifications: bool,
    /// Staff address receiving notifications and template previews.
    pub admin_email: Option<String>,
    /// Public endpoint rate limit.
    pub rate_limit: RateLimitSettings,
    /// Year the event takes place.
    pub event_year: i32,
    /// Concrete event dates.
    pub event_dates: EventDates,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            booking_mode: BookingMode::Manual,
            max_bookings_per_slot: 1,
            prevent_duplicate_email: true,
            admin_notifications: false,
            admin_email: None,
            rate_limit: RateLimitSettings::default(),
            event_year: 2026,
            event_dates: EventDates::default(),
        }
    }
}

impl Settings {
    /// Whether new bookings skip the pending state.
    #[must_use]
    pub fn auto_confirm(&self) -> bool {
        self.booking_mode == BookingMode::Automatic
    }

    /// Admin recipient, present only when staff notifications are enabled.
    #[must_use]
    pub fn admin_recipient(&self) -> Option<&str> {
        if self.admin_notifications {
            self.admin_email.as_deref().filter(|email| !email.is_empty())
        } else {
            None
        }
    }

    /// Validate field bounds.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Validation` naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        if self.max_bookings_per_slot == 0 {
            return Err(AppError::validation(
                "max_bookings_per_slot",
                "must be at least 1",
            ));
        }

        match self.admin_email.as_deref() {
            Some(email) if !is_valid_email(email) => {
                return Err(AppError::validation(
                    "admin_email",
                    "must be a valid email address",
                ));
            }
            None if self.admin_notifications => {
                return Err(AppError::validation(
                    "admin_email",
                    "required while admin notifications are enabled",
                ));
            }
            _ => {}
        }

        if !(2020..=2100).contains(&self.event_year) {
            return Err(AppError::validation(
                "event_year",
                "must be between 2020 and 2100",
            ));
        }

        for day in Day::ALL {
            if let Some(date) = self.event_dates.for_day(day) {
                if date.year() != self.event_year {
                    return Err(AppError::validation(
                        format!("event_dates.{day}"),
                        "must fall within the event year",
                    ));
                }
                if date.weekday() != day.weekday() {
                    return Err(AppError::validation(
                        format!("event_dates.{day}"),
                        format!("{date} is not a {day}"),
                    ));
                }
            }
        }

        if !(1..=1000).contains(&self.rate_limit.max_requests) {
            return Err(AppError::validation(
                "rate_limit.max_requests",
                "must be between 1 and 1000",
            ));
        }

        if !(10..=86_400).contains(&self.rate_limit.window_seconds) {
            return Err(AppError::validation(
                "rate_limit.window_seconds",
                "must be between 10 and 86400",
            ));
        }

        Ok(())
    }

    /// Field-by-field differences from `self` to `next`.
    #[must_use]
    pub fn diff(&self, next: &Settings) -> Vec<FieldChange> {
        let mut changes = Vec::new();
        let mut push = |field: &'static str, old: String, new: String| {
            if old != new {
                changes.push(FieldChange { field, old, new });
            }
        };

        push(
            "booking_mode",
            self.booking_mode.as_str().into(),
            next.booking_mode.as_str().into(),
        );
        push(
            "max_bookings_per_slot",
            self.max_bookings_per_slot.to_string(),
            next.max_bookings_per_slot.to_string(),
        );
        push(
            "prevent_duplicate_email",
            self.prevent_duplicate_email.to_string(),
            next.prevent_duplicate_email.to_string(),
        );
        push(
            "admin_notifications",
            self.admin_notifications.to_string(),
            next.admin_notifications.to_string(),
        );
        push(
            "admin_email",
            render_opt(self.admin_email.as_ref()),
            render_opt(next.admin_email.as_ref()),
        );
        push(
            "rate_limit.max_requests",
            self.rate_limit.max_requests.to_string(),
            next.rate_limit.max_requests.to_string(),
        );
        push(
            "rate_limit.window_seconds",
            self.rate_limit.window_seconds.to_string(),
            next.rate_limit.window_seconds.to_string(),
        );
        push(
            "event_year",
            self.event_year.to_string(),
            next.event_year.to_string(),
        );
        for (field, day) in [
            ("event_dates.friday", Day::Friday),
            ("event_dates.saturday", Day::Saturday),
            ("event_dates.sunday", Day::Sunday),
        ] {
            push(
                field,
                render_opt(self.event_dates.for_day(day).as_ref()),
                render_opt(next.event_dates.for_day(day).as_ref()),
            );
        }

        changes
    }
}

fn render_opt<T: Display>(value: Option<&T>) -> String {
    value.map_or_else(|| "(none)".to_owned(), ToString::to_string)
}
