//! Booking request validation and appointment date resolution.

use chrono::{DateTime, Datelike, Duration, FixedOffset, NaiveDate, Utc};
use serde::Deserialize;

use crate::models::appointment::ContactDetails;
use crate::models::settings::Settings;
use crate::models::slot::{Day, SlotKey, SlotTime};
use crate::validation::{
    char_len, contains_control, contains_script, is_valid_email, is_valid_phone,
};
use crate::{AppError, Result};

const NAME_MIN: usize = 2;
const NAME_MAX: usize = 100;
const COMPANY_MAX: usize = 100;
const MESSAGE_MAX: usize = 1000;

/// Raw booking form as submitted by a visitor.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct BookingRequest {
    /// Event day tag.
    #[serde(default)]
    pub day: String,
    /// Start time, `HH:MM`.
    #[serde(default)]
    pub time: String,
    /// Full name.
    #[serde(default)]
    pub name: String,
    /// Optional company.
    #[serde(default)]
    pub company: Option<String>,
    /// Phone number.
    #[serde(default)]
    pub phone: String,
    /// Email address.
    #[serde(default)]
    pub email: String,
    /// Optional message.
    #[serde(default)]
    pub message: Option<String>,
}

/// A booking request that passed field validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidBooking {
    /// Requested day.
    pub day: Day,
    /// Requested start time.
    pub time: SlotTime,
    /// Trimmed contact details.
    pub contact: ContactDetails,
}

impl BookingRequest {
    /// Validate every field, reporting the first offending one.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Validation` naming the offending field.
    pub fn validate(&self) -> Result<ValidBooking> {
        let day: Day = required("day", &self.day)?.parse()?;
        let time: SlotTime = required("time", &self.time)?.parse()?;

        let name = single_line("name", &self.name)?;
        let name_len = char_len(name);
        if !(NAME_MIN..=NAME_MAX).contains(&name_len) {
            return Err(AppError::validation(
                "name",
                format!("must be between {NAME_MIN} and {NAME_MAX} characters"),
            ));
        }
        if contains_script(name) {
            return Err(AppError::validation("name", "contains disallowed content"));
        }

        let phone = single_line("phone", &self.phone)?;
        if !is_valid_phone(phone) {
            return Err(AppError::validation(
                "phone",
                "must be 7 to 20 digits or separators",
            ));
        }

        let email = single_line("email", &self.email)?;
        if !is_valid_email(email) {
            return Err(AppError::validation("email", "must be a valid email address"));
        }

        if self.company.as_deref().is_some_and(contains_control) {
            return Err(AppError::validation("company", "must not contain control characters"));
        }
        let company = optional("company", self.company.as_deref(), COMPANY_MAX)?;
        let message = optional("message", self.message.as_deref(), MESSAGE_MAX)?;

        Ok(ValidBooking {
            day,
            time,
            contact: ContactDetails {
                name: name.to_owned(),
                company,
                phone: phone.to_owned(),
                email: email.to_owned(),
                message,
            },
        })
    }
}

fn required<'a>(field: &str, value: &'a str) -> Result<&'a str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::validation(field, "is required"));
    }
    Ok(trimmed)
}

/// Fields that end up in mail headers or calendar summaries stay on one line.
fn single_line<'a>(field: &str, value: &'a str) -> Result<&'a str> {
    let trimmed = required(field, value)?;
    if contains_control(trimmed) {
        return Err(AppError::validation(field, "must not contain control characters"));
    }
    Ok(trimmed)
}

fn optional(field: &str, value: Option<&str>, max: usize) -> Result<Option<String>> {
    let Some(trimmed) = value.map(str::trim).filter(|value| !value.is_empty()) else {
        return Ok(None);
    };
    if char_len(trimmed) > max {
        return Err(AppError::validation(
            field,
            format!("must be at most {max} characters"),
        ));
    }
    if contains_script(trimmed) {
        return Err(AppError::validation(field, "contains disallowed content"));
    }
    Ok(Some(trimmed.to_owned()))
}

/// Resolve the calendar date and absolute start of a booking.
///
/// Uses the configured event date for `day` when one is set. Otherwise
/// picks the next occurrence of the weekday in the event's local offset;
/// today qualifies while the start time is still ahead.
#[must_use]
pub fn resolve_slot(
    day: Day,
    time: SlotTime,
    settings: &Settings,
    offset: FixedOffset,
    now: DateTime<Utc>,
) -> (SlotKey, DateTime<Utc>) {
    let local_now = now.with_timezone(&offset);
    let date = settings.event_dates.for_day(day).unwrap_or_else(|| {
        next_occurrence(day, time, local_now.date_naive(), local_now.time())
    });

    let local_start = date.and_time(time.naive_time());
    let start = local_start
        .and_local_timezone(offset)
        .single()
        .map_or_else(|| local_start.and_utc(), |instant| instant.with_timezone(&Utc));

    (SlotKey { day, time, date }, start)
}

fn next_occurrence(
    day: Day,
    time: SlotTime,
    today: NaiveDate,
    now_time: chrono::NaiveTime,
) -> NaiveDate {
    let target = day.weekday().num_days_from_monday();
    let current = today.weekday().num_days_from_monday();
    let mut ahead = (target + 7 - current) % 7;
    if ahead == 0 && now_time >= time.naive_time() {
        ahead = 7;
    }
    today + Duration::days(i64::from(ahead))
}
