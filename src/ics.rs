//! iCalendar (RFC 5545) file generation for a single appointment.
//!
//! The output is attached to confirmation emails and served from the
//! self-service download endpoint. Start and end are written in UTC from
//! the same instant and duration used for the external calendar event.

use chrono::{DateTime, Utc};

use crate::models::appointment::Appointment;

const MAX_LINE_OCTETS: usize = 75;

/// Event details that do not live on the appointment itself.
#[derive(Debug, Clone)]
pub struct IcsDetails<'a> {
    /// Event title prefix.
    pub event_name: &'a str,
    /// Venue, if known.
    pub location: Option<&'a str>,
    /// Appointment length in minutes.
    pub duration_minutes: u32,
    /// Self-service link written into the description.
    pub manage_url: &'a str,
}

/// Render a `VCALENDAR` containing one `VEVENT` for `appointment`.
#[must_use]
pub fn render(appointment: &Appointment, details: &IcsDetails<'_>) -> String {
    render_at(appointment, details, Utc::now())
}

/// Render with an explicit `DTSTAMP`.
#[must_use]
pub fn render_at(
    appointment: &Appointment,
    details: &IcsDetails<'_>,
    stamp: DateTime<Utc>,
) -> String {
    let summary = format!("{}: {}", details.event_name, appointment.contact.name);
    let description = format!(
        "Appointment for {} on {} at {}.\nManage your booking: {}",
        appointment.contact.name, appointment.day, appointment.time, details.manage_url
    );

    let mut lines = vec![
        "BEGIN:VCALENDAR".to_owned(),
        "VERSION:2.0".to_owned(),
        "PRODID:-//event-booking//appointments//EN".to_owned(),
        "CALSCALE:GREGORIAN".to_owned(),
        "METHOD:PUBLISH".to_owned(),
        "BEGIN:VEVENT".to_owned(),
        format!("UID:{}@event-booking", appointment.id),
        format!("DTSTAMP:{}", format_utc(stamp)),
        format!("DTSTART:{}", format_utc(appointment.appointment_date)),
        format!(
            "DTEND:{}",
            format_utc(appointment.end_time(details.duration_minutes))
        ),
        format!("SUMMARY:{}", escape_text(&summary)),
        format!("DESCRIPTION:{}", escape_text(&description)),
    ];
    if let Some(location) = details.location {
        lines.push(format!("LOCATION:{}", escape_text(location)));
    }
    lines.push("STATUS:CONFIRMED".to_owned());
    lines.push("END:VEVENT".to_owned());
    lines.push("END:VCALENDAR".to_owned());

    let mut out = String::new();
    for line in lines {
        out.push_str(&fold_line(&line));
        out.push_str("\r\n");
    }
    out
}

fn format_utc(instant: DateTime<Utc>) -> String {
    instant.format("%Y%m%dT%H%M%SZ").to_string()
}

/// Escape a TEXT property value.
#[must_use]
pub fn escape_text(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            ';' => out.push_str("\\;"),
            ',' => out.push_str("\\,"),
            '\n' => out.push_str("\\n"),
            '\r' => {}
            other => out.push(other),
        }
    }
    out
}

/// Fold a content line so no physical line exceeds 75 octets.
///
/// Continuation lines start with a single space, which counts toward
/// their length. Multi-byte characters are never split.
#[must_use]
pub fn fold_line(line: &str) -> String {
    if line.len() <= MAX_LINE_OCTETS {
        return line.to_owned();
    }

    let mut out = String::with_capacity(line.len() + line.len() / MAX_LINE_OCTETS * 3);
    let mut current = 0;
    for ch in line.chars() {
        let width = ch.len_utf8();
        if current + width > MAX_LINE_OCTETS {
            out.push_str("\r\n ");
            current = 1;
        }
        out.push(ch);
        current += width;
    }
    out
}
