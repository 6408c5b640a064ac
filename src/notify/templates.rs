//! Role and kind specific message templates.
//!
//! Every message shares one layout: a headline, an optional banner, an
//! intro paragraph, the appointment details and, for customers, the
//! self-service link. User supplied text is HTML-escaped.

use crate::config::GlobalConfig;
use crate::ics::{self, IcsDetails};
use crate::models::appointment::Appointment;

use super::{Attachment, EmailMessage, NotificationKind, Role};

/// Static event facts every template needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateContext {
    /// Event title.
    pub event_name: String,
    /// Venue, if known.
    pub event_location: Option<String>,
    /// Appointment length in minutes.
    pub duration_minutes: u32,
    /// Public origin for self-service links.
    pub public_base_url: String,
}

impl TemplateContext {
    /// Extract the template context from static configuration.
    #[must_use]
    pub fn from_config(config: &GlobalConfig) -> Self {
        Self {
            event_name: config.event_name.clone(),
            event_location: config.event_location.clone(),
            duration_minutes: config.calendar.duration_minutes,
            public_base_url: config.public_base_url.clone(),
        }
    }

    /// Self-service link for `appointment_id`.
    #[must_use]
    pub fn manage_url(&self, appointment_id: &str) -> String {
        format!(
            "{}/appointments/{appointment_id}",
            self.public_base_url.trim_end_matches('/')
        )
    }
}

struct TemplateCopy {
    subject: String,
    headline: &'static str,
    banner: Option<&'static str>,
    intro: String,
}

fn copy_for(
    role: Role,
    kind: NotificationKind,
    appointment: &Appointment,
    when: &str,
) -> TemplateCopy {
    let name = &appointment.contact.name;
    let reason = appointment
        .cancellation_reason
        .as_deref()
        .map(|reason| format!(" Reason: {reason}"))
        .unwrap_or_default();

    match (role, kind) {
        (Role::Customer, NotificationKind::Requested) => TemplateCopy {
            subject: format!("Booking request received for {when}"),
            headline: "We received your booking request",
            banner: None,
            intro: format!(
                "Thank you, {name}. Your request for {when} is pending; we will confirm it shortly."
            ),
        },
        (Role::Customer, NotificationKind::InstantBooked) => TemplateCopy {
            subject: format!("Your appointment on {when} is booked"),
            headline: "Your appointment is booked",
            banner: None,
            intro: format!("Thank you, {name}. Your appointment for {when} is confirmed."),
        },
        (Role::Customer, NotificationKind::Confirmed) => TemplateCopy {
            subject: format!("Your appointment on {when} is confirmed"),
            headline: "Your appointment is confirmed",
            banner: None,
            intro: format!("Good news, {name}. We confirmed your appointment for {when}."),
        },
        (Role::Customer, NotificationKind::Cancelled) => TemplateCopy {
            subject: format!("Your appointment on {when} was cancelled"),
            headline: "Your appointment was cancelled",
            banner: None,
            intro: format!("Hello {name}, your appointment for {when} has been cancelled.{reason}"),
        },
        (Role::Customer, NotificationKind::Rejected) => TemplateCopy {
            subject: format!("Your booking request for {when} could not be accepted"),
            headline: "Your booking request could not be accepted",
            banner: None,
            intro: format!(
                "Hello {name}, unfortunately we cannot accept your request for {when}.{reason}"
            ),
        },
        (Role::Customer, NotificationKind::Reminder) => TemplateCopy {
            subject: format!("Reminder: your appointment on {when}"),
            headline: "See you soon",
            banner: None,
            intro: format!("Hello {name}, this is a reminder of your appointment on {when}."),
        },
        (Role::Admin, NotificationKind::Requested) => TemplateCopy {
            subject: format!("New booking request: {name}, {when}"),
            headline: "New booking request",
            banner: Some("Action required: confirm or reject this request."),
            intro: format!("{name} requested an appointment for {when}."),
        },
        (Role::Admin, NotificationKind::InstantBooked) => TemplateCopy {
            subject: format!("New booking: {name}, {when}"),
            headline: "New booking",
            banner: None,
            intro: format!("{name} booked {when}. The booking was confirmed automatically."),
        },
        (Role::Admin, NotificationKind::Confirmed) => TemplateCopy {
            subject: format!("Booking confirmed: {name}, {when}"),
            headline: "Booking confirmed",
            banner: None,
            intro: format!("The appointment of {name} for {when} is confirmed."),
        },
        (Role::Admin, NotificationKind::Cancelled) => TemplateCopy {
            subject: format!("Booking cancelled: {name}, {when}"),
            headline: "Booking cancelled",
            banner: None,
            intro: format!("The appointment of {name} for {when} was cancelled.{reason}"),
        },
        (Role::Admin, NotificationKind::Rejected) => TemplateCopy {
            subject: format!("Booking rejected: {name}, {when}"),
            headline: "Booking rejected",
            banner: None,
            intro: format!("The request of {name} for {when} was rejected.{reason}"),
        },
        (Role::Admin, NotificationKind::Reminder) => TemplateCopy {
            subject: format!("Reminder sent: {name}, {when}"),
            headline: "Reminder sent",
            banner: None,
            intro: format!("{name} was reminded of the appointment on {when}."),
        },
    }
}

/// Human readable local date and time of an appointment.
#[must_use]
pub fn describe_when(appointment: &Appointment) -> String {
    format!(
        "{} at {}",
        appointment.slot_date.format("%A, %-d %B %Y"),
        appointment.time
    )
}

/// Render the message for `role` and `kind` addressed to `to`.
#[must_use]
pub fn render(
    role: Role,
    kind: NotificationKind,
    appointment: &Appointment,
    context: &TemplateContext,
    to: &str,
) -> EmailMessage {
    let when = describe_when(appointment);
    let copy = copy_for(role, kind, appointment, &when);
    let manage_url = context.manage_url(&appointment.id);
    let contact = &appointment.contact;

    let mut rows = vec![
        ("Event", context.event_name.clone()),
        ("When", when.clone()),
        ("Duration", format!("{} minutes", context.duration_minutes)),
        ("Name", contact.name.clone()),
        ("Status", appointment.status.as_str().to_owned()),
    ];
    if let Some(location) = &context.event_location {
        rows.push(("Location", location.clone()));
    }
    if role == Role::Admin {
        rows.push(("Email", contact.email.clone()));
        rows.push(("Phone", contact.phone.clone()));
        if let Some(company) = &contact.company {
            rows.push(("Company", company.clone()));
        }
        if let Some(message) = &contact.message {
            rows.push(("Message", message.clone()));
        }
    }

    let mut html = String::from(
        "<!DOCTYPE html><html><body style=\"font-family:sans-serif;color:#222\">",
    );
    html.push_str(&format!("<h2>{}</h2>", escape_html(copy.headline)));
    if let Some(banner) = copy.banner {
        html.push_str(&format!(
            "<p style=\"background:#fff3cd;border:1px solid #e0a800;padding:8px\"><strong>{}</strong></p>",
            escape_html(banner)
        ));
    }
    html.push_str(&format!("<p>{}</p><table>", escape_html(&copy.intro)));
    for (label, value) in &rows {
        html.push_str(&format!(
            "<tr><th align=\"left\">{}</th><td>{}</td></tr>",
            escape_html(label),
            escape_html(value)
        ));
    }
    html.push_str("</table>");

    let mut text = format!("{}\n\n", copy.headline);
    if let Some(banner) = copy.banner {
        text.push_str(&format!("** {banner} **\n\n"));
    }
    text.push_str(&format!("{}\n\n", copy.intro));
    for (label, value) in &rows {
        text.push_str(&format!("{label}: {value}\n"));
    }

    if role == Role::Customer {
        let escaped = escape_html(&manage_url);
        html.push_str(&format!(
            "<p><a href=\"{escaped}\">View or cancel your booking</a></p>"
        ));
        text.push_str(&format!("\nView or cancel your booking: {manage_url}\n"));
    }
    html.push_str("</body></html>");

    let mut attachments = Vec::new();
    if kind.attaches_calendar() {
        let details = IcsDetails {
            event_name: &context.event_name,
            location: context.event_location.as_deref(),
            duration_minutes: context.duration_minutes,
            manage_url: &manage_url,
        };
        attachments.push(Attachment {
            filename: "appointment.ics".into(),
            content_type: "text/calendar; charset=utf-8; method=PUBLISH".into(),
            content: ics::render(appointment, &details),
        });
    }

    EmailMessage {
        to: to.to_owned(),
        subject: format!("{}: {}", context.event_name, copy.subject),
        html,
        text,
        attachments,
    }
}

/// Escape text for inclusion in HTML element content or attributes.
#[must_use]
pub fn escape_html(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}
