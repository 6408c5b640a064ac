//! Templates and the provider waterfall.

use std::str::FromStr;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{NaiveDate, TimeZone, Utc};
use event_booking::audit::{AuditEntry, AuditLogger};
use event_booking::config::GlobalConfig;
use event_booking::models::appointment::{Appointment, AppointmentStatus, ContactDetails};
use event_booking::models::settings::Settings;
use event_booking::models::slot::{Day, SlotKey, SlotTime};
use event_booking::notify::providers::gmail::build_mime;
use event_booking::notify::providers::{self, Mailbox, NotificationProvider};
use event_booking::notify::templates::{self, TemplateContext};
use event_booking::notify::{
    DeliveryOutcome, EmailMessage, NotificationDispatcher, NotificationKind, Role,
};
use event_booking::{AppError, Result};

fn context() -> TemplateContext {
    TemplateContext {
        event_name: "Harbour Fair".into(),
        event_location: Some("Hall 3".into()),
        duration_minutes: 30,
        public_base_url: "https://book.example.com".into(),
    }
}

fn appointment(status: AppointmentStatus) -> Appointment {
    let slot = SlotKey {
        day: Day::Friday,
        time: SlotTime::new(10, 0).expect("grid time"),
        date: NaiveDate::from_ymd_opt(2026, 6, 12).expect("date"),
    };
    let start = Utc
        .with_ymd_and_hms(2026, 6, 12, 8, 0, 0)
        .single()
        .expect("instant");
    Appointment::new(
        slot,
        start,
        ContactDetails {
            name: "Ana <b>Lopez</b>".into(),
            company: Some("Lopez & Co".into()),
            phone: "+34 600 123 456".into(),
            email: "ana@example.com".into(),
            message: Some("Interested in the booth".into()),
        },
        status,
    )
}

fn admin_settings() -> Settings {
    Settings {
        admin_notifications: true,
        admin_email: Some("staff@example.com".into()),
        ..Settings::default()
    }
}

/// Provider double recording every message it accepts.
struct RecordingProvider {
    name: &'static str,
    configured: bool,
    fail: bool,
    sent: Mutex<Vec<EmailMessage>>,
}

impl RecordingProvider {
    fn new(name: &'static str, configured: bool, fail: bool) -> Arc<Self> {
        Arc::new(Self {
            name,
            configured,
            fail,
            sent: Mutex::new(Vec::new()),
        })
    }

    fn sent(&self) -> Vec<EmailMessage> {
        self.sent.lock().expect("lock").clone()
    }
}

#[async_trait]
impl NotificationProvider for RecordingProvider {
    fn name(&self) -> &'static str {
        self.name
    }

    fn is_configured(&self) -> bool {
        self.configured
    }

    async fn send(&self, message: &EmailMessage) -> Result<()> {
        if self.fail {
            return Err(AppError::Integration(format!("{} returned 500", self.name)));
        }
        self.sent.lock().expect("lock").push(message.clone());
        Ok(())
    }
}

#[derive(Default)]
struct RecordingAudit {
    entries: Mutex<Vec<AuditEntry>>,
}

impl RecordingAudit {
    fn entries(&self) -> Vec<AuditEntry> {
        self.entries.lock().expect("lock").clone()
    }
}

#[async_trait]
impl AuditLogger for RecordingAudit {
    async fn record(&self, entry: AuditEntry) -> Result<()> {
        self.entries.lock().expect("lock").push(entry);
        Ok(())
    }
}

fn dispatcher(
    providers: Vec<Arc<dyn NotificationProvider>>,
) -> (NotificationDispatcher, Arc<RecordingAudit>) {
    let audit = Arc::new(RecordingAudit::default());
    (
        NotificationDispatcher::new(providers, audit.clone(), context()),
        audit,
    )
}

#[test]
fn role_and_kind_labels_parse_back() {
    for kind in NotificationKind::ALL {
        assert_eq!(NotificationKind::from_str(kind.as_str()).expect("kind"), kind);
    }
    assert_eq!(Role::from_str("admin").expect("role"), Role::Admin);
    assert!(NotificationKind::from_str("welcome").is_err());
}

#[test]
fn every_template_renders_with_event_prefix() {
    let appt = appointment(AppointmentStatus::Confirmed);
    for role in [Role::Customer, Role::Admin] {
        for kind in NotificationKind::ALL {
            let message = templates::render(role, kind, &appt, &context(), "to@example.com");
            assert!(message.subject.starts_with("Harbour Fair: "), "{}", message.subject);
            assert_eq!(message.to, "to@example.com");
            assert!(message.html.contains("Hall 3"));
            assert_eq!(
                message.attachments.len(),
                usize::from(kind.attaches_calendar()),
                "{role} {kind}"
            );
        }
    }
}

#[test]
fn customer_messages_link_to_self_service() {
    let appt = appointment(AppointmentStatus::Pending);
    let message = templates::render(
        Role::Customer,
        NotificationKind::Requested,
        &appt,
        &context(),
        "ana@example.com",
    );
    let link = format!("https://book.example.com/appointments/{}", appt.id);
    assert!(message.text.contains(&link));
    assert!(message.html.contains(&link));
    assert!(!message.text.contains("+34 600 123 456"), "no contact rows");
}

#[test]
fn admin_request_carries_action_banner_and_contact_rows() {
    let appt = appointment(AppointmentStatus::Pending);
    let message = templates::render(
        Role::Admin,
        NotificationKind::Requested,
        &appt,
        &context(),
        "staff@example.com",
    );
    assert!(message.text.contains("Action required"));
    assert!(message.text.contains("Phone: +34 600 123 456"));
    assert!(message.text.contains("Company: Lopez & Co"));
    assert!(!message.text.contains("/appointments/"), "no self-service link");
}

#[test]
fn html_escapes_user_text() {
    let appt = appointment(AppointmentStatus::Pending);
    let message = templates::render(
        Role::Admin,
        NotificationKind::Requested,
        &appt,
        &context(),
        "staff@example.com",
    );
    assert!(message.html.contains("Ana &lt;b&gt;Lopez&lt;/b&gt;"));
    assert!(message.html.contains("Lopez &amp; Co"));
    assert!(!message.html.contains("<b>Lopez</b>"));
}

#[test]
fn line_breaks_in_a_stored_name_cannot_add_mail_headers() {
    let mut appt = appointment(AppointmentStatus::Pending);
    appt.contact.name = "Eve\r\nBcc: victim@evil.example".into();
    let message = templates::render(
        Role::Admin,
        NotificationKind::Requested,
        &appt,
        &context(),
        "staff@example.com",
    );
    let from = Mailbox {
        address: "bookings@example.com".into(),
        name: "Harbour Fair".into(),
    };

    let raw = build_mime(&from, &message, "b1");
    let headers = raw.split("\r\n\r\n").next().expect("header block");
    let lines: Vec<&str> = headers.split("\r\n").collect();
    assert!(
        !lines.iter().any(|line| line.to_ascii_lowercase().starts_with("bcc:")),
        "{lines:?}"
    );
    let subject = lines
        .iter()
        .position(|line| line.starts_with("Subject: =?UTF-8?B?"))
        .expect("encoded subject");
    assert!(lines[subject + 1..]
        .iter()
        .take_while(|line| line.starts_with(' '))
        .all(|line| line.trim_start().starts_with("=?UTF-8?B?")));
}

#[test]
fn cancellation_reason_is_included() {
    let mut appt = appointment(AppointmentStatus::Cancelled);
    appt.cancellation_reason = Some("slot reassigned".into());
    let message = templates::render(
        Role::Customer,
        NotificationKind::Rejected,
        &appt,
        &context(),
        "ana@example.com",
    );
    assert!(message.text.contains("Reason: slot reassigned"));
}

#[test]
fn confirmation_attaches_calendar_file() {
    let appt = appointment(AppointmentStatus::Confirmed);
    let message = templates::render(
        Role::Customer,
        NotificationKind::Confirmed,
        &appt,
        &context(),
        "ana@example.com",
    );
    let attachment = message.attachments.first().expect("ics attached");
    assert_eq!(attachment.filename, "appointment.ics");
    assert!(attachment.content_type.starts_with("text/calendar"));
    assert!(attachment.content.contains("DTSTART:20260612T080000Z"));
}

#[tokio::test]
async fn first_configured_provider_wins() {
    let gmail = RecordingProvider::new("gmail", false, false);
    let resend = RecordingProvider::new("resend", true, false);
    let sendgrid = RecordingProvider::new("sendgrid", true, false);
    let (dispatcher, audit) = dispatcher(vec![
        gmail.clone() as Arc<dyn NotificationProvider>,
        resend.clone(),
        sendgrid.clone(),
    ]);
    assert_eq!(dispatcher.active_provider(), Some("resend"));

    let appt = appointment(AppointmentStatus::Pending);
    let outcome = dispatcher
        .notify(
            Role::Customer,
            NotificationKind::Requested,
            &appt,
            &Settings::default(),
        )
        .await;

    assert_eq!(
        outcome,
        DeliveryOutcome::Sent {
            provider: "resend".into()
        }
    );
    assert_eq!(resend.sent().len(), 1);
    assert!(gmail.sent().is_empty());
    assert!(sendgrid.sent().is_empty());

    let entries = audit.entries();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].action, "notification sent");
    assert_eq!(
        entries[0].details,
        "customer requested to ana@example.com via resend"
    );
    assert_eq!(entries[0].appointment_id.as_deref(), Some(appt.id.as_str()));
    assert_eq!(entries[0].actor.as_deref(), Some("system"));
}

#[tokio::test]
async fn failing_provider_does_not_fall_through() {
    let resend = RecordingProvider::new("resend", true, true);
    let sendgrid = RecordingProvider::new("sendgrid", true, false);
    let (dispatcher, audit) =
        dispatcher(vec![resend.clone() as Arc<dyn NotificationProvider>, sendgrid.clone()]);

    let outcome = dispatcher
        .notify(
            Role::Customer,
            NotificationKind::Confirmed,
            &appointment(AppointmentStatus::Confirmed),
            &Settings::default(),
        )
        .await;

    match outcome {
        DeliveryOutcome::Failed { provider, reason } => {
            assert_eq!(provider.as_deref(), Some("resend"));
            assert!(reason.contains("500"), "{reason}");
        }
        other => panic!("expected failure, got {other:?}"),
    }
    assert!(sendgrid.sent().is_empty());
    assert_eq!(audit.entries()[0].action, "notification failed");
}

#[tokio::test]
async fn no_configured_provider_is_a_failure() {
    let gmail: Arc<dyn NotificationProvider> = RecordingProvider::new("gmail", false, false);
    let (dispatcher, audit) = dispatcher(vec![gmail]);
    assert_eq!(dispatcher.active_provider(), None);

    let outcome = dispatcher
        .notify(
            Role::Customer,
            NotificationKind::Reminder,
            &appointment(AppointmentStatus::Confirmed),
            &Settings::default(),
        )
        .await;

    assert_eq!(
        outcome,
        DeliveryOutcome::Failed {
            provider: None,
            reason: "no email provider configured".into()
        }
    );
    assert!(audit.entries()[0].details.contains("via none"));
}

#[tokio::test]
async fn admin_notification_is_skipped_without_recipient() {
    let resend = RecordingProvider::new("resend", true, false);
    let (dispatcher, audit) = dispatcher(vec![resend.clone() as Arc<dyn NotificationProvider>]);
    let appt = appointment(AppointmentStatus::Pending);

    let skipped = dispatcher
        .notify(
            Role::Admin,
            NotificationKind::Requested,
            &appt,
            &Settings::default(),
        )
        .await;
    assert!(matches!(skipped, DeliveryOutcome::Skipped { .. }));
    assert!(audit.entries().is_empty());

    let sent = dispatcher
        .notify(Role::Admin, NotificationKind::Requested, &appt, &admin_settings())
        .await;
    assert!(sent.is_sent());
    assert_eq!(resend.sent()[0].to, "staff@example.com");
}

#[tokio::test]
async fn preview_marks_subject_and_goes_to_admin() {
    let resend = RecordingProvider::new("resend", true, false);
    let (dispatcher, audit) = dispatcher(vec![resend.clone() as Arc<dyn NotificationProvider>]);

    let outcome = dispatcher
        .preview(
            Role::Customer,
            NotificationKind::Confirmed,
            &appointment(AppointmentStatus::Confirmed),
            "staff@example.com",
        )
        .await;

    assert!(outcome.is_sent());
    let message = &resend.sent()[0];
    assert_eq!(message.to, "staff@example.com");
    assert!(message.subject.starts_with("[Preview] Harbour Fair: "));
    let entry = &audit.entries()[0];
    assert!(entry.details.starts_with("preview customer confirmed"));
    assert!(entry.appointment_id.is_none());
}

#[test]
fn waterfall_order_and_configuration() {
    let mut config = GlobalConfig::from_toml_str(
        "public_base_url = \"https://book.example.com\"\n[email]\nfrom_address = \"b@example.com\"\n",
    )
    .expect("config parses");
    let http = reqwest::Client::new();

    let names: Vec<&str> = providers::waterfall(&config, &http)
        .iter()
        .map(|provider| provider.name())
        .collect();
    assert_eq!(names, vec!["gmail", "resend", "sendgrid", "brevo"]);
    assert!(providers::waterfall(&config, &http)
        .iter()
        .all(|provider| !provider.is_configured()));

    config.credentials.brevo_api_key = Some("xkeysib-test".into());
    let configured: Vec<&str> = providers::waterfall(&config, &http)
        .iter()
        .filter(|provider| provider.is_configured())
        .map(|provider| provider.name())
        .collect();
    assert_eq!(configured, vec!["brevo"]);
}
