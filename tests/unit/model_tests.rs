//! Slot grid, appointment lifecycle and settings rules.

use chrono::{NaiveDate, TimeZone, Utc};
use event_booking::models::appointment::{Appointment, AppointmentStatus, ContactDetails};
use event_booking::models::settings::{BookingMode, Settings};
use event_booking::models::slot::{Day, SlotKey, SlotTime};
use event_booking::AppError;

fn contact() -> ContactDetails {
    ContactDetails {
        name: "Ana Lopez".into(),
        company: None,
        phone: "+34 600 123 456".into(),
        email: "ana@example.com".into(),
        message: None,
    }
}

fn appointment(status: AppointmentStatus) -> Appointment {
    let slot = SlotKey {
        day: Day::Friday,
        time: SlotTime::new(10, 0).expect("grid time"),
        date: NaiveDate::from_ymd_opt(2026, 6, 12).expect("date"),
    };
    let start = Utc
        .with_ymd_and_hms(2026, 6, 12, 10, 0, 0)
        .single()
        .expect("instant");
    Appointment::new(slot, start, contact(), status)
}

fn field_of(result: Result<(), AppError>) -> String {
    match result {
        Err(AppError::Validation { field, .. }) => field,
        other => panic!("expected validation error, got {other:?}"),
    }
}

#[test]
fn grid_runs_from_ten_to_half_past_five() {
    let grid = SlotTime::grid();
    assert_eq!(grid.len(), 16);
    assert_eq!(grid.first().map(ToString::to_string).as_deref(), Some("10:00"));
    assert_eq!(grid.last().map(ToString::to_string).as_deref(), Some("17:30"));
    assert_eq!(grid[0], SlotTime::FIRST);
}

#[test]
fn off_grid_times_are_rejected() {
    assert!("09:30".parse::<SlotTime>().is_err());
    assert!("18:00".parse::<SlotTime>().is_err());
    assert!("10:15".parse::<SlotTime>().is_err());
    assert!("10:0".parse::<SlotTime>().is_err());
    assert!("ten".parse::<SlotTime>().is_err());
    assert_eq!(
        "17:30".parse::<SlotTime>().expect("last slot").to_string(),
        "17:30"
    );
}

#[test]
fn slot_time_serializes_as_text() {
    let time: SlotTime = serde_json::from_str("\"11:30\"").expect("deserializes");
    assert_eq!(serde_json::to_string(&time).expect("serializes"), "\"11:30\"");
    assert!(serde_json::from_str::<SlotTime>("\"11:45\"").is_err());
}

#[test]
fn days_parse_case_insensitively() {
    assert_eq!("Saturday".parse::<Day>().expect("day"), Day::Saturday);
    assert_eq!(" sunday ".parse::<Day>().expect("day"), Day::Sunday);
    assert!("monday".parse::<Day>().is_err());
}

#[test]
fn slot_key_store_format() {
    let key = SlotKey {
        day: Day::Saturday,
        time: SlotTime::new(11, 30).expect("grid time"),
        date: NaiveDate::from_ymd_opt(2026, 6, 13).expect("date"),
    };
    assert_eq!(key.store_key(), "slot:saturday:11:30:2026-06-13");
}

#[test]
fn lifecycle_transitions() {
    let pending = appointment(AppointmentStatus::Pending);
    assert!(pending.can_transition_to(AppointmentStatus::Confirmed));
    assert!(pending.can_transition_to(AppointmentStatus::Cancelled));
    assert!(!pending.can_transition_to(AppointmentStatus::Pending));

    let confirmed = appointment(AppointmentStatus::Confirmed);
    assert!(!confirmed.can_transition_to(AppointmentStatus::Confirmed));
    assert!(confirmed.can_transition_to(AppointmentStatus::Cancelled));

    let cancelled = appointment(AppointmentStatus::Cancelled);
    assert!(!cancelled.can_transition_to(AppointmentStatus::Confirmed));
    assert!(!cancelled.can_transition_to(AppointmentStatus::Cancelled));
    assert!(!cancelled.is_live());
}

#[test]
fn end_time_adds_duration() {
    let appt = appointment(AppointmentStatus::Pending);
    assert_eq!(
        appt.end_time(30),
        Utc.with_ymd_and_hms(2026, 6, 12, 10, 30, 0)
            .single()
            .expect("instant")
    );
}

#[test]
fn appointment_serializes_contact_inline() {
    let appt = appointment(AppointmentStatus::Pending);
    let value = serde_json::to_value(&appt).expect("serializes");
    assert_eq!(value["email"], "ana@example.com");
    assert_eq!(value["status"], "pending");
    assert_eq!(value["day"], "friday");
    assert_eq!(value["time"], "10:00");

    let back: Appointment = serde_json::from_value(value).expect("deserializes");
    assert_eq!(back, appt);
}

#[test]
fn default_settings_are_valid() {
    let settings = Settings::default();
    settings.validate().expect("defaults validate");
    assert!(!settings.auto_confirm());
    assert!(settings.admin_recipient().is_none());
}

#[test]
fn admin_recipient_requires_flag_and_address() {
    let mut settings = Settings {
        admin_email: Some("staff@example.com".into()),
        ..Settings::default()
    };
    assert!(settings.admin_recipient().is_none());
    settings.admin_notifications = true;
    assert_eq!(settings.admin_recipient(), Some("staff@example.com"));
}

#[test]
fn settings_validation_names_field() {
    let zero_capacity = Settings {
        max_bookings_per_slot: 0,
        ..Settings::default()
    };
    assert_eq!(field_of(zero_capacity.validate()), "max_bookings_per_slot");

    let notify_without_address = Settings {
        admin_notifications: true,
        ..Settings::default()
    };
    assert_eq!(field_of(notify_without_address.validate()), "admin_email");

    let bad_address = Settings {
        admin_email: Some("not-an-address".into()),
        ..Settings::default()
    };
    assert_eq!(field_of(bad_address.validate()), "admin_email");

    let mut wrong_weekday = Settings::default();
    // 2026-06-11 is a Thursday.
    wrong_weekday.event_dates.friday = NaiveDate::from_ymd_opt(2026, 6, 11);
    assert_eq!(field_of(wrong_weekday.validate()), "event_dates.friday");

    let mut wrong_year = Settings::default();
    wrong_year.event_dates.saturday = NaiveDate::from_ymd_opt(2027, 6, 12);
    assert_eq!(field_of(wrong_year.validate()), "event_dates.saturday");

    let mut tiny_window = Settings::default();
    tiny_window.rate_limit.window_seconds = 5;
    assert_eq!(field_of(tiny_window.validate()), "rate_limit.window_seconds");
}

#[test]
fn settings_diff_lists_changed_fields() {
    let current = Settings::default();
    let mut next = current.clone();
    next.booking_mode = BookingMode::Automatic;
    next.max_bookings_per_slot = 2;
    next.event_dates.friday = NaiveDate::from_ymd_opt(2026, 6, 12);

    let changes: Vec<String> = current.diff(&next).iter().map(ToString::to_string).collect();
    assert_eq!(
        changes,
        vec![
            "booking_mode: manual \u{2192} automatic",
            "max_bookings_per_slot: 1 \u{2192} 2",
            "event_dates.friday: (none) \u{2192} 2026-06-12",
        ]
    );
    assert!(current.diff(&current).is_empty());
}

#[test]
fn settings_deserialize_with_partial_fields() {
    let settings: Settings =
        serde_json::from_str(r#"{"booking_mode":"automatic"}"#).expect("partial settings");
    assert!(settings.auto_confirm());
    assert_eq!(settings.max_bookings_per_slot, 1);
    assert_eq!(settings.rate_limit.max_requests, 5);
}
