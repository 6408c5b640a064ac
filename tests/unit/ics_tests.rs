//! Calendar file rendering.

use chrono::{NaiveDate, TimeZone, Utc};
use event_booking::ics::{render_at, IcsDetails};
use event_booking::models::appointment::{Appointment, AppointmentStatus, ContactDetails};
use event_booking::models::slot::{Day, SlotKey, SlotTime};

fn appointment(name: &str) -> Appointment {
    let slot = SlotKey {
        day: Day::Saturday,
        time: SlotTime::new(11, 30).expect("grid time"),
        date: NaiveDate::from_ymd_opt(2026, 6, 13).expect("date"),
    };
    // 11:30 local at UTC+2.
    let start = Utc
        .with_ymd_and_hms(2026, 6, 13, 9, 30, 0)
        .single()
        .expect("instant");
    Appointment::new(
        slot,
        start,
        ContactDetails {
            name: name.into(),
            company: None,
            phone: "+49 30 1234567".into(),
            email: "jo@example.com".into(),
            message: None,
        },
        AppointmentStatus::Confirmed,
    )
}

fn render(appointment: &Appointment, location: Option<&str>) -> String {
    let stamp = Utc
        .with_ymd_and_hms(2026, 6, 1, 8, 0, 0)
        .single()
        .expect("instant");
    render_at(
        appointment,
        &IcsDetails {
            event_name: "Harbour Fair",
            location,
            duration_minutes: 30,
            manage_url: "https://book.example.com/appointments/x",
        },
        stamp,
    )
}

#[test]
fn event_times_are_utc_and_match_duration() {
    let appt = appointment("Jo Weber");
    let ics = render(&appt, Some("Hall 3"));

    assert!(ics.contains("DTSTART:20260613T093000Z\r\n"), "{ics}");
    assert!(ics.contains("DTEND:20260613T100000Z\r\n"), "{ics}");
    assert!(ics.contains("DTSTAMP:20260601T080000Z\r\n"), "{ics}");
    assert!(ics.contains(&format!("UID:{}@event-booking\r\n", appt.id)));
    assert!(ics.contains("SUMMARY:Harbour Fair: Jo Weber\r\n"));
    assert!(ics.contains("LOCATION:Hall 3\r\n"));
}

#[test]
fn calendar_envelope_is_complete() {
    let ics = render(&appointment("Jo Weber"), None);
    assert!(ics.starts_with("BEGIN:VCALENDAR\r\nVERSION:2.0\r\n"));
    assert!(ics.ends_with("END:VEVENT\r\nEND:VCALENDAR\r\n"));
    assert!(!ics.contains("LOCATION:"));
    assert!(ics.split("\r\n").all(|line| !line.contains('\n')));
}

#[test]
fn text_values_are_escaped() {
    let ics = render(&appointment("Weber, Jo; Sales"), None);
    assert!(ics.contains("SUMMARY:Harbour Fair: Weber\\, Jo\\; Sales\r\n"), "{ics}");
    assert!(ics.contains("\\n"), "description newline escaped: {ics}");
}

#[test]
fn lines_never_exceed_75_octets() {
    let long_name = "Ünïcödé ".repeat(20);
    let ics = render(&appointment(long_name.trim()), None);
    for line in ics.split("\r\n") {
        assert!(line.len() <= 75, "line too long ({}): {line}", line.len());
    }
}
