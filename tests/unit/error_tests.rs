//! Error display and conversions.

use chrono::{TimeZone, Utc};
use event_booking::AppError;

#[test]
fn display_includes_category_prefix() {
    assert_eq!(
        AppError::SlotFull("friday 10:00".into()).to_string(),
        "slot full: friday 10:00"
    );
    assert_eq!(
        AppError::NotFound("appointment x".into()).to_string(),
        "not found: appointment x"
    );
    assert_eq!(
        AppError::validation("email", "must be a valid email address").to_string(),
        "validation: email: must be a valid email address"
    );
}

#[test]
fn rate_limited_names_reset_instant() {
    let reset_at = Utc
        .with_ymd_and_hms(2026, 6, 12, 9, 0, 0)
        .single()
        .expect("valid instant");
    let msg = AppError::RateLimited { reset_at }.to_string();
    assert!(msg.contains("2026-06-12T09:00:00"), "got: {msg}");
}

#[test]
fn toml_errors_become_config_errors() {
    let err: AppError = toml::from_str::<toml::Value>("a = ")
        .expect_err("malformed")
        .into();
    assert!(matches!(err, AppError::Config(_)));
}

#[test]
fn json_errors_become_db_errors() {
    let err: AppError = serde_json::from_str::<serde_json::Value>("{")
        .expect_err("malformed")
        .into();
    match err {
        AppError::Db(msg) => assert!(msg.starts_with("malformed record"), "got: {msg}"),
        other => panic!("expected Db, got {other:?}"),
    }
}

#[test]
fn validation_helper_sets_field() {
    match AppError::validation("phone", "too short") {
        AppError::Validation { field, message } => {
            assert_eq!(field, "phone");
            assert_eq!(message, "too short");
        }
        other => panic!("expected Validation, got {other:?}"),
    }
}
