//! Credential loading from environment variables.
//!
//! The keychain service `event-booking` is absent on test machines, so
//! every lookup falls through to the environment.
//!
//! NOTE: These tests mutate process-global env vars and must run serially.

use event_booking::config::GlobalConfig;

const VARS: [&str; 7] = [
    "GOOGLE_CLIENT_ID",
    "GOOGLE_CLIENT_SECRET",
    "GOOGLE_REFRESH_TOKEN",
    "RESEND_API_KEY",
    "SENDGRID_API_KEY",
    "BREVO_API_KEY",
    "BOOKING_ADMIN_TOKEN",
];

fn make_config(from_address: &str) -> GlobalConfig {
    let toml = format!(
        r#"
public_base_url = "https://book.example.com"

[email]
from_address = "{from_address}"
"#
    );
    GlobalConfig::from_toml_str(&toml).expect("config parses")
}

#[allow(unsafe_code)]
fn clear_env() {
    for var in VARS {
        unsafe {
            std::env::remove_var(var);
        }
    }
}

#[allow(unsafe_code)]
fn set_env(pairs: &[(&str, &str)]) {
    for (key, value) in pairs {
        unsafe {
            std::env::set_var(key, value);
        }
    }
}

#[tokio::test]
#[serial_test::serial]
async fn admin_token_alone_is_enough() {
    clear_env();
    set_env(&[("BOOKING_ADMIN_TOKEN", "admin-secret")]);
    let mut config = make_config("");

    config
        .load_credentials()
        .await
        .expect("admin token suffices");

    assert_eq!(config.credentials.admin_token, "admin-secret");
    assert!(config.credentials.oauth().is_none());
    assert!(config.credentials.resend_api_key.is_none());
    clear_env();
}

#[tokio::test]
#[serial_test::serial]
async fn missing_admin_token_names_env_var() {
    clear_env();
    let mut config = make_config("");

    let err = config
        .load_credentials()
        .await
        .expect_err("admin token is mandatory");

    let msg = err.to_string();
    assert!(msg.contains("BOOKING_ADMIN_TOKEN"), "got: {msg}");
    assert!(msg.contains("keychain"), "got: {msg}");
}

#[tokio::test]
#[serial_test::serial]
async fn empty_env_var_is_treated_as_absent() {
    clear_env();
    set_env(&[("BOOKING_ADMIN_TOKEN", "   ")]);
    let mut config = make_config("");

    assert!(config.load_credentials().await.is_err());
    clear_env();
}

#[tokio::test]
#[serial_test::serial]
async fn oauth_requires_all_three_parts() {
    clear_env();
    set_env(&[
        ("BOOKING_ADMIN_TOKEN", "admin-secret"),
        ("GOOGLE_CLIENT_ID", "client"),
        ("GOOGLE_CLIENT_SECRET", "secret"),
    ]);
    let mut config = make_config("bookings@example.com");

    config.load_credentials().await.expect("loads");
    assert!(config.credentials.oauth().is_none());

    set_env(&[("GOOGLE_REFRESH_TOKEN", "refresh")]);
    config.load_credentials().await.expect("loads");
    let oauth = config.credentials.oauth().expect("complete oauth");
    assert_eq!(oauth.client_id, "client");
    assert_eq!(oauth.refresh_token, "refresh");
    clear_env();
}

#[tokio::test]
#[serial_test::serial]
async fn mail_provider_requires_sender_address() {
    clear_env();
    set_env(&[
        ("BOOKING_ADMIN_TOKEN", "admin-secret"),
        ("RESEND_API_KEY", "re_test"),
    ]);
    let mut config = make_config("");

    let err = config
        .load_credentials()
        .await
        .expect_err("sender address required");
    assert!(err.to_string().contains("from_address"), "got: {err}");

    let mut config = make_config("bookings@example.com");
    config.load_credentials().await.expect("loads with sender");
    assert_eq!(config.credentials.resend_api_key.as_deref(), Some("re_test"));
    clear_env();
}

#[tokio::test]
#[serial_test::serial]
async fn debug_output_redacts_secrets() {
    clear_env();
    set_env(&[
        ("BOOKING_ADMIN_TOKEN", "admin-secret"),
        ("SENDGRID_API_KEY", "SG.very-secret"),
    ]);
    let mut config = make_config("bookings@example.com");
    config.load_credentials().await.expect("loads");

    let rendered = format!("{:?}", config.credentials);
    assert!(!rendered.contains("admin-secret"), "got: {rendered}");
    assert!(!rendered.contains("SG.very-secret"), "got: {rendered}");
    assert!(rendered.contains("sendgrid: true"), "got: {rendered}");
    clear_env();
}
