//! Global configuration parsing, validation, and credential loading.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{FixedOffset, Offset, Utc};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::models::settings::Settings;
use crate::{AppError, Result};

/// Keychain service name under which credentials are stored.
const KEYRING_SERVICE: &str = "event-booking";

/// Google Calendar connectivity settings.
///
/// OAuth credentials are loaded at runtime via OS keychain or environment
/// variables, never from the TOML config file.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct CalendarConfig {
    /// Calendar identifier events are written to.
    #[serde(default = "default_calendar_id")]
    pub calendar_id: String,
    /// Length of one appointment in minutes.
    #[serde(default = "default_duration_minutes")]
    pub duration_minutes: u32,
    /// Base URL of the calendar REST API.
    #[serde(default = "default_calendar_api_base")]
    pub api_base: String,
    /// OAuth 2 token endpoint used for the refresh-token grant.
    #[serde(default = "default_token_url")]
    pub token_url: String,
}

impl Default for CalendarConfig {
    fn default() -> Self {
        Self {
            calendar_id: default_calendar_id(),
            duration_minutes: default_duration_minutes(),
            api_base: default_calendar_api_base(),
            token_url: default_token_url(),
        }
    }
}

fn default_calendar_id() -> String {
    "primary".into()
}

fn default_duration_minutes() -> u32 {
    30
}

fn default_calendar_api_base() -> String {
    "https://www.googleapis.com/calendar/v3".into()
}

fn default_token_url() -> String {
    "https://oauth2.googleapis.com/token".into()
}

/// Outbound email settings shared by every provider.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct EmailConfig {
    /// Sender address used on every outgoing message.
    #[serde(default)]
    pub from_address: String,
    /// Display name attached to the sender address.
    #[serde(default = "default_from_name")]
    pub from_name: String,
    /// Gmail REST API base URL.
    #[serde(default = "default_gmail_api_base")]
    pub gmail_api_base: String,
    /// Resend REST API base URL.
    #[serde(default = "default_resend_api_base")]
    pub resend_api_base: String,
    /// `SendGrid` REST API base URL.
    #[serde(default = "default_sendgrid_api_base")]
    pub sendgrid_api_base: String,
    /// Brevo REST API base URL.
    #[serde(default = "default_brevo_api_base")]
    pub brevo_api_base: String,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            from_address: String::new(),
            from_name: default_from_name(),
            gmail_api_base: default_gmail_api_base(),
            resend_api_base: default_resend_api_base(),
            sendgrid_api_base: default_sendgrid_api_base(),
            brevo_api_base: default_brevo_api_base(),
        }
    }
}

fn default_from_name() -> String {
    "Event Bookings".into()
}

fn default_gmail_api_base() -> String {
    "https://gmail.googleapis.com/gmail/v1".into()
}

fn default_resend_api_base() -> String {
    "https://api.resend.com".into()
}

fn default_sendgrid_api_base() -> String {
    "https://api.sendgrid.com/v3".into()
}

fn default_brevo_api_base() -> String {
    "https://api.brevo.com/v3".into()
}

/// Audit trail retention and listing limits.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct AuditConfig {
    /// Days an audit entry (and the index) is kept before expiring.
    #[serde(default = "default_audit_retention_days")]
    pub retention_days: u32,
    /// Maximum number of entries returned by a listing.
    #[serde(default = "default_audit_list_limit")]
    pub list_limit: usize,
    /// Most ids kept in the audit index; older entries are dropped on write.
    #[serde(default = "default_audit_max_entries")]
    pub max_entries: usize,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            retention_days: default_audit_retention_days(),
            list_limit: default_audit_list_limit(),
            max_entries: default_audit_max_entries(),
        }
    }
}

fn default_audit_retention_days() -> u32 {
    400
}

fn default_audit_list_limit() -> usize {
    500
}

fn default_audit_max_entries() -> usize {
    5000
}

fn default_http_port() -> u16 {
    8080
}

fn default_bind_address() -> String {
    "127.0.0.1".into()
}

fn default_db_path() -> PathBuf {
    PathBuf::from("data").join("booking.db")
}

fn default_record_retention_days() -> u32 {
    365
}

fn default_event_name() -> String {
    "Event appointment".into()
}

/// OAuth 2 client credentials plus a long-lived refresh token.
#[derive(Clone, PartialEq, Eq)]
pub struct OAuthCredentials {
    /// OAuth client identifier.
    pub client_id: String,
    /// OAuth client secret.
    pub client_secret: String,
    /// Offline refresh token granted to the service account owner.
    pub refresh_token: String,
}

impl std::fmt::Debug for OAuthCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuthCredentials")
            .field("client_id", &self.client_id)
            .finish_non_exhaustive()
    }
}

/// Secrets resolved at start-up from keychain or environment.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    /// Google OAuth client identifier.
    pub google_client_id: Option<String>,
    /// Google OAuth client secret.
    pub google_client_secret: Option<String>,
    /// Google OAuth refresh token.
    pub google_refresh_token: Option<String>,
    /// Resend API key.
    pub resend_api_key: Option<String>,
    /// `SendGrid` API key.
    pub sendgrid_api_key: Option<String>,
    /// Brevo API key.
    pub brevo_api_key: Option<String>,
    /// Bearer token required on every administrative request.
    pub admin_token: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("google_oauth", &self.oauth().is_some())
            .field("resend", &self.resend_api_key.is_some())
            .field("sendgrid", &self.sendgrid_api_key.is_some())
            .field("brevo", &self.brevo_api_key.is_some())
            .finish_non_exhaustive()
    }
}

impl Credentials {
    /// OAuth credentials, present only when all three parts are set.
    #[must_use]
    pub fn oauth(&self) -> Option<OAuthCredentials> {
        match (
            &self.google_client_id,
            &self.google_client_secret,
            &self.google_refresh_token,
        ) {
            (Some(client_id), Some(client_secret), Some(refresh_token)) => Some(OAuthCredentials {
                client_id: client_id.clone(),
                client_secret: client_secret.clone(),
                refresh_token: refresh_token.clone(),
            }),
            _ => None,
        }
    }

    fn any_mail_provider(&self) -> bool {
        self.oauth().is_some()
            || self.resend_api_key.is_some()
            || self.sendgrid_api_key.is_some()
            || self.brevo_api_key.is_some()
    }
}

/// Global configuration parsed from `config.toml`.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct GlobalConfig {
    /// HTTP port for the booking API.
    #[serde(default = "default_http_port")]
    pub http_port: u16,
    /// Interface address the HTTP server binds to.
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    /// `SQLite` database file backing the key/value store.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,
    /// Public origin used to build self-service links.
    pub public_base_url: String,
    /// Offset of the event's local time from UTC, in minutes.
    #[serde(default)]
    pub utc_offset_minutes: i32,
    /// Event title used in calendar entries and email subjects.
    #[serde(default = "default_event_name")]
    pub event_name: String,
    /// Venue written into calendar entries.
    #[serde(default)]
    pub event_location: Option<String>,
    /// Days an appointment record is retained in the store.
    #[serde(default = "default_record_retention_days")]
    pub record_retention_days: u32,
    /// External calendar settings.
    #[serde(default)]
    pub calendar: CalendarConfig,
    /// Outbound email settings.
    #[serde(default)]
    pub email: EmailConfig,
    /// Audit trail settings.
    #[serde(default)]
    pub audit: AuditConfig,
    /// Settings used until an administrator stores a replacement.
    #[serde(default)]
    pub defaults: Settings,
    /// Secrets (populated at runtime).
    #[serde(skip)]
    pub credentials: Credentials,
}

impl GlobalConfig {
    /// Load and validate configuration from a TOML file path.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if the file cannot be read or contains
    /// invalid TOML, or if validation fails.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .map_err(|err| AppError::Config(format!("failed to read config: {err}")))?;
        Self::from_toml_str(&raw)
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if parsing or validation fails.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let mut config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Load secrets from OS keychain with env-var fallback.
    ///
    /// Only the admin token is mandatory; a missing integration secret
    /// leaves that integration unconfigured.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if the admin token cannot be found or
    /// if a sender address is missing while a mail provider is configured.
    pub async fn load_credentials(&mut self) -> Result<()> {
        let credentials = Credentials {
            google_client_id: load_credential("google_client_id", "GOOGLE_CLIENT_ID").await?,
            google_client_secret: load_credential("google_client_secret", "GOOGLE_CLIENT_SECRET")
                .await?,
            google_refresh_token: load_credential("google_refresh_token", "GOOGLE_REFRESH_TOKEN")
                .await?,
            resend_api_key: load_credential("resend_api_key", "RESEND_API_KEY").await?,
            sendgrid_api_key: load_credential("sendgrid_api_key", "SENDGRID_API_KEY").await?,
            brevo_api_key: load_credential("brevo_api_key", "BREVO_API_KEY").await?,
            admin_token: load_credential("admin_token", "BOOKING_ADMIN_TOKEN")
                .await?
                .ok_or_else(|| {
                    AppError::Config(
                        "credential admin_token not found in keychain or BOOKING_ADMIN_TOKEN env var"
                            .into(),
                    )
                })?,
        };

        if credentials.any_mail_provider() && self.email.from_address.trim().is_empty() {
            return Err(AppError::Config(
                "email.from_address must be set when a mail provider is configured".into(),
            ));
        }

        self.credentials = credentials;
        Ok(())
    }

    /// Fixed offset of the event's local time zone.
    #[must_use]
    pub fn local_offset(&self) -> FixedOffset {
        FixedOffset::east_opt(self.utc_offset_minutes * 60)
            .unwrap_or_else(|| Utc.fix())
    }

    /// Self-service page link for one appointment.
    #[must_use]
    pub fn manage_url(&self, appointment_id: &str) -> String {
        format!(
            "{}/appointments/{appointment_id}",
            self.public_base_url.trim_end_matches('/')
        )
    }

    /// Retention window for appointment records.
    #[must_use]
    pub fn record_ttl(&self) -> std::time::Duration {
        days(self.record_retention_days)
    }

    /// Retention window for audit entries.
    #[must_use]
    pub fn audit_ttl(&self) -> std::time::Duration {
        days(self.audit.retention_days)
    }

    fn validate(&mut self) -> Result<()> {
        if self.public_base_url.trim().is_empty() {
            return Err(AppError::Config("public_base_url must not be empty".into()));
        }

        if self.calendar.duration_minutes == 0 {
            return Err(AppError::Config(
                "calendar.duration_minutes must be greater than zero".into(),
            ));
        }

        if self.utc_offset_minutes.abs() > 14 * 60 {
            return Err(AppError::Config(
                "utc_offset_minutes must be within +/- 14 hours".into(),
            ));
        }

        if self.record_retention_days == 0 || self.audit.retention_days == 0 {
            return Err(AppError::Config(
                "retention periods must be greater than zero".into(),
            ));
        }

        if self.audit.max_entries == 0 || self.audit.max_entries < self.audit.list_limit {
            return Err(AppError::Config(
                "audit.max_entries must be at least audit.list_limit".into(),
            ));
        }

        self.defaults
            .validate()
            .map_err(|err| AppError::Config(format!("defaults invalid: {err}")))?;

        Ok(())
    }
}

fn days(count: u32) -> std::time::Duration {
    std::time::Duration::from_secs(u64::from(count) * 86_400)
}

/// Load a single credential from OS keychain with env-var fallback.
///
/// Returns `Ok(None)` when neither source provides a non-empty value.
async fn load_credential(keyring_key: &str, env_key: &str) -> Result<Option<String>> {
    let key = keyring_key.to_owned();

    // Try OS keychain first via spawn_blocking (keyring is synchronous I/O).
    let keychain_result = tokio::task::spawn_blocking(move || {
        keyring::Entry::new(KEYRING_SERVICE, &key).and_then(|entry| entry.get_password())
    })
    .await
    .map_err(|err| AppError::Config(format!("keychain task panicked: {err}")))?;

    match keychain_result {
        Ok(value) if !value.is_empty() => return Ok(Some(value)),
        Ok(_) => {
            warn!(key = keyring_key, "keychain entry is empty, trying env var");
        }
        Err(keyring::Error::NoEntry) => {
            debug!(key = keyring_key, "no keychain entry, trying env var");
        }
        Err(err) => {
            warn!(
                key = keyring_key,
                ?err,
                "keychain lookup failed, trying env var"
            );
        }
    }

    Ok(env::var(env_key).ok().filter(|value| !value.trim().is_empty()))
}
