//! Error types shared across the application.

use std::fmt::{Display, Formatter};

use chrono::{DateTime, Utc};

/// Shared application result type.
pub type Result<T> = std::result::Result<T, AppError>;

/// Application error enumeration covering all domain failure modes.
#[derive(Debug)]
pub enum AppError {
    /// Configuration parsing or validation failure.
    Config(String),
    /// Durable store read or write failure.
    Db(String),
    /// Malformed or missing input, reported against a single field.
    Validation {
        /// Offending input field.
        field: String,
        /// Human readable explanation.
        message: String,
    },
    /// The requested slot already holds its maximum number of bookings.
    SlotFull(String),
    /// A live booking with the same email already exists.
    DuplicateEmail(String),
    /// The client exceeded its request budget for the current window.
    RateLimited {
        /// Instant at which the current window ends.
        reset_at: DateTime<Utc>,
    },
    /// Calendar or notification provider unreachable or misconfigured.
    Integration(String),
    /// The appointment cannot move to the requested status.
    InvalidTransition(String),
    /// Requested entity does not exist.
    NotFound(String),
    /// Caller is not authorized to perform the requested action.
    Unauthorized(String),
    /// File-system or I/O operation failure.
    Io(String),
}

impl AppError {
    /// Build a field-level validation error.
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl Display for AppError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "config: {msg}"),
            Self::Db(msg) => write!(f, "db: {msg}"),
            Self::Validation { field, message } => write!(f, "validation: {field}: {message}"),
            Self::SlotFull(msg) => write!(f, "slot full: {msg}"),
            Self::DuplicateEmail(msg) => write!(f, "duplicate email: {msg}"),
            Self::RateLimited { reset_at } => {
                write!(f, "rate limited: retry after {}", reset_at.to_rfc3339())
            }
            Self::Integration(msg) => write!(f, "integration: {msg}"),
            Self::InvalidTransition(msg) => write!(f, "invalid transition: {msg}"),
            Self::NotFound(msg) => write!(f, "not found: {msg}"),
            Self::Unauthorized(msg) => write!(f, "unauthorized: {msg}"),
            Self::Io(msg) => write!(f, "io: {msg}"),
        }
    }
}

impl std::error::Error for AppError {}

impl From<toml::de::Error> for AppError {
    fn from(err: toml::de::Error) -> Self {
        Self::Config(format!("invalid config: {err}"))
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        Self::Db(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::Db(format!("malformed record: {err}"))
    }
}
