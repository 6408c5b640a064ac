//! HTTP status mapping and JSON error bodies for [`AppError`].

use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use serde::Serialize;
use tracing::error;

use crate::AppError;

/// Structured error response body.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Error details.
    pub error: ErrorDetail,
}

/// Machine readable code plus a human readable message.
#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    /// Stable upper-case error code.
    pub code: &'static str,
    /// Human readable message.
    pub message: String,
    /// Offending input field, for validation errors.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let mut field = None;
        let (status, code, message) = match &self {
            AppError::Validation {
                field: name,
                message,
            } => {
                field = Some(name.clone());
                (StatusCode::BAD_REQUEST, "VALIDATION", message.clone())
            }
            AppError::SlotFull(detail) => (StatusCode::CONFLICT, "SLOT_FULL", detail.clone()),
            AppError::DuplicateEmail(detail) => {
                (StatusCode::CONFLICT, "DUPLICATE_EMAIL", detail.clone())
            }
            AppError::InvalidTransition(detail) => {
                (StatusCode::CONFLICT, "INVALID_TRANSITION", detail.clone())
            }
            AppError::RateLimited { .. } => (
                StatusCode::TOO_MANY_REQUESTS,
                "RATE_LIMITED",
                "Too many booking requests, please try again later".to_owned(),
            ),
            AppError::NotFound(detail) => (StatusCode::NOT_FOUND, "NOT_FOUND", detail.clone()),
            AppError::Unauthorized(detail) => {
                (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", detail.clone())
            }
            AppError::Integration(detail) => {
                (StatusCode::BAD_GATEWAY, "INTEGRATION", detail.clone())
            }
            AppError::Db(detail) => {
                error!(detail, "persistence error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL",
                    "Something went wrong, please try again".to_owned(),
                )
            }
            AppError::Config(detail) | AppError::Io(detail) => {
                error!(detail, "internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL",
                    "Something went wrong, please try again".to_owned(),
                )
            }
        };

        let body = ErrorBody {
            error: ErrorDetail {
                code,
                message,
                field,
            },
        };
        let mut response = (status, Json(body)).into_response();

        if let AppError::RateLimited { reset_at } = &self {
            let retry_after = (*reset_at - Utc::now()).num_seconds().max(1);
            if let Ok(value) = HeaderValue::from_str(&retry_after.to_string()) {
                response.headers_mut().insert("Retry-After", value);
            }
        }
        response
    }
}
