//! Visitor-facing endpoints: booking intake and self-service.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::extract::ClientId;
use super::AppState;
use crate::models::appointment::{Appointment, AppointmentStatus};
use crate::models::slot::{Day, SlotTime};
use crate::orchestrator::{BookingRequest, CancelledBy};
use crate::{AppError, Result};

/// Response to a successful booking.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct BookingResponse {
    /// New appointment id.
    pub id: String,
    /// Self-service page link.
    pub manage_url: String,
    /// Status after creation.
    pub status: AppointmentStatus,
    /// Whether the booking skipped the pending state.
    pub auto_confirmed: bool,
}

/// What a customer sees on the self-service page.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct AppointmentView {
    /// Appointment id.
    pub id: String,
    /// Event day.
    pub day: Day,
    /// Start time.
    pub time: SlotTime,
    /// Local calendar date.
    pub date: NaiveDate,
    /// Absolute start.
    pub appointment_date: DateTime<Utc>,
    /// Booking name.
    pub name: String,
    /// Current status.
    pub status: AppointmentStatus,
    /// Reason given on cancellation.
    pub cancellation_reason: Option<String>,
    /// Whether the customer may still cancel.
    pub can_cancel: bool,
    /// Whether the calendar file can be downloaded.
    pub calendar_available: bool,
}

impl From<Appointment> for AppointmentView {
    fn from(appointment: Appointment) -> Self {
        Self {
            can_cancel: appointment.can_transition_to(AppointmentStatus::Cancelled),
            calendar_available: appointment.status == AppointmentStatus::Confirmed,
            id: appointment.id,
            day: appointment.day,
            time: appointment.time,
            date: appointment.slot_date,
            appointment_date: appointment.appointment_date,
            name: appointment.contact.name,
            status: appointment.status,
            cancellation_reason: appointment.cancellation_reason,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct CancelBody {
    #[serde(default)]
    reason: Option<String>,
}

/// `POST /api/bookings`
pub(super) async fn create_booking(
    State(state): State<Arc<AppState>>,
    ClientId(client_id): ClientId,
    body: Bytes,
) -> Result<(StatusCode, Json<BookingResponse>)> {
    let request: BookingRequest = match serde_json::from_slice(&body) {
        Ok(request) => request,
        Err(err) => {
            state.orchestrator.throttle_unparsed(&client_id).await?;
            return Err(AppError::validation("body", format!("invalid JSON: {err}")));
        }
    };
    let report = state.orchestrator.book(&request, &client_id).await?;
    let appointment = report.appointment;
    let response = BookingResponse {
        manage_url: state.orchestrator.config().manage_url(&appointment.id),
        auto_confirmed: appointment.status == AppointmentStatus::Confirmed,
        status: appointment.status,
        id: appointment.id,
    };
    Ok((StatusCode::CREATED, Json(response)))
}

/// `GET /api/appointments/{id}`
pub(super) async fn get_appointment(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<AppointmentView>> {
    let appointment = state.orchestrator.appointment(&id).await?;
    Ok(Json(appointment.into()))
}

/// `POST /api/appointments/{id}/cancel`
pub(super) async fn cancel_appointment(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<Json<AppointmentView>> {
    let body: CancelBody = if body.is_empty() {
        CancelBody::default()
    } else {
        serde_json::from_slice(&body)
            .map_err(|err| AppError::validation("body", format!("invalid JSON: {err}")))?
    };
    let report = state
        .orchestrator
        .cancel(&id, body.reason, CancelledBy::Customer)
        .await?;
    Ok(Json(report.appointment.into()))
}

/// `GET /api/appointments/{id}/calendar.ics`
pub(super) async fn calendar_file(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse> {
    let ics = state.orchestrator.calendar_file(&id).await?;
    Ok((
        [
            (CONTENT_TYPE, "text/calendar; charset=utf-8"),
            (CONTENT_DISPOSITION, "attachment; filename=\"appointment.ics\""),
        ],
        ics,
    ))
}
