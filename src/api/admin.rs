//! Administrative endpoints, all behind the bearer token.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use super::extract::AdminAuth;
use super::AppState;
use crate::audit::AuditEntry;
use crate::models::appointment::Appointment;
use crate::models::settings::Settings;
use crate::notify::{NotificationKind, Role};
use crate::orchestrator::{
    CalendarProbe, CancelledBy, HealthReport, NotificationReport, TransitionReport,
};
use crate::Result;

/// Mutation requested on one appointment.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AdminAction {
    /// Confirm a pending appointment.
    Confirm,
    /// Cancel (or reject, when pending).
    Cancel,
    /// Remove from storage.
    Delete,
    /// Send the reminder email.
    Remind,
}

/// Body of `POST /api/admin/appointments/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AdminActionRequest {
    /// Requested action.
    pub action: AdminAction,
    /// Cancellation reason.
    #[serde(default)]
    pub reason: Option<String>,
}

/// Transition result plus the integration errors it absorbed.
#[derive(Debug, Serialize)]
pub struct AdminActionResponse {
    /// Full transition report.
    #[serde(flatten)]
    pub report: TransitionReport,
    /// Calendar and notification errors, empty on full success.
    pub integration_errors: Vec<String>,
}

/// Body of `POST /api/admin/notifications/preview`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct PreviewRequest {
    /// Template role.
    pub role: Role,
    /// Template kind.
    pub kind: NotificationKind,
}

/// Query of `GET /api/admin/audit`.
#[derive(Debug, Default, Deserialize)]
pub struct AuditQuery {
    /// Maximum entries to return.
    pub limit: Option<usize>,
}

/// Count of removed items.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Removed {
    /// Items removed.
    pub removed: usize,
}

/// `GET /api/admin/appointments`
pub(super) async fn list_appointments(
    _auth: AdminAuth,
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Appointment>>> {
    Ok(Json(state.orchestrator.list_appointments().await?))
}

/// `POST /api/admin/appointments/{id}`
pub(super) async fn update_appointment(
    _auth: AdminAuth,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(request): Json<AdminActionRequest>,
) -> Result<Json<AdminActionResponse>> {
    let orchestrator = &state.orchestrator;
    let report = match request.action {
        AdminAction::Confirm => orchestrator.confirm(&id).await?,
        AdminAction::Cancel => {
            orchestrator
                .cancel(&id, request.reason, CancelledBy::Admin)
                .await?
        }
        AdminAction::Delete => orchestrator.delete(&id).await?,
        AdminAction::Remind => orchestrator.send_reminder(&id).await?,
    };
    Ok(Json(AdminActionResponse {
        integration_errors: report.integration_errors(),
        report,
    }))
}

/// `DELETE /api/admin/appointments`
pub(super) async fn delete_all_appointments(
    _auth: AdminAuth,
    State(state): State<Arc<AppState>>,
) -> Result<Json<Removed>> {
    let removed = state.orchestrator.delete_all().await?;
    Ok(Json(Removed { removed }))
}

/// `GET /api/admin/settings`
pub(super) async fn get_settings(
    _auth: AdminAuth,
    State(state): State<Arc<AppState>>,
) -> Result<Json<Settings>> {
    Ok(Json(state.orchestrator.settings().await?))
}

/// `PUT /api/admin/settings`
pub(super) async fn put_settings(
    _auth: AdminAuth,
    State(state): State<Arc<AppState>>,
    Json(next): Json<Settings>,
) -> Result<Json<Settings>> {
    Ok(Json(state.orchestrator.update_settings(next).await?))
}

/// `GET /api/admin/audit`
pub(super) async fn list_audit(
    _auth: AdminAuth,
    State(state): State<Arc<AppState>>,
    Query(query): Query<AuditQuery>,
) -> Result<Json<Vec<AuditEntry>>> {
    Ok(Json(state.orchestrator.list_audit(query.limit).await?))
}

/// `DELETE /api/admin/audit`
pub(super) async fn clear_audit(
    _auth: AdminAuth,
    State(state): State<Arc<AppState>>,
) -> Result<Json<Removed>> {
    let removed = state.orchestrator.clear_audit().await?;
    Ok(Json(Removed { removed }))
}

/// `POST /api/admin/notifications/preview`
pub(super) async fn preview_notification(
    _auth: AdminAuth,
    State(state): State<Arc<AppState>>,
    Json(request): Json<PreviewRequest>,
) -> Result<Json<NotificationReport>> {
    Ok(Json(
        state
            .orchestrator
            .preview_notification(request.role, request.kind)
            .await?,
    ))
}

/// `GET /api/admin/health`
pub(super) async fn health(
    _auth: AdminAuth,
    State(state): State<Arc<AppState>>,
) -> Json<HealthReport> {
    Json(state.orchestrator.health().await)
}

/// `GET /api/admin/health/calendar`
pub(super) async fn probe_calendar(
    _auth: AdminAuth,
    State(state): State<Arc<AppState>>,
) -> Json<CalendarProbe> {
    Json(state.orchestrator.probe_calendar().await)
}
