//! HTTP surface of the booking service.
//!
//! Public routes serve booking intake and the self-service page; routes
//! under `/api/admin` require the admin bearer token.

pub mod admin;
pub mod error;
pub mod extract;
pub mod public;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::orchestrator::BookingOrchestrator;
use crate::{AppError, Result};

/// Shared state handed to every handler.
pub struct AppState {
    /// Lifecycle orchestrator.
    pub orchestrator: BookingOrchestrator,
}

/// Handler for `GET /health`: returns 200 OK with a plain-text body.
async fn health() -> &'static str {
    "ok"
}

/// Build the full router.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/bookings", post(public::create_booking))
        .route("/api/appointments/{id}", get(public::get_appointment))
        .route(
            "/api/appointments/{id}/cancel",
            post(public::cancel_appointment),
        )
        .route(
            "/api/appointments/{id}/calendar.ics",
            get(public::calendar_file),
        )
        .route(
            "/api/admin/appointments",
            get(admin::list_appointments).delete(admin::delete_all_appointments),
        )
        .route(
            "/api/admin/appointments/{id}",
            post(admin::update_appointment),
        )
        .route(
            "/api/admin/settings",
            get(admin::get_settings).put(admin::put_settings),
        )
        .route(
            "/api/admin/audit",
            get(admin::list_audit).delete(admin::clear_audit),
        )
        .route(
            "/api/admin/notifications/preview",
            post(admin::preview_notification),
        )
        .route("/api/admin/health", get(admin::health))
        .route("/api/admin/health/calendar", get(admin::probe_calendar))
        .with_state(state)
}

/// Serve the router on an already bound listener until `ct` is cancelled.
///
/// # Errors
///
/// Returns `AppError::Io` if the server fails.
pub async fn serve_on(
    listener: tokio::net::TcpListener,
    state: Arc<AppState>,
    ct: CancellationToken,
) -> Result<()> {
    let local = listener
        .local_addr()
        .map_err(|err| AppError::Io(format!("listener has no address: {err}")))?;
    info!(%local, "booking API listening");

    axum::serve(
        listener,
        router(state).into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async move { ct.cancelled().await })
    .await
    .map_err(|err| AppError::Io(format!("HTTP server error: {err}")))?;

    info!("booking API shut down");
    Ok(())
}

/// Bind `bind_address:http_port` from configuration and serve.
///
/// # Errors
///
/// Returns `AppError::Config` if the address cannot be bound.
pub async fn serve(state: Arc<AppState>, ct: CancellationToken) -> Result<()> {
    let config = state.orchestrator.config();
    let bind = format!("{}:{}", config.bind_address, config.http_port);
    let listener = tokio::net::TcpListener::bind(&bind)
        .await
        .map_err(|err| AppError::Config(format!("failed to bind HTTP on {bind}: {err}")))?;
    serve_on(listener, state, ct).await
}
