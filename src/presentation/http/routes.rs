//! Route Configuration
//!
//! Configures all HTTP routes for the API.

use axum::{
    response::IntoResponse,
    routing::{delete, get, patch, post, put},
    Router,
};

use super::handlers;
use crate::infrastructure::metrics;
use crate::presentation::middleware::create_security_headers_layer;
use crate::presentation::websocket::ws_handler;
use crate::startup::AppState;

/// Create the main API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .nest("/api/v1", api_routes())
        // WebSocket observer endpoint
        .route("/gateway", get(ws_handler))
        // Health check endpoints
        .route("/health", get(handlers::health::health_check))
        .route("/health/live", get(handlers::health::liveness))
        .route("/health/ready", get(handlers::health::readiness))
        // Prometheus metrics endpoint
        .route("/metrics", get(metrics_handler))
        // Apply security headers globally to all responses
        .layer(create_security_headers_layer())
        .with_state(state)
}

/// Prometheus metrics endpoint handler
async fn metrics_handler() -> impl IntoResponse {
    let metrics = metrics::gather_metrics();
    (
        [(
            axum::http::header::CONTENT_TYPE,
            "text/plain; version=0.0.4; charset=utf-8",
        )],
        metrics,
    )
}

/// API v1 routes
fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/sessions", session_routes())
        .nest("/devices", device_routes())
}

/// Session lifecycle routes
fn session_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(handlers::session::create_session))
        .route("/{session_id}", get(handlers::session::get_snapshot))
        .route("/{session_id}", patch(handlers::session::update_session))
        .route("/{session_id}/progress", get(handlers::session::get_progress))
        .route("/{session_id}/start", post(handlers::session::start_session))
        .route("/{session_id}/cancel", post(handlers::session::cancel_session))
        .route("/{session_id}/edit", post(handlers::session::begin_edit))
        .route("/{session_id}/edit", put(handlers::session::commit_edit))
        .route("/{session_id}/edit", delete(handlers::session::discard_edit))
}

/// Device registry routes
fn device_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::device::list_devices))
        .route(
            "/{device_number}/heartbeat",
            post(handlers::device::heartbeat),
        )
}
