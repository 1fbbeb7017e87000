//! Session Handlers
//!
//! Operator surface for the session lifecycle. Every handler delegates
//! to the coordinator; the handlers themselves only parse, validate,
//! and shape responses.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use uuid::Uuid;
use validator::Validate;

use crate::application::dto::request::{CreateSessionRequest, UpdateSessionRequest};
use crate::application::dto::response::{ProgressResponse, SnapshotResponse};
use crate::shared::error::AppError;
use crate::shared::validation::validation_error;
use crate::startup::AppState;

fn parse_session_id(raw: &str) -> Result<Uuid, AppError> {
    raw.parse()
        .map_err(|_| AppError::BadRequest("Invalid session ID".into()))
}

/// Create a new session in `pending`
pub async fn create_session(
    State(state): State<AppState>,
    Json(body): Json<CreateSessionRequest>,
) -> Result<(StatusCode, Json<SnapshotResponse>), AppError> {
    body.validate().map_err(validation_error)?;

    let snapshot = state.coordinator.create_session(body).await?;
    Ok((StatusCode::CREATED, Json(snapshot)))
}

/// Full session snapshot (metadata, scores, liveness, winner)
pub async fn get_snapshot(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<SnapshotResponse>, AppError> {
    let session_id = parse_session_id(&session_id)?;
    let snapshot = state.coordinator.snapshot(session_id, Utc::now()).await?;
    Ok(Json(snapshot))
}

/// Status and remaining time only
pub async fn get_progress(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<ProgressResponse>, AppError> {
    let session_id = parse_session_id(&session_id)?;
    let progress = state.coordinator.progress(session_id, Utc::now()).await?;
    Ok(Json(progress))
}

/// Start a pending session
pub async fn start_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<SnapshotResponse>, AppError> {
    let session_id = parse_session_id(&session_id)?;
    let snapshot = state.coordinator.start(session_id).await?;
    Ok(Json(snapshot))
}

/// Replace roster and/or duration on a pending session
pub async fn update_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Json(body): Json<UpdateSessionRequest>,
) -> Result<Json<SnapshotResponse>, AppError> {
    let session_id = parse_session_id(&session_id)?;
    body.validate().map_err(validation_error)?;

    let snapshot = state.coordinator.update(session_id, body).await?;
    Ok(Json(snapshot))
}

/// Cancel a pending or active session
pub async fn cancel_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<SnapshotResponse>, AppError> {
    let session_id = parse_session_id(&session_id)?;
    let snapshot = state.coordinator.cancel(session_id).await?;
    Ok(Json(snapshot))
}

/// Open an edit window (suspends telemetry and ticks)
pub async fn begin_edit(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<StatusCode, AppError> {
    let session_id = parse_session_id(&session_id)?;
    state.coordinator.begin_edit(session_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Apply the staged update and close the edit window
pub async fn commit_edit(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Json(body): Json<UpdateSessionRequest>,
) -> Result<Json<SnapshotResponse>, AppError> {
    let session_id = parse_session_id(&session_id)?;
    body.validate().map_err(validation_error)?;

    let snapshot = state.coordinator.commit_edit(session_id, body).await?;
    Ok(Json(snapshot))
}

/// Close the edit window without applying anything
pub async fn discard_edit(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<StatusCode, AppError> {
    let session_id = parse_session_id(&session_id)?;
    state.coordinator.discard_edit(session_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
