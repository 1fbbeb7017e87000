//! Device Handlers

use axum::{extract::{Path, State}, http::StatusCode, Json};
use chrono::Utc;

use crate::application::dto::response::DeviceResponse;
use crate::shared::error::AppError;
use crate::startup::AppState;

/// List registered devices with their liveness status
pub async fn list_devices(
    State(state): State<AppState>,
) -> Result<Json<Vec<DeviceResponse>>, AppError> {
    let now = Utc::now();
    let records = state.registry.all().await?;
    let devices = records
        .iter()
        .map(|r| DeviceResponse::from_record(r, now))
        .collect();
    Ok(Json(devices))
}

/// Record a heartbeat for a device, registering it if unknown
pub async fn heartbeat(
    State(state): State<AppState>,
    Path(device_number): Path<String>,
) -> Result<StatusCode, AppError> {
    if device_number.trim().is_empty() {
        return Err(AppError::BadRequest("Device number must not be empty".into()));
    }

    state.registry.touch(&device_number, Utc::now()).await?;
    Ok(StatusCode::NO_CONTENT)
}
