//! Device registry records and repository trait.
//!
//! Device CRUD belongs to the surrounding product; the coordinator only
//! reads heartbeat recency for liveness and touches it when telemetry
//! proves a device alive.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::shared::error::AppError;

/// A registered device with its last known heartbeat.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceRecord {
    /// External device identity (e.g., "D1")
    pub device_number: String,

    /// Optional human-readable label
    pub label: Option<String>,

    /// Last heartbeat timestamp; drives the online/offline predicate
    pub last_heartbeat_at: DateTime<Utc>,
}

/// Repository trait for device liveness records.
#[async_trait]
pub trait DeviceRegistry: Send + Sync {
    /// All registered devices.
    async fn all(&self) -> Result<Vec<DeviceRecord>, AppError>;

    /// Devices matching the given device numbers.
    async fn find_by_numbers(&self, numbers: &[String]) -> Result<Vec<DeviceRecord>, AppError>;

    /// Record a heartbeat for a device, registering it if unknown.
    async fn touch(&self, device_number: &str, now: DateTime<Utc>) -> Result<(), AppError>;
}
