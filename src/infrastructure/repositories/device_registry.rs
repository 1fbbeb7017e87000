//! Device Registry Implementation
//!
//! PostgreSQL implementation of the DeviceRegistry trait.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::domain::entities::{DeviceRecord, DeviceRegistry};
use crate::shared::error::AppError;

#[derive(Debug, sqlx::FromRow)]
struct DeviceRow {
    device_number: String,
    label: Option<String>,
    last_heartbeat_at: DateTime<Utc>,
}

impl DeviceRow {
    fn into_record(self) -> DeviceRecord {
        DeviceRecord {
            device_number: self.device_number,
            label: self.label,
            last_heartbeat_at: self.last_heartbeat_at,
        }
    }
}

/// PostgreSQL device registry implementation.
#[derive(Clone)]
pub struct PgDeviceRegistry {
    pool: PgPool,
}

impl PgDeviceRegistry {
    /// Create a new PgDeviceRegistry with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DeviceRegistry for PgDeviceRegistry {
    async fn all(&self) -> Result<Vec<DeviceRecord>, AppError> {
        let rows = sqlx::query_as::<_, DeviceRow>(
            r#"
            SELECT device_number, label, last_heartbeat_at
            FROM devices
            ORDER BY device_number
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(DeviceRow::into_record).collect())
    }

    async fn find_by_numbers(&self, numbers: &[String]) -> Result<Vec<DeviceRecord>, AppError> {
        let rows = sqlx::query_as::<_, DeviceRow>(
            r#"
            SELECT device_number, label, last_heartbeat_at
            FROM devices
            WHERE device_number = ANY($1)
            "#,
        )
        .bind(numbers)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(DeviceRow::into_record).collect())
    }

    /// Upsert keeps heartbeats flowing even for devices that were never
    /// explicitly registered.
    async fn touch(&self, device_number: &str, now: DateTime<Utc>) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO devices (device_number, last_heartbeat_at)
            VALUES ($1, $2)
            ON CONFLICT (device_number)
            DO UPDATE SET last_heartbeat_at = EXCLUDED.last_heartbeat_at
            "#,
        )
        .bind(device_number)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
