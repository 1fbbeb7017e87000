//! Session Store Implementation
//!
//! PostgreSQL implementation of the SessionStore trait. Sessions and
//! their slots are written on every state transition; score columns are
//! additionally refreshed on the coordinator's throttled cadence.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::entities::{
    GameSession, PlayerSlot, ScoreState, SessionStatus, SessionStore,
};
use crate::shared::error::AppError;

/// Database row representation matching the sessions table schema.
#[derive(Debug, sqlx::FromRow)]
struct SessionRow {
    id: Uuid,
    status: String,
    duration_seconds: i32,
    start_time: Option<DateTime<Utc>>,
    end_time: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Database row representation matching the session_slots table schema.
#[derive(Debug, sqlx::FromRow)]
struct SlotRow {
    device_number: String,
    player_name: String,
    ok_pressed: i32,
    wrong_pressed: i32,
    no_pressed: i32,
    last_response_time: f64,
    avg_response_time: f64,
    device_status: String,
}

impl SlotRow {
    fn into_slot(self) -> PlayerSlot {
        PlayerSlot {
            device_number: self.device_number,
            player_name: self.player_name,
            score: ScoreState {
                ok_pressed: self.ok_pressed.max(0) as u32,
                wrong_pressed: self.wrong_pressed.max(0) as u32,
                no_pressed: self.no_pressed.max(0) as u32,
                last_response_time: self.last_response_time,
                avg_response_time: self.avg_response_time,
                device_status: self.device_status,
            },
        }
    }
}

/// PostgreSQL session store implementation.
#[derive(Clone)]
pub struct PgSessionStore {
    pool: PgPool,
}

impl PgSessionStore {
    /// Create a new PgSessionStore with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn replace_slots(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        session: &GameSession,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM session_slots WHERE session_id = $1")
            .bind(session.id)
            .execute(&mut **tx)
            .await?;

        for (position, slot) in session.slots.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO session_slots
                    (session_id, device_number, player_name, position,
                     ok_pressed, wrong_pressed, no_pressed,
                     last_response_time, avg_response_time, device_status)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
                "#,
            )
            .bind(session.id)
            .bind(&slot.device_number)
            .bind(&slot.player_name)
            .bind(position as i32)
            .bind(slot.score.ok_pressed as i32)
            .bind(slot.score.wrong_pressed as i32)
            .bind(slot.score.no_pressed as i32)
            .bind(slot.score.last_response_time)
            .bind(slot.score.avg_response_time)
            .bind(&slot.score.device_status)
            .execute(&mut **tx)
            .await?;
        }
        Ok(())
    }
}

#[async_trait]
impl SessionStore for PgSessionStore {
    /// Persist a newly created session with its roster.
    async fn insert(&self, session: &GameSession) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO sessions
                (id, status, duration_seconds, start_time, end_time, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(session.id)
        .bind(session.status.as_str())
        .bind(session.duration_seconds as i32)
        .bind(session.start_time)
        .bind(session.end_time)
        .bind(session.created_at)
        .bind(session.updated_at)
        .execute(&mut *tx)
        .await?;

        Self::replace_slots(&mut tx, session).await?;
        tx.commit().await?;
        Ok(())
    }

    /// Persist lifecycle fields and the (possibly replaced) roster.
    async fn update(&self, session: &GameSession) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            UPDATE sessions
            SET status = $2, duration_seconds = $3, start_time = $4,
                end_time = $5, updated_at = $6
            WHERE id = $1
            "#,
        )
        .bind(session.id)
        .bind(session.status.as_str())
        .bind(session.duration_seconds as i32)
        .bind(session.start_time)
        .bind(session.end_time)
        .bind(session.updated_at)
        .execute(&mut *tx)
        .await?;

        Self::replace_slots(&mut tx, session).await?;
        tx.commit().await?;
        Ok(())
    }

    /// Refresh score columns for the session's slots.
    async fn save_scores(
        &self,
        session_id: Uuid,
        scores: &HashMap<String, ScoreState>,
    ) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        for (device_number, score) in scores {
            sqlx::query(
                r#"
                UPDATE session_slots
                SET ok_pressed = $3, wrong_pressed = $4, no_pressed = $5,
                    last_response_time = $6, avg_response_time = $7, device_status = $8
                WHERE session_id = $1 AND device_number = $2
                "#,
            )
            .bind(session_id)
            .bind(device_number)
            .bind(score.ok_pressed as i32)
            .bind(score.wrong_pressed as i32)
            .bind(score.no_pressed as i32)
            .bind(score.last_response_time)
            .bind(score.avg_response_time)
            .bind(&score.device_status)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// Load a session by ID, serving the cold-start read path.
    async fn find_by_id(&self, id: Uuid) -> Result<Option<GameSession>, AppError> {
        let row = sqlx::query_as::<_, SessionRow>(
            r#"
            SELECT id, status, duration_seconds, start_time, end_time, created_at, updated_at
            FROM sessions
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let status = SessionStatus::from_str(&row.status).ok_or_else(|| {
            AppError::Internal(format!("Unknown session status in store: {}", row.status))
        })?;

        let slots = sqlx::query_as::<_, SlotRow>(
            r#"
            SELECT device_number, player_name, ok_pressed, wrong_pressed, no_pressed,
                   last_response_time, avg_response_time, device_status
            FROM session_slots
            WHERE session_id = $1
            ORDER BY position
            "#,
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        Ok(Some(GameSession {
            id: row.id,
            status,
            duration_seconds: row.duration_seconds.max(0) as u32,
            start_time: row.start_time,
            end_time: row.end_time,
            slots: slots.into_iter().map(SlotRow::into_slot).collect(),
            created_at: row.created_at,
            updated_at: row.updated_at,
        }))
    }
}
