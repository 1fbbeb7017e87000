//! Response DTOs
//!
//! The snapshot is the single read model observers consume: session
//! metadata, remaining time, per-device score state, and online flags.
//! Observers re-derive the countdown from `start_time` on every redraw
//! tick; `remaining_seconds` is a convenience value computed at
//! serialization time.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::entities::{DeviceRecord, GameSession, PlayerSlot, SessionStatus};
use crate::domain::services::liveness;

/// Session metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionResponse {
    pub id: String,
    pub status: SessionStatus,
    pub duration_seconds: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<String>,
    pub created_at: String,
}

impl From<&GameSession> for SessionResponse {
    fn from(session: &GameSession) -> Self {
        Self {
            id: session.id.to_string(),
            status: session.status,
            duration_seconds: session.duration_seconds,
            start_time: session.start_time.map(|t| t.to_rfc3339()),
            end_time: session.end_time.map(|t| t.to_rfc3339()),
            created_at: session.created_at.to_rfc3339(),
        }
    }
}

/// One roster slot with its live score state and connectivity flag.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlotSnapshot {
    pub device_number: String,
    pub player_name: String,
    pub ok_pressed: u32,
    pub wrong_pressed: u32,
    pub no_pressed: u32,
    pub last_response_time: f64,
    pub avg_response_time: f64,
    pub device_status: String,
    pub online: bool,
}

impl SlotSnapshot {
    fn from_slot(slot: &PlayerSlot, online: bool) -> Self {
        Self {
            device_number: slot.device_number.clone(),
            player_name: slot.player_name.clone(),
            ok_pressed: slot.score.ok_pressed,
            wrong_pressed: slot.score.wrong_pressed,
            no_pressed: slot.score.no_pressed,
            last_response_time: slot.score.last_response_time,
            avg_response_time: slot.score.avg_response_time,
            device_status: slot.score.device_status.clone(),
            online,
        }
    }
}

/// Consistent point-in-time read model of session + scores + liveness.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotResponse {
    pub session: SessionResponse,
    pub remaining_seconds: u64,
    pub slots: Vec<SlotSnapshot>,
    /// Winning device number, present once the session is completed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub winner: Option<String>,
}

impl SnapshotResponse {
    pub fn build(session: &GameSession, online: &HashSet<String>, now: DateTime<Utc>) -> Self {
        Self {
            session: SessionResponse::from(session),
            remaining_seconds: session.remaining_seconds(now),
            slots: session
                .slots
                .iter()
                .map(|slot| SlotSnapshot::from_slot(slot, online.contains(&slot.device_number)))
                .collect(),
            winner: session.winner().map(|slot| slot.device_number.clone()),
        }
    }
}

/// Lightweight status + countdown view.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressResponse {
    pub id: String,
    pub status: SessionStatus,
    pub remaining_seconds: u64,
}

impl ProgressResponse {
    pub fn build(session: &GameSession, now: DateTime<Utc>) -> Self {
        Self {
            id: session.id.to_string(),
            status: session.status,
            remaining_seconds: session.remaining_seconds(now),
        }
    }
}

/// Device registry entry annotated with liveness.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceResponse {
    pub device_number: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub last_heartbeat_at: String,
    pub online: bool,
}

impl DeviceResponse {
    pub fn from_record(record: &DeviceRecord, now: DateTime<Utc>) -> Self {
        Self {
            device_number: record.device_number.clone(),
            label: record.label.clone(),
            last_heartbeat_at: record.last_heartbeat_at.to_rfc3339(),
            online: liveness::is_online(record, now),
        }
    }
}
