//! Game session entity, state machine, and repository trait.
//!
//! A session is one timed multiplayer round bound to a fixed device
//! roster. Transitions: pending -> active -> completed, with pending
//! or active -> cancelled. Terminal states are immutable except for
//! reads; a new session must be created to replay.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::services::clock::SessionClock;
use crate::shared::error::AppError;

use super::score::ScoreState;

/// Minimum roster size accepted at creation.
pub const MIN_PLAYERS: usize = 1;
/// Maximum roster size accepted at creation.
pub const MAX_PLAYERS: usize = 6;
/// Minimum session duration in seconds.
pub const MIN_DURATION_SECONDS: u32 = 1;
/// Maximum session duration in seconds (10 minutes).
pub const MAX_DURATION_SECONDS: u32 = 600;

/// Session lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Pending,
    Active,
    Completed,
    Cancelled,
}

impl SessionStatus {
    /// Convert from database string representation.
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "active" => Some(Self::Active),
            "completed" => Some(Self::Completed),
            "cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }

    /// Convert to database string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Active => "active",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    /// Completed and cancelled sessions accept no further writes.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Session state machine errors.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),
}

impl From<SessionError> for AppError {
    fn from(e: SessionError) -> Self {
        match e {
            SessionError::Validation(msg) => AppError::Validation(msg),
            SessionError::Conflict(msg) => AppError::Conflict(msg),
        }
    }
}

/// A session-scoped binding of a device to a player name and score state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerSlot {
    /// External device identity, unique within the session
    pub device_number: String,

    /// Display name, non-empty and unique (case-insensitive) within the session
    pub player_name: String,

    /// Live score state for this device
    pub score: ScoreState,
}

/// One timed multiplayer round bound to a fixed device roster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameSession {
    /// Unique session identifier
    pub id: Uuid,

    /// Lifecycle status
    pub status: SessionStatus,

    /// Round length in seconds (1-600)
    pub duration_seconds: u32,

    /// Authoritative start timestamp, set exactly once on activation.
    /// Non-null iff status is active or completed.
    pub start_time: Option<DateTime<Utc>>,

    /// Set on completion or cancellation. Non-null iff status is terminal.
    pub end_time: Option<DateTime<Utc>>,

    /// Ordered player roster
    pub slots: Vec<PlayerSlot>,

    /// When the session was created
    pub created_at: DateTime<Utc>,

    /// Last mutation timestamp
    pub updated_at: DateTime<Utc>,
}

impl GameSession {
    /// Create a new session in `pending` from an ordered roster of
    /// `(device_number, player_name)` pairs.
    pub fn new(roster: Vec<(String, String)>, duration_seconds: u32) -> Result<Self, SessionError> {
        let slots = Self::validate_roster(roster)?;
        Self::validate_duration(duration_seconds)?;

        let now = Utc::now();
        Ok(Self {
            id: Uuid::new_v4(),
            status: SessionStatus::Pending,
            duration_seconds,
            start_time: None,
            end_time: None,
            slots,
            created_at: now,
            updated_at: now,
        })
    }

    fn validate_duration(duration_seconds: u32) -> Result<(), SessionError> {
        if !(MIN_DURATION_SECONDS..=MAX_DURATION_SECONDS).contains(&duration_seconds) {
            return Err(SessionError::Validation(format!(
                "Duration must be {}-{} seconds, got {}",
                MIN_DURATION_SECONDS, MAX_DURATION_SECONDS, duration_seconds
            )));
        }
        Ok(())
    }

    fn validate_roster(roster: Vec<(String, String)>) -> Result<Vec<PlayerSlot>, SessionError> {
        if !(MIN_PLAYERS..=MAX_PLAYERS).contains(&roster.len()) {
            return Err(SessionError::Validation(format!(
                "Roster must have {}-{} players, got {}",
                MIN_PLAYERS,
                MAX_PLAYERS,
                roster.len()
            )));
        }

        let mut devices = HashSet::new();
        let mut names = HashSet::new();
        for (device_number, player_name) in &roster {
            if device_number.trim().is_empty() {
                return Err(SessionError::Validation("Device number must not be empty".into()));
            }
            if player_name.trim().is_empty() {
                return Err(SessionError::Validation("Player name must not be empty".into()));
            }
            if !devices.insert(device_number.clone()) {
                return Err(SessionError::Validation(format!(
                    "Duplicate device number: {}",
                    device_number
                )));
            }
            // Names are unique case-insensitively: "Alice" and "alice" collide.
            if !names.insert(player_name.to_lowercase()) {
                return Err(SessionError::Validation(format!(
                    "Duplicate player name: {}",
                    player_name
                )));
            }
        }

        Ok(roster
            .into_iter()
            .map(|(device_number, player_name)| PlayerSlot {
                device_number,
                player_name,
                score: ScoreState::default(),
            })
            .collect())
    }

    /// Transition pending -> active, recording the authoritative start time.
    ///
    /// Slot scores are zeroed so pre-game telemetry noise cannot leak into
    /// the new round; the coordinator resets its aggregator at the same
    /// moment.
    pub fn start(&mut self, now: DateTime<Utc>) -> Result<(), SessionError> {
        if self.status != SessionStatus::Pending {
            return Err(SessionError::Conflict(format!(
                "Cannot start session in status {}",
                self.status
            )));
        }

        self.status = SessionStatus::Active;
        self.start_time = Some(now);
        self.updated_at = now;
        for slot in &mut self.slots {
            slot.score = ScoreState::default();
        }
        Ok(())
    }

    /// Atomically replace roster and/or duration. Pending only: an edit
    /// racing a concurrent start loses and surfaces as a conflict.
    pub fn apply_update(
        &mut self,
        roster: Option<Vec<(String, String)>>,
        duration_seconds: Option<u32>,
    ) -> Result<(), SessionError> {
        if self.status != SessionStatus::Pending {
            return Err(SessionError::Conflict(format!(
                "Cannot update session in status {}",
                self.status
            )));
        }

        // Validate everything before touching state so a failed update
        // leaves the session unchanged.
        let new_slots = roster.map(Self::validate_roster).transpose()?;
        if let Some(duration) = duration_seconds {
            Self::validate_duration(duration)?;
        }

        if let Some(slots) = new_slots {
            self.slots = slots;
        }
        if let Some(duration) = duration_seconds {
            self.duration_seconds = duration;
        }
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Expiry check: active sessions whose clock has run out transition to
    /// completed. Returns true when the transition happened on this call.
    /// Repeated calls after completion are no-ops.
    pub fn tick(&mut self, now: DateTime<Utc>) -> bool {
        if self.status != SessionStatus::Active {
            return false;
        }
        let expired = self
            .clock()
            .map(|clock| clock.has_expired(now))
            .unwrap_or(false);
        if expired {
            self.status = SessionStatus::Completed;
            self.end_time = Some(now);
            self.updated_at = now;
        }
        expired
    }

    /// Explicit operator cancellation, legal from pending or active.
    pub fn cancel(&mut self, now: DateTime<Utc>) -> Result<(), SessionError> {
        if self.status.is_terminal() {
            return Err(SessionError::Conflict(format!(
                "Cannot cancel session in status {}",
                self.status
            )));
        }

        self.status = SessionStatus::Cancelled;
        self.end_time = Some(now);
        self.updated_at = now;
        Ok(())
    }

    /// Clock over the shared authoritative start time. None until started.
    pub fn clock(&self) -> Option<SessionClock> {
        self.start_time
            .map(|start| SessionClock::new(start, self.duration_seconds))
    }

    /// Remaining seconds as any observer would compute them: the full
    /// duration before start, clock-derived while active, zero once
    /// terminal.
    pub fn remaining_seconds(&self, now: DateTime<Utc>) -> u64 {
        match self.status {
            SessionStatus::Pending => u64::from(self.duration_seconds),
            SessionStatus::Active => self
                .clock()
                .map(|clock| clock.remaining_seconds(now))
                .unwrap_or(0),
            SessionStatus::Completed | SessionStatus::Cancelled => 0,
        }
    }

    /// Merge aggregator score state into the roster slots.
    pub fn set_scores(&mut self, scores: &HashMap<String, ScoreState>) {
        for slot in &mut self.slots {
            if let Some(score) = scores.get(&slot.device_number) {
                slot.score = score.clone();
            }
        }
    }

    /// Winner by total activity, only meaningful once completed.
    ///
    /// Ties break to the lowest device number so the result is
    /// deterministic for a fixed snapshot.
    pub fn winner(&self) -> Option<&PlayerSlot> {
        if self.status != SessionStatus::Completed {
            return None;
        }
        self.slots.iter().max_by(|a, b| {
            a.score
                .total_activity()
                .cmp(&b.score.total_activity())
                .then_with(|| b.device_number.cmp(&a.device_number))
        })
    }
}

/// Repository trait for session persistence.
///
/// The coordinator persists on every state transition and on a throttled
/// cadence for score updates; the read path serves snapshots to
/// cold-starting observers.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Persist a newly created session with its roster.
    async fn insert(&self, session: &GameSession) -> Result<(), AppError>;

    /// Persist lifecycle fields and the (possibly replaced) roster.
    async fn update(&self, session: &GameSession) -> Result<(), AppError>;

    /// Persist score state for the session's slots.
    async fn save_scores(
        &self,
        session_id: Uuid,
        scores: &HashMap<String, ScoreState>,
    ) -> Result<(), AppError>;

    /// Load a session by ID.
    async fn find_by_id(&self, id: Uuid) -> Result<Option<GameSession>, AppError>;
}
