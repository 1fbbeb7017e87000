//! Coordinator / Broadcaster
//!
//! The single mutator of session and aggregator state. All lifecycle
//! commands, telemetry ingestion, and scheduled ticks are serialized
//! behind one async mutex, so a score event and a roster edit can never
//! interleave partial writes.
//!
//! The suspend flag is the only concurrency primitive exposed to
//! operators: while an edit window is open, telemetry and scheduled
//! ticks are intentionally discarded (not queued). Values on the wire
//! are full snapshots, so the next message fully supersedes anything
//! missed.
//!
//! Only one session exists per coordinator instance; a new one may only
//! be created once the previous session is completed or cancelled.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use tokio::sync::{broadcast, Mutex};
use uuid::Uuid;

use crate::domain::entities::{
    DeviceRecord, DeviceRegistry, GameSession, ScoreState, SessionStore,
};
use crate::domain::services::liveness;
use crate::infrastructure::metrics;
use crate::shared::error::AppError;

use super::aggregator::ScoreAggregator;
use super::decoder::{self, TelemetryEvent};
use super::dto::request::{CreateSessionRequest, UpdateSessionRequest};
use super::dto::response::{ProgressResponse, SnapshotResponse};

/// Capacity of the snapshot fan-out channel. Observers that lag behind
/// simply miss intermediate snapshots; the next one supersedes them.
const SNAPSHOT_CHANNEL_CAPACITY: usize = 256;

/// Mutable state guarded by the coordinator mutex.
struct CoordinatorState {
    session: Option<GameSession>,
    aggregator: ScoreAggregator,
    suspended: bool,
    scores_dirty: bool,
    last_score_persist: Option<Instant>,
    /// Set when the active -> completed transition has happened in
    /// memory but the store write failed. Retried on later ticks.
    completion_dirty: bool,
}

/// Authoritative session coordinator.
pub struct Coordinator {
    state: Mutex<CoordinatorState>,
    store: Arc<dyn SessionStore>,
    registry: Arc<dyn DeviceRegistry>,
    snapshot_tx: broadcast::Sender<SnapshotResponse>,
    score_persist_throttle: Duration,
}

impl Coordinator {
    pub fn new(
        store: Arc<dyn SessionStore>,
        registry: Arc<dyn DeviceRegistry>,
        score_persist_throttle: Duration,
    ) -> Self {
        let (snapshot_tx, _) = broadcast::channel(SNAPSHOT_CHANNEL_CAPACITY);
        Self {
            state: Mutex::new(CoordinatorState {
                session: None,
                aggregator: ScoreAggregator::new(),
                suspended: false,
                scores_dirty: false,
                last_score_persist: None,
                completion_dirty: false,
            }),
            store,
            registry,
            snapshot_tx,
            score_persist_throttle,
        }
    }

    /// Subscribe to snapshot broadcasts (observer push surface).
    pub fn subscribe(&self) -> broadcast::Receiver<SnapshotResponse> {
        self.snapshot_tx.subscribe()
    }

    /// Create a new session in `pending`. Fails with a conflict while a
    /// non-terminal session exists.
    pub async fn create_session(
        &self,
        request: CreateSessionRequest,
    ) -> Result<SnapshotResponse, AppError> {
        let mut state = self.state.lock().await;

        if let Some(session) = &state.session {
            if !session.status.is_terminal() {
                return Err(AppError::Conflict(format!(
                    "Session {} is still {}",
                    session.id, session.status
                )));
            }
        }

        let roster = request.roster_pairs();
        let devices: Vec<String> = roster.iter().map(|(d, _)| d.clone()).collect();
        let records = self.ensure_online(&devices).await?;

        let session = GameSession::new(roster, request.duration_seconds)?;
        self.store.insert(&session).await?;
        metrics::record_session_transition("pending");

        tracing::info!(
            session_id = %session.id,
            players = session.slots.len(),
            duration_seconds = session.duration_seconds,
            "Session created"
        );

        state.aggregator.reset(devices);
        state.suspended = false;
        state.scores_dirty = false;
        state.completion_dirty = false;
        let snapshot = self.snapshot_of(&session, &records, Utc::now());
        state.session = Some(session);

        self.broadcast(&snapshot);
        Ok(snapshot)
    }

    /// Transition pending -> active, recording the authoritative start
    /// time and resetting the aggregator so pre-game noise is dropped.
    pub async fn start(&self, session_id: Uuid) -> Result<SnapshotResponse, AppError> {
        let mut state = self.state.lock().await;
        let session = current_session(&mut state.session, session_id)?;

        let now = Utc::now();
        session.start(now)?;
        metrics::record_session_transition("active");

        let devices: Vec<String> = session.slots.iter().map(|s| s.device_number.clone()).collect();
        let session = session.clone();
        state.aggregator.reset(devices.clone());
        state.scores_dirty = false;

        self.store.update(&session).await?;
        tracing::info!(session_id = %session_id, "Session started");

        let records = self.registry.find_by_numbers(&devices).await?;
        let snapshot = self.snapshot_of(&session, &records, now);
        self.broadcast(&snapshot);
        Ok(snapshot)
    }

    /// Replace roster and/or duration on a pending session.
    pub async fn update(
        &self,
        session_id: Uuid,
        request: UpdateSessionRequest,
    ) -> Result<SnapshotResponse, AppError> {
        let mut state = self.state.lock().await;
        self.apply_update_locked(&mut state, session_id, request).await
    }

    /// Explicit operator cancellation.
    pub async fn cancel(&self, session_id: Uuid) -> Result<SnapshotResponse, AppError> {
        let mut state = self.state.lock().await;
        let session = current_session(&mut state.session, session_id)?;

        let now = Utc::now();
        session.cancel(now)?;
        metrics::record_session_transition("cancelled");
        let session = session.clone();
        state.suspended = false;

        self.store.update(&session).await?;
        tracing::info!(session_id = %session_id, "Session cancelled");

        let snapshot = self.snapshot_for(&session, now).await?;
        self.broadcast(&snapshot);
        Ok(snapshot)
    }

    /// Open an edit window: sets the suspend flag so telemetry and
    /// scheduled ticks leave the world stable for the operator.
    pub async fn begin_edit(&self, session_id: Uuid) -> Result<(), AppError> {
        let mut state = self.state.lock().await;
        let session = current_session(&mut state.session, session_id)?;

        if session.status.is_terminal() {
            return Err(AppError::Conflict(format!(
                "Cannot edit session in status {}",
                session.status
            )));
        }
        if state.suspended {
            return Err(AppError::Conflict("An edit is already in progress".into()));
        }

        state.suspended = true;
        tracing::debug!(session_id = %session_id, "Edit window opened, telemetry suspended");
        Ok(())
    }

    /// Close the edit window and apply the staged update. A session that
    /// left `pending` during the window (a concurrent start) surfaces as
    /// a conflict with the roster unchanged.
    pub async fn commit_edit(
        &self,
        session_id: Uuid,
        request: UpdateSessionRequest,
    ) -> Result<SnapshotResponse, AppError> {
        let mut state = self.state.lock().await;
        if !state.suspended {
            return Err(AppError::Conflict("No edit in progress".into()));
        }
        // The gate is one-way: leaving the window is unconditional even
        // when the commit itself fails.
        state.suspended = false;
        self.apply_update_locked(&mut state, session_id, request).await
    }

    /// Close the edit window leaving the session untouched.
    pub async fn discard_edit(&self, session_id: Uuid) -> Result<(), AppError> {
        let mut state = self.state.lock().await;
        current_session(&mut state.session, session_id)?;

        if !state.suspended {
            return Err(AppError::Conflict("No edit in progress".into()));
        }
        state.suspended = false;
        tracing::debug!(session_id = %session_id, "Edit window discarded");
        Ok(())
    }

    /// Apply a raw transport message. Malformed payloads and messages
    /// for unknown devices are dropped; nothing here is allowed to fail
    /// the ingestion loop.
    pub async fn ingest(&self, channel: &str, payload: &str) {
        if channel != decoder::BROADCAST_CHANNEL {
            metrics::record_telemetry("ignored");
            return;
        }
        let Some(event) = decoder::decode(channel, payload) else {
            metrics::record_telemetry("skipped");
            tracing::debug!(payload, "Dropped undecodable telemetry");
            return;
        };

        // Any decoded event proves the device alive, with or without a
        // live session; keep the registry fresh before the state gate.
        let device = event.device_number().to_string();
        if let Err(e) = self.registry.touch(&device, Utc::now()).await {
            tracing::warn!(device, error = %e, "Failed to record heartbeat");
        }

        let mut state = self.state.lock().await;
        if state.suspended {
            metrics::record_telemetry("suspended");
            return;
        }

        let CoordinatorState {
            session,
            aggregator,
            scores_dirty,
            ..
        } = &mut *state;

        let Some(session) = session.as_mut() else {
            metrics::record_telemetry("dropped");
            return;
        };
        if session.status.is_terminal() {
            metrics::record_telemetry("dropped");
            return;
        }

        match &event {
            TelemetryEvent::Status(e) => aggregator.apply_status(e),
            TelemetryEvent::Score(e) => {
                aggregator.apply_score(e);
                *scores_dirty = true;
            }
        }
        let scores = aggregator.snapshot();
        session.set_scores(&scores);
        metrics::record_telemetry("decoded");

        let session_id = session.id;
        self.maybe_persist_scores(&mut state, session_id).await;
    }

    /// Scheduled expiry check and snapshot push. Performed on a fixed
    /// cadence by the runtime; a no-op while an edit window is open.
    pub async fn tick(&self, now: DateTime<Utc>) -> Result<(), AppError> {
        let mut state = self.state.lock().await;
        if state.suspended {
            return Ok(());
        }

        let Some(session) = state.session.as_mut() else {
            return Ok(());
        };

        let completed = session.tick(now);
        let session_snapshot = session.clone();
        let session_id = session_snapshot.id;

        if completed {
            metrics::record_session_transition("completed");
            tracing::info!(
                session_id = %session_id,
                winner = session_snapshot.winner().map(|s| s.device_number.as_str()),
                "Session completed"
            );
            state.scores_dirty = false;
            state.completion_dirty = true;
        }

        if state.completion_dirty {
            // The in-memory transition already happened; the store write
            // must eventually follow or a restart resurrects the session.
            match self.store.update(&session_snapshot).await {
                Ok(()) => state.completion_dirty = false,
                Err(e) => {
                    tracing::warn!(
                        session_id = %session_id,
                        error = %e,
                        "Completion persistence failed, retrying on the next tick"
                    );
                }
            }
        } else if !completed {
            self.maybe_persist_scores(&mut state, session_id).await;
        }

        let snapshot = self.snapshot_for(&session_snapshot, now).await?;
        self.broadcast(&snapshot);
        Ok(())
    }

    /// The single read model observers consume. Serves the live session
    /// when the ID matches, otherwise falls back to the persisted copy
    /// so cold-starting observers can read finished rounds.
    pub async fn snapshot(
        &self,
        session_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<SnapshotResponse, AppError> {
        let session = self.resolve(session_id).await?;
        self.snapshot_for(&session, now).await
    }

    /// Status and remaining time only.
    pub async fn progress(
        &self,
        session_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<ProgressResponse, AppError> {
        let session = self.resolve(session_id).await?;
        Ok(ProgressResponse::build(&session, now))
    }

    /// Snapshot of the live session, if any. Sent to observers when they
    /// attach so a late joiner starts from the correct countdown.
    pub async fn current_snapshot(&self, now: DateTime<Utc>) -> Option<SnapshotResponse> {
        let session = {
            let state = self.state.lock().await;
            state.session.clone()?
        };
        self.snapshot_for(&session, now).await.ok()
    }

    async fn resolve(&self, session_id: Uuid) -> Result<GameSession, AppError> {
        {
            let state = self.state.lock().await;
            if let Some(session) = &state.session {
                if session.id == session_id {
                    return Ok(session.clone());
                }
            }
        }
        self.store
            .find_by_id(session_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Session {} not found", session_id)))
    }

    async fn apply_update_locked(
        &self,
        state: &mut CoordinatorState,
        session_id: Uuid,
        request: UpdateSessionRequest,
    ) -> Result<SnapshotResponse, AppError> {
        let roster = request.roster_pairs();
        if let Some(roster) = &roster {
            let devices: Vec<String> = roster.iter().map(|(d, _)| d.clone()).collect();
            self.ensure_online(&devices).await?;
        }

        let session = current_session(&mut state.session, session_id)?;
        session.apply_update(roster, request.duration_seconds)?;
        let session = session.clone();

        if let Some(roster_devices) = request.roster_pairs() {
            state
                .aggregator
                .reset(roster_devices.into_iter().map(|(d, _)| d));
        }

        self.store.update(&session).await?;
        tracing::info!(session_id = %session_id, "Session updated");

        let snapshot = self.snapshot_for(&session, Utc::now()).await?;
        self.broadcast(&snapshot);
        Ok(snapshot)
    }

    /// Verify every requested device is registered and has a fresh
    /// heartbeat, returning the matching records.
    async fn ensure_online(&self, devices: &[String]) -> Result<Vec<DeviceRecord>, AppError> {
        let records = self.registry.find_by_numbers(devices).await?;
        let online = liveness::online_numbers(&records, Utc::now());
        for device in devices {
            if !online.contains(device) {
                return Err(AppError::Validation(format!(
                    "Device {} is offline or not registered",
                    device
                )));
            }
        }
        Ok(records)
    }

    /// Persist score state at most once per throttle window. Failures
    /// are logged, not propagated: the next window retries with fresher
    /// data anyway.
    async fn maybe_persist_scores(&self, state: &mut CoordinatorState, session_id: Uuid) {
        if !state.scores_dirty {
            return;
        }
        let due = state
            .last_score_persist
            .map(|t| t.elapsed() >= self.score_persist_throttle)
            .unwrap_or(true);
        if !due {
            return;
        }

        let scores: HashMap<String, ScoreState> = state.aggregator.snapshot();
        match self.store.save_scores(session_id, &scores).await {
            Ok(()) => {
                state.scores_dirty = false;
                state.last_score_persist = Some(Instant::now());
            }
            Err(e) => {
                tracing::warn!(session_id = %session_id, error = %e, "Score persistence failed");
            }
        }
    }

    async fn snapshot_for(
        &self,
        session: &GameSession,
        now: DateTime<Utc>,
    ) -> Result<SnapshotResponse, AppError> {
        let devices: Vec<String> = session.slots.iter().map(|s| s.device_number.clone()).collect();
        let records = self.registry.find_by_numbers(&devices).await?;
        Ok(self.snapshot_of(session, &records, now))
    }

    fn snapshot_of(
        &self,
        session: &GameSession,
        records: &[DeviceRecord],
        now: DateTime<Utc>,
    ) -> SnapshotResponse {
        let online = liveness::online_numbers(records, now);
        SnapshotResponse::build(session, &online, now)
    }

    fn broadcast(&self, snapshot: &SnapshotResponse) {
        // Send fails when no observer is attached; that is fine.
        if self.snapshot_tx.send(snapshot.clone()).is_ok() {
            metrics::record_snapshot_broadcast();
        }
    }
}

fn current_session(
    session: &mut Option<GameSession>,
    session_id: Uuid,
) -> Result<&mut GameSession, AppError> {
    match session.as_mut() {
        Some(s) if s.id == session_id => Ok(s),
        _ => Err(AppError::NotFound(format!("Session {} not found", session_id))),
    }
}
