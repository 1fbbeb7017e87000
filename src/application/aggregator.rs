//! Score Aggregator
//!
//! Maintains per-device score state for the devices registered in the
//! current session. Events carry full snapshots, so application is
//! idempotent and last-write-wins needs no sequence numbers. Events for
//! devices outside the roster are no-ops.

use std::collections::HashMap;

use crate::domain::entities::ScoreState;

use super::decoder::{ScoreEvent, StatusEvent};

/// Per-device score state for the current session roster.
#[derive(Debug, Default)]
pub struct ScoreAggregator {
    scores: HashMap<String, ScoreState>,
}

impl ScoreAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reinitialize all fields to zero/neutral for exactly the given
    /// device set. Called synchronously at the pending -> active
    /// transition so pre-game telemetry noise cannot leak into a round.
    pub fn reset<I>(&mut self, devices: I)
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        self.scores = devices
            .into_iter()
            .map(|d| (d.into(), ScoreState::default()))
            .collect();
    }

    /// Replace the device status string for the matching device.
    pub fn apply_status(&mut self, event: &StatusEvent) {
        if let Some(score) = self.scores.get_mut(&event.device_number) {
            score.device_status = event.device_status.clone();
        }
    }

    /// Replace all score fields wholesale for the matching device.
    pub fn apply_score(&mut self, event: &ScoreEvent) {
        if let Some(score) = self.scores.get_mut(&event.device_number) {
            score.ok_pressed = event.ok_pressed;
            score.wrong_pressed = event.wrong_pressed;
            score.no_pressed = event.no_pressed;
            score.last_response_time = event.last_response_time;
            score.avg_response_time = event.avg_response_time;
        }
    }

    /// Immutable copy of all score state, safe to hand to observers
    /// without torn reads.
    pub fn snapshot(&self) -> HashMap<String, ScoreState> {
        self.scores.clone()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }
}
