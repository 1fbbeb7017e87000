//! Session clock.
//!
//! Pure computation over the session's authoritative start time and
//! duration. Every observer re-derives remaining time from the shared
//! `start_time` on each redraw tick instead of decrementing a local
//! counter, so late-attaching or delayed observers never drift.

use chrono::{DateTime, Utc};

/// Clock over an active or completed session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionClock {
    start_time: DateTime<Utc>,
    duration_seconds: u32,
}

impl SessionClock {
    pub fn new(start_time: DateTime<Utc>, duration_seconds: u32) -> Self {
        Self {
            start_time,
            duration_seconds,
        }
    }

    /// Seconds elapsed since start, saturating at zero for skewed clocks
    /// that report a `now` before the start time.
    pub fn elapsed_seconds(&self, now: DateTime<Utc>) -> u64 {
        (now - self.start_time).num_seconds().max(0) as u64
    }

    /// Seconds remaining, saturating at zero.
    pub fn remaining_seconds(&self, now: DateTime<Utc>) -> u64 {
        u64::from(self.duration_seconds).saturating_sub(self.elapsed_seconds(now))
    }

    /// Whether the round has run out. Only meaningful while the session
    /// is active; the state machine guards the status.
    pub fn has_expired(&self, now: DateTime<Utc>) -> bool {
        self.remaining_seconds(now) == 0
    }
}
