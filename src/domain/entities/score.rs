//! Per-device score state.
//!
//! Devices report full score snapshots (not deltas), so every score
//! event replaces these fields wholesale. The running average comes
//! from the device as reported; it is never recomputed locally.

use serde::{Deserialize, Serialize};

/// Score state for a single device in a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ScoreState {
    /// Correct button presses
    pub ok_pressed: u32,

    /// Wrong button presses
    pub wrong_pressed: u32,

    /// Missed prompts
    pub no_pressed: u32,

    /// Most recent response time in seconds
    pub last_response_time: f64,

    /// Running average response time in seconds, as reported by the device
    pub avg_response_time: f64,

    /// Free-form device-reported state string (e.g., idle/active/error)
    pub device_status: String,
}

impl ScoreState {
    /// Total activity across all press counters. Used for winner ranking.
    pub fn total_activity(&self) -> u32 {
        self.ok_pressed + self.wrong_pressed + self.no_pressed
    }
}
