//! Request DTOs
//!
//! Data structures for API request bodies.

use serde::{Deserialize, Serialize};
use validator::Validate;

/// One roster entry binding a device to a player name.
///
/// Serialize is required by the `length` rule on the roster fields:
/// the derive attaches the offending value to the validation error.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct PlayerSlotRequest {
    #[validate(length(min = 1, max = 32, message = "Device number must be 1-32 characters"))]
    pub device_number: String,

    #[validate(length(min = 1, max = 64, message = "Player name must be 1-64 characters"))]
    pub player_name: String,
}

/// Create session request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateSessionRequest {
    #[validate(length(min = 1, max = 6, message = "Roster must have 1-6 players"), nested)]
    pub players: Vec<PlayerSlotRequest>,

    #[validate(range(min = 1, max = 600, message = "Duration must be 1-600 seconds"))]
    pub duration_seconds: u32,
}

impl CreateSessionRequest {
    /// Roster as `(device_number, player_name)` pairs for the domain layer.
    pub fn roster_pairs(&self) -> Vec<(String, String)> {
        self.players
            .iter()
            .map(|p| (p.device_number.clone(), p.player_name.clone()))
            .collect()
    }
}

/// Update session request (pending sessions only). Fields left out are
/// kept as-is; a present `players` list replaces the whole roster.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateSessionRequest {
    #[validate(length(min = 1, max = 6, message = "Roster must have 1-6 players"), nested)]
    pub players: Option<Vec<PlayerSlotRequest>>,

    #[validate(range(min = 1, max = 600, message = "Duration must be 1-600 seconds"))]
    pub duration_seconds: Option<u32>,
}

impl UpdateSessionRequest {
    pub fn roster_pairs(&self) -> Option<Vec<(String, String)>> {
        self.players.as_ref().map(|players| {
            players
                .iter()
                .map(|p| (p.device_number.clone(), p.player_name.clone()))
                .collect()
        })
    }
}
