//! # Domain Entities
//!
//! Core domain entities of the session coordinator.
//!
//! - **GameSession**: one timed multiplayer round with its state machine
//! - **PlayerSlot**: session-scoped binding of a device to a player
//! - **ScoreState**: per-device button-press counters and response times
//! - **DeviceRecord**: registry view of a device's heartbeat recency
//!
//! Repository traits (`SessionStore`, `DeviceRegistry`) define the
//! persistence contracts; implementations live in the infrastructure
//! layer, following the dependency inversion principle.

mod device;
mod score;
mod session;

pub use device::{DeviceRecord, DeviceRegistry};
pub use score::ScoreState;
pub use session::{
    GameSession, PlayerSlot, SessionError, SessionStatus, SessionStore, MAX_DURATION_SECONDS,
    MAX_PLAYERS, MIN_DURATION_SECONDS, MIN_PLAYERS,
};
