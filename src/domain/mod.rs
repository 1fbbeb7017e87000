//! # Domain Layer
//!
//! Core business logic of the session coordinator, independent of any
//! framework or infrastructure concern.
//!
//! - **entities**: GameSession, PlayerSlot, ScoreState, DeviceRecord
//! - **services**: session clock and liveness predicates
//!
//! Repository traits define data access contracts; entities own the
//! state-machine rules (transition legality, roster validation, winner
//! determination).

pub mod entities;
pub mod services;

// Re-export commonly used types
pub use entities::*;
pub use services::SessionClock;
