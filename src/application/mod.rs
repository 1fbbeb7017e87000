//! Application Layer
//!
//! Orchestrates the session lifecycle: decoding telemetry, aggregating
//! scores, and coordinating state transitions between the domain layer
//! and the presentation/infrastructure layers.

pub mod aggregator;
pub mod coordinator;
pub mod decoder;
pub mod dto;

pub use aggregator::ScoreAggregator;
pub use coordinator::Coordinator;
pub use decoder::{ScoreEvent, StatusEvent, TelemetryEvent};
