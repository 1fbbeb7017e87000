//! Infrastructure Layer
//!
//! External concerns: database access, repository implementations,
//! telemetry transport, and metrics.

pub mod database;
pub mod ingest;
pub mod metrics;
pub mod repositories;
