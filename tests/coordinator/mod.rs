//! Coordinator Tests
//!
//! End-to-end session lifecycle and telemetry flow against in-memory
//! repositories.

mod lifecycle_tests;
