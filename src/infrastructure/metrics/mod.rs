//! Prometheus Metrics Module
//!
//! Provides application-wide metrics collection using Prometheus.
//!
//! # Metrics Collected
//! - Telemetry message counts by ingest outcome
//! - Session state transition counts
//! - Active observer connection gauge
//! - Snapshot broadcast counts
//! - Transport reconnect counts

use once_cell::sync::Lazy;
use prometheus::{Encoder, IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};

/// Global metrics registry
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    register_metrics(&registry);
    registry
});

/// Telemetry message counter by ingest outcome:
/// decoded, skipped (malformed), ignored (other channel),
/// suspended (edit window), dropped (no live session)
pub static TELEMETRY_MESSAGES_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("telemetry_messages_total", "Total telemetry messages by outcome")
            .namespace("arena_server"),
        &["outcome"],
    )
    .expect("Failed to create TELEMETRY_MESSAGES_TOTAL metric")
});

/// Session state transition counter by target status
pub static SESSION_TRANSITIONS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("session_transitions_total", "Session state transitions by target status")
            .namespace("arena_server"),
        &["to"],
    )
    .expect("Failed to create SESSION_TRANSITIONS_TOTAL metric")
});

/// Active observer (WebSocket) connections
pub static OBSERVERS_CONNECTED: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::with_opts(
        Opts::new("observers_connected", "Number of connected snapshot observers")
            .namespace("arena_server"),
    )
    .expect("Failed to create OBSERVERS_CONNECTED metric")
});

/// Snapshot broadcasts delivered to at least one observer
pub static SNAPSHOT_BROADCASTS_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::with_opts(
        Opts::new("snapshot_broadcasts_total", "Snapshots broadcast to observers")
            .namespace("arena_server"),
    )
    .expect("Failed to create SNAPSHOT_BROADCASTS_TOTAL metric")
});

/// Telemetry transport reconnect attempts
pub static TRANSPORT_RECONNECTS_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::with_opts(
        Opts::new("transport_reconnects_total", "Telemetry transport reconnect attempts")
            .namespace("arena_server"),
    )
    .expect("Failed to create TRANSPORT_RECONNECTS_TOTAL metric")
});

/// Register all metrics with the registry
fn register_metrics(registry: &Registry) {
    registry
        .register(Box::new(TELEMETRY_MESSAGES_TOTAL.clone()))
        .expect("Failed to register TELEMETRY_MESSAGES_TOTAL");
    registry
        .register(Box::new(SESSION_TRANSITIONS_TOTAL.clone()))
        .expect("Failed to register SESSION_TRANSITIONS_TOTAL");
    registry
        .register(Box::new(OBSERVERS_CONNECTED.clone()))
        .expect("Failed to register OBSERVERS_CONNECTED");
    registry
        .register(Box::new(SNAPSHOT_BROADCASTS_TOTAL.clone()))
        .expect("Failed to register SNAPSHOT_BROADCASTS_TOTAL");
    registry
        .register(Box::new(TRANSPORT_RECONNECTS_TOTAL.clone()))
        .expect("Failed to register TRANSPORT_RECONNECTS_TOTAL");
}

/// Collect and encode all metrics as Prometheus text format
pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .expect("Failed to encode metrics");
    String::from_utf8(buffer).expect("Metrics should be valid UTF-8")
}

/// Record a telemetry message ingest outcome
pub fn record_telemetry(outcome: &str) {
    TELEMETRY_MESSAGES_TOTAL.with_label_values(&[outcome]).inc();
}

/// Record a session state transition
pub fn record_session_transition(to: &str) {
    SESSION_TRANSITIONS_TOTAL.with_label_values(&[to]).inc();
}

/// Record a snapshot broadcast
pub fn record_snapshot_broadcast() {
    SNAPSHOT_BROADCASTS_TOTAL.inc();
}

/// Record a transport reconnect attempt
pub fn record_transport_reconnect() {
    TRANSPORT_RECONNECTS_TOTAL.inc();
}

/// Track observer connect/disconnect
pub fn observer_connected() {
    OBSERVERS_CONNECTED.inc();
}

pub fn observer_disconnected() {
    OBSERVERS_CONNECTED.dec();
}
