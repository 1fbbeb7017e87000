//! Device liveness.
//!
//! A device is online while its last heartbeat is fresher than the
//! window below. Liveness filters the selectable device pool during
//! session setup and annotates snapshots for display; the heartbeat
//! timestamps themselves are owned by the device registry.

use std::collections::HashSet;

use chrono::{DateTime, Utc};

use crate::domain::entities::DeviceRecord;

/// Heartbeats older than this mark a device offline (5 minutes).
pub const ONLINE_WINDOW_SECONDS: i64 = 300;

/// Online predicate: `now - last_heartbeat_at < 5 minutes`.
pub fn is_online(record: &DeviceRecord, now: DateTime<Utc>) -> bool {
    (now - record.last_heartbeat_at).num_seconds() < ONLINE_WINDOW_SECONDS
}

/// Device numbers of the online subset, for roster eligibility checks
/// and snapshot annotation.
pub fn online_numbers(records: &[DeviceRecord], now: DateTime<Utc>) -> HashSet<String> {
    records
        .iter()
        .filter(|r| is_online(r, now))
        .map(|r| r.device_number.clone())
        .collect()
}
