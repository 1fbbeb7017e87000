//! Telemetry Decoder
//!
//! Parses raw `(channel, payload)` pairs from the ingestion transport
//! into typed events. The wire protocol is a bare comma-separated
//! format with positional, overloaded field counts (3 and 9 fields are
//! both tagged "Status"); everything behind this module only sees typed
//! events. Any unrecognized shape is a no-op, never an error: the
//! transport is best-effort and noisy, and malformed telemetry must not
//! crash or stall the coordinator.
//!
//! Pure and stateless: the same payload always yields the same result.

/// Channel devices broadcast on. Messages on other channels are ignored
/// (not an error). Future protocol versions must preserve the
/// field-count dispatch or introduce an explicit version field.
pub const BROADCAST_CHANNEL: &str = "devices/all";

/// Characters stripped from payloads before field splitting.
const NOISE_MARKERS: &[char] = &['\r', '\n', '\0'];

/// A device status report: 3 fields, `<device>,Status,<state>`.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusEvent {
    pub device_number: String,
    pub device_status: String,
}

/// A full score snapshot: 9 fields,
/// `<device>,Status,_,_,<ok>,<wrong>,<no>,<last>,<avg>`.
/// Counters are totals, not deltas, so last-write-wins is safe.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreEvent {
    pub device_number: String,
    pub ok_pressed: u32,
    pub wrong_pressed: u32,
    pub no_pressed: u32,
    pub last_response_time: f64,
    pub avg_response_time: f64,
}

/// A decoded telemetry event.
#[derive(Debug, Clone, PartialEq)]
pub enum TelemetryEvent {
    Status(StatusEvent),
    Score(ScoreEvent),
}

impl TelemetryEvent {
    pub fn device_number(&self) -> &str {
        match self {
            TelemetryEvent::Status(e) => &e.device_number,
            TelemetryEvent::Score(e) => &e.device_number,
        }
    }
}

/// Decode a raw transport message. Returns `None` for messages on other
/// channels, unrecognized shapes, and fields that fail to parse.
pub fn decode(channel: &str, payload: &str) -> Option<TelemetryEvent> {
    if channel != BROADCAST_CHANNEL {
        return None;
    }

    let cleaned: String = payload.chars().filter(|c| !NOISE_MARKERS.contains(c)).collect();
    let fields: Vec<&str> = cleaned.split(',').map(str::trim).collect();

    match fields.as_slice() {
        [device, "Status", status] if !device.is_empty() => {
            Some(TelemetryEvent::Status(StatusEvent {
                device_number: (*device).to_string(),
                device_status: (*status).to_string(),
            }))
        }
        [device, "Status", _, _, ok, wrong, no, last, avg] if !device.is_empty() => {
            Some(TelemetryEvent::Score(ScoreEvent {
                device_number: (*device).to_string(),
                ok_pressed: ok.parse().ok()?,
                wrong_pressed: wrong.parse().ok()?,
                no_pressed: no.parse().ok()?,
                last_response_time: last.parse().ok()?,
                avg_response_time: avg.parse().ok()?,
            }))
        }
        _ => None,
    }
}
