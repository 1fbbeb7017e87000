//! WebSocket Message Types

use serde::{Deserialize, Serialize};

use crate::application::dto::response::SnapshotResponse;

/// Messages sent from server to observer
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "t", content = "d")]
pub enum ObserverSend {
    /// Sent once on attach, before the first snapshot
    #[serde(rename = "HELLO")]
    Hello(HelloPayload),

    /// Full session snapshot; each one supersedes the previous
    #[serde(rename = "SNAPSHOT")]
    Snapshot(SnapshotResponse),

    /// Reply to an observer ping
    #[serde(rename = "PONG")]
    Pong,
}

/// Messages received from observers
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "t")]
pub enum ObserverReceive {
    #[serde(rename = "PING")]
    Ping,
}

/// Connection metadata sent on attach
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HelloPayload {
    pub observer_id: String,
    pub server_version: String,
}
