//! WebSocket Connection Handler
//!
//! Handles individual observer connections. Observers authenticate
//! nothing and send nothing except pings; all state flows server to
//! client.

use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::Response,
};
use chrono::Utc;
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use uuid::Uuid;

use super::messages::{HelloPayload, ObserverReceive, ObserverSend};
use crate::startup::AppState;

/// WebSocket upgrade handler
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Handle individual observer connection
async fn handle_socket(socket: WebSocket, state: AppState) {
    let observer_id = Uuid::new_v4().to_string();

    tracing::debug!(observer_id = %observer_id, "New observer connection");

    // Split socket for concurrent read/write
    let (mut sender, mut receiver) = socket.split();

    // Channel for outgoing messages
    let (tx, mut rx) = mpsc::unbounded_channel::<ObserverSend>();

    // Hello first, then the current snapshot so a late joiner starts
    // from the correct countdown instead of waiting for the next push.
    let hello = ObserverSend::Hello(HelloPayload {
        observer_id: observer_id.clone(),
        server_version: env!("CARGO_PKG_VERSION").to_string(),
    });
    if send_json(&mut sender, &hello).await.is_err() {
        return;
    }

    if let Some(snapshot) = state.coordinator.current_snapshot(Utc::now()).await {
        if send_json(&mut sender, &ObserverSend::Snapshot(snapshot))
            .await
            .is_err()
        {
            return;
        }
    }

    state.gateway.register(observer_id.clone(), tx.clone());

    // Forward queued messages to the socket
    let sender_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if send_json(&mut sender, &msg).await.is_err() {
                break;
            }
        }
    });

    // Read loop: only pings and close frames are meaningful
    while let Some(msg) = receiver.next().await {
        match msg {
            Ok(Message::Text(text)) => {
                match serde_json::from_str::<ObserverReceive>(&text) {
                    Ok(ObserverReceive::Ping) => {
                        let _ = tx.send(ObserverSend::Pong);
                    }
                    Err(_) => {
                        tracing::debug!(observer_id = %observer_id, "Unrecognized observer message");
                    }
                }
            }
            Ok(Message::Close(_)) | Err(_) => break,
            _ => continue,
        }
    }

    state.gateway.unregister(&observer_id);
    sender_task.abort();
    tracing::debug!(observer_id = %observer_id, "Observer connection closed");
}

async fn send_json(
    sender: &mut (impl SinkExt<Message> + Unpin),
    msg: &ObserverSend,
) -> Result<(), ()> {
    let text = serde_json::to_string(msg).map_err(|e| {
        tracing::error!("Failed to serialize observer message: {}", e);
    })?;
    sender.send(Message::Text(text.into())).await.map_err(|_| ())
}
