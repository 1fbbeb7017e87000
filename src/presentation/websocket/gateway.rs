//! Observer Gateway
//!
//! Tracks connected observers and fans snapshot broadcasts out to each
//! of them. Observers are anonymous and read-only; there is no routing
//! beyond "everyone gets every snapshot".

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::messages::ObserverSend;
use crate::application::Coordinator;
use crate::infrastructure::metrics;

/// WebSocket gateway managing all observer connections
#[derive(Default)]
pub struct Gateway {
    /// Active observers by observer_id
    observers: DashMap<String, mpsc::UnboundedSender<ObserverSend>>,
}

impl Gateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new connected observer
    pub fn register(&self, observer_id: String, sender: mpsc::UnboundedSender<ObserverSend>) {
        self.observers.insert(observer_id.clone(), sender);
        metrics::observer_connected();
        tracing::info!(observer_id = %observer_id, "Observer attached");
    }

    /// Unregister an observer
    pub fn unregister(&self, observer_id: &str) {
        if self.observers.remove(observer_id).is_some() {
            metrics::observer_disconnected();
            tracing::info!(observer_id = %observer_id, "Observer detached");
        }
    }

    /// Send a message to every connected observer
    pub fn send_to_all(&self, message: ObserverSend) {
        for entry in self.observers.iter() {
            let _ = entry.value().send(message.clone());
        }
    }

    /// Number of connected observers
    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }
}

/// Spawn the fan-out task bridging coordinator broadcasts to observers.
///
/// A lagged receiver means intermediate snapshots were dropped; the
/// next received snapshot supersedes them, so the loop just continues.
pub fn spawn_fanout(gateway: Arc<Gateway>, coordinator: Arc<Coordinator>) -> JoinHandle<()> {
    let mut rx = coordinator.subscribe();
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(snapshot) => {
                    gateway.send_to_all(ObserverSend::Snapshot(snapshot));
                }
                Err(tokio::sync::broadcast::error::RecvError::Lagged(missed)) => {
                    tracing::debug!(missed, "Observer fan-out lagged behind snapshots");
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            }
        }
    })
}
