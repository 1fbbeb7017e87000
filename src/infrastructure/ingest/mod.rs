//! Telemetry Ingest Module
//!
//! Subscribes to the device telemetry transport (Redis pub/sub) and
//! feeds raw payloads into the coordinator. The subscriber reconnects
//! with capped exponential backoff and jitter; while disconnected,
//! telemetry is simply lost, which is acceptable because the wire
//! protocol carries full score snapshots rather than deltas.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use rand::Rng;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::application::Coordinator;
use crate::config::IngestSettings;
use crate::infrastructure::metrics;

/// Shared flag reporting whether the telemetry transport is currently
/// connected. Read by the readiness probe.
#[derive(Clone, Default)]
pub struct TransportHealth(Arc<AtomicBool>);

impl TransportHealth {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_connected(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    fn set_connected(&self, connected: bool) {
        self.0.store(connected, Ordering::Relaxed);
    }
}

/// Spawn the background subscriber task.
///
/// The task runs for the lifetime of the process, reconnecting on any
/// transport failure. Each received message is handed to the
/// coordinator, which decides whether to decode, apply, or drop it.
pub fn spawn_subscriber(
    redis_url: String,
    settings: IngestSettings,
    coordinator: Arc<Coordinator>,
    health: TransportHealth,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut backoff_ms = settings.reconnect_base_ms;

        loop {
            match run_subscription(&redis_url, &settings.channel_pattern, &coordinator, &health)
                .await
            {
                Ok(()) => {
                    // Stream ended without an error (e.g., server closed
                    // the connection); reconnect from the base backoff.
                    backoff_ms = settings.reconnect_base_ms;
                }
                Err(e) => {
                    warn!("Telemetry subscription failed: {}", e);
                }
            }

            health.set_connected(false);
            metrics::record_transport_reconnect();

            let jitter = rand::rng().random_range(0..=backoff_ms / 2);
            let delay = Duration::from_millis(backoff_ms + jitter);
            info!("Reconnecting telemetry transport in {:?}", delay);
            tokio::time::sleep(delay).await;

            backoff_ms = (backoff_ms * 2).min(settings.reconnect_max_ms);
        }
    })
}

async fn run_subscription(
    redis_url: &str,
    channel_pattern: &str,
    coordinator: &Coordinator,
    health: &TransportHealth,
) -> Result<(), redis::RedisError> {
    let client = redis::Client::open(redis_url)?;
    let mut pubsub = client.get_async_pubsub().await?;
    pubsub.psubscribe(channel_pattern).await?;

    health.set_connected(true);
    info!("Telemetry transport connected, pattern: {}", channel_pattern);

    let mut stream = pubsub.on_message();
    while let Some(msg) = stream.next().await {
        let channel = msg.get_channel_name().to_string();
        let payload: String = match msg.get_payload() {
            Ok(p) => p,
            Err(e) => {
                warn!("Non-text telemetry payload on {}: {}", channel, e);
                continue;
            }
        };

        coordinator.ingest(&channel, &payload).await;
    }

    Ok(())
}
