//! Common Test Utilities
//!
//! In-memory repository fakes and fixtures shared across the test
//! modules. The coordinator is exercised against these fakes so the
//! full lifecycle runs without PostgreSQL or Redis.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use uuid::Uuid;

use arena_server::application::Coordinator;
use arena_server::config::{
    CorsSettings, DatabaseSettings, IngestSettings, RedisSettings, ServerSettings,
    SessionRuntimeSettings, Settings,
};
use arena_server::domain::entities::{
    DeviceRecord, DeviceRegistry, GameSession, ScoreState, SessionStore,
};
use arena_server::infrastructure::ingest::TransportHealth;
use arena_server::presentation::http::create_router;
use arena_server::presentation::websocket::Gateway;
use arena_server::shared::error::AppError;
use arena_server::startup::AppState;

/// Devices seeded with fresh heartbeats in every harness
pub const SEEDED_DEVICES: [&str; 3] = ["D1", "D2", "D3"];

/// In-memory session store
#[derive(Default)]
pub struct InMemorySessionStore {
    sessions: Mutex<HashMap<Uuid, GameSession>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Persisted copy of a session, for asserting on write-through
    pub async fn get(&self, id: Uuid) -> Option<GameSession> {
        self.sessions.lock().await.get(&id).cloned()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn insert(&self, session: &GameSession) -> Result<(), AppError> {
        self.sessions
            .lock()
            .await
            .insert(session.id, session.clone());
        Ok(())
    }

    async fn update(&self, session: &GameSession) -> Result<(), AppError> {
        self.sessions
            .lock()
            .await
            .insert(session.id, session.clone());
        Ok(())
    }

    async fn save_scores(
        &self,
        session_id: Uuid,
        scores: &HashMap<String, ScoreState>,
    ) -> Result<(), AppError> {
        let mut sessions = self.sessions.lock().await;
        if let Some(session) = sessions.get_mut(&session_id) {
            session.set_scores(scores);
        }
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<GameSession>, AppError> {
        Ok(self.sessions.lock().await.get(&id).cloned())
    }
}

/// Session store whose update calls can be switched to fail, for
/// exercising persistence outages.
#[derive(Default)]
pub struct FlakySessionStore {
    inner: InMemorySessionStore,
    fail_updates: AtomicBool,
}

impl FlakySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_fail_updates(&self, fail: bool) {
        self.fail_updates.store(fail, Ordering::SeqCst);
    }

    pub async fn get(&self, id: Uuid) -> Option<GameSession> {
        self.inner.get(id).await
    }
}

#[async_trait]
impl SessionStore for FlakySessionStore {
    async fn insert(&self, session: &GameSession) -> Result<(), AppError> {
        self.inner.insert(session).await
    }

    async fn update(&self, session: &GameSession) -> Result<(), AppError> {
        if self.fail_updates.load(Ordering::SeqCst) {
            return Err(AppError::Internal("session store unavailable".into()));
        }
        self.inner.update(session).await
    }

    async fn save_scores(
        &self,
        session_id: Uuid,
        scores: &HashMap<String, ScoreState>,
    ) -> Result<(), AppError> {
        self.inner.save_scores(session_id, scores).await
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<GameSession>, AppError> {
        self.inner.find_by_id(id).await
    }
}

/// In-memory device registry
#[derive(Default)]
pub struct InMemoryDeviceRegistry {
    devices: Mutex<HashMap<String, DeviceRecord>>,
}

impl InMemoryDeviceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn seed(&self, device_number: &str, last_heartbeat_at: DateTime<Utc>) {
        self.devices.lock().await.insert(
            device_number.to_string(),
            DeviceRecord {
                device_number: device_number.to_string(),
                label: None,
                last_heartbeat_at,
            },
        );
    }

    pub async fn heartbeat_of(&self, device_number: &str) -> Option<DateTime<Utc>> {
        self.devices
            .lock()
            .await
            .get(device_number)
            .map(|r| r.last_heartbeat_at)
    }
}

#[async_trait]
impl DeviceRegistry for InMemoryDeviceRegistry {
    async fn all(&self) -> Result<Vec<DeviceRecord>, AppError> {
        let mut records: Vec<_> = self.devices.lock().await.values().cloned().collect();
        records.sort_by(|a, b| a.device_number.cmp(&b.device_number));
        Ok(records)
    }

    async fn find_by_numbers(&self, numbers: &[String]) -> Result<Vec<DeviceRecord>, AppError> {
        let devices = self.devices.lock().await;
        Ok(numbers
            .iter()
            .filter_map(|n| devices.get(n).cloned())
            .collect())
    }

    async fn touch(&self, device_number: &str, now: DateTime<Utc>) -> Result<(), AppError> {
        let mut devices = self.devices.lock().await;
        devices
            .entry(device_number.to_string())
            .and_modify(|r| r.last_heartbeat_at = now)
            .or_insert_with(|| DeviceRecord {
                device_number: device_number.to_string(),
                label: None,
                last_heartbeat_at: now,
            });
        Ok(())
    }
}

/// Coordinator wired to in-memory fakes
pub struct TestHarness {
    pub coordinator: Arc<Coordinator>,
    pub store: Arc<InMemorySessionStore>,
    pub registry: Arc<InMemoryDeviceRegistry>,
}

/// Build a harness with all seeded devices online. The persistence
/// throttle is zero so every score event writes through immediately.
pub async fn harness() -> TestHarness {
    let store = Arc::new(InMemorySessionStore::new());
    let registry = Arc::new(InMemoryDeviceRegistry::new());
    for device in SEEDED_DEVICES {
        registry.seed(device, Utc::now()).await;
    }

    let coordinator = Arc::new(Coordinator::new(
        store.clone(),
        registry.clone(),
        Duration::from_millis(0),
    ));

    TestHarness {
        coordinator,
        store,
        registry,
    }
}

pub fn test_settings() -> Settings {
    Settings {
        server: ServerSettings {
            host: "127.0.0.1".into(),
            port: 0,
        },
        database: DatabaseSettings {
            // Port 1 is never a listening PostgreSQL; readiness checks
            // against this URL must fail fast.
            url: "postgres://127.0.0.1:1/arena_test".into(),
            max_connections: 1,
            min_connections: 0,
            acquire_timeout: 1,
        },
        redis: RedisSettings {
            url: "redis://127.0.0.1:1".into(),
        },
        ingest: IngestSettings {
            channel_pattern: "devices/*".into(),
            reconnect_base_ms: 100,
            reconnect_max_ms: 1000,
        },
        session: SessionRuntimeSettings {
            tick_interval_ms: 1000,
            score_persist_throttle_ms: 0,
        },
        cors: CorsSettings {
            allowed_origins: vec![],
            max_age_seconds: 3600,
        },
        environment: "test".into(),
    }
}

/// Router over a harness-backed AppState. The database pool is lazy and
/// points nowhere; only the readiness probe touches it.
pub async fn test_router() -> (Router, TestHarness) {
    let h = harness().await;
    let settings = test_settings();

    let db = sqlx::postgres::PgPoolOptions::new()
        .max_connections(settings.database.max_connections)
        .acquire_timeout(Duration::from_secs(settings.database.acquire_timeout))
        .connect_lazy(&settings.database.url)
        .expect("lazy pool creation cannot fail");

    let state = AppState {
        db,
        coordinator: h.coordinator.clone(),
        gateway: Arc::new(Gateway::new()),
        registry: h.registry.clone(),
        transport: TransportHealth::new(),
        settings: Arc::new(settings),
    };

    (create_router(state), h)
}
