//! Application Startup
//!
//! Application building, background task wiring, and server
//! initialization.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use axum::Router;
use chrono::Utc;
use sqlx::PgPool;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::application::Coordinator;
use crate::config::Settings;
use crate::domain::entities::DeviceRegistry;
use crate::infrastructure::database;
use crate::infrastructure::ingest::{self, TransportHealth};
use crate::infrastructure::repositories::{PgDeviceRegistry, PgSessionStore};
use crate::presentation::http::routes;
use crate::presentation::middleware::cors;
use crate::presentation::websocket::gateway::{self, Gateway};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub coordinator: Arc<Coordinator>,
    pub gateway: Arc<Gateway>,
    pub registry: Arc<dyn DeviceRegistry>,
    pub transport: TransportHealth,
    pub settings: Arc<Settings>,
}

/// Application instance
pub struct Application {
    listener: TcpListener,
    router: Router,
}

impl Application {
    /// Build the application from settings
    pub async fn build(settings: Settings) -> Result<Self> {
        // Create database pool and bring the schema up to date
        let db = database::create_pool(&settings.database).await?;
        database::run_migrations(&db).await?;
        tracing::info!("Database connection pool created");

        let store = Arc::new(PgSessionStore::new(db.clone()));
        let registry: Arc<dyn DeviceRegistry> = Arc::new(PgDeviceRegistry::new(db.clone()));

        let coordinator = Arc::new(Coordinator::new(
            store,
            registry.clone(),
            Duration::from_millis(settings.session.score_persist_throttle_ms),
        ));

        // WebSocket observer gateway, fed by coordinator broadcasts
        let ws_gateway = Arc::new(Gateway::new());
        let _ = gateway::spawn_fanout(ws_gateway.clone(), coordinator.clone());

        // Telemetry transport subscriber
        let transport = TransportHealth::new();
        let _ = ingest::spawn_subscriber(
            settings.redis.url.clone(),
            settings.ingest.clone(),
            coordinator.clone(),
            transport.clone(),
        );

        // Scheduled expiry check and snapshot push
        spawn_ticker(coordinator.clone(), settings.session.tick_interval_ms);

        crate::presentation::http::handlers::health::init_server_start();

        let state = AppState {
            db,
            coordinator,
            gateway: ws_gateway,
            registry,
            transport,
            settings: Arc::new(settings.clone()),
        };

        // Build router with middleware
        let router = routes::create_router(state)
            .layer(TraceLayer::new_for_http())
            .layer(cors::create_cors_layer(&settings.cors));

        // Bind to address
        let addr: SocketAddr = settings.server_addr().parse()?;
        let listener = TcpListener::bind(addr).await?;
        tracing::info!("Listening on {}", addr);

        Ok(Self { listener, router })
    }

    /// Run the server until stopped
    pub async fn run_until_stopped(self) -> Result<()> {
        axum::serve(self.listener, self.router).await?;
        Ok(())
    }

    /// Get the bound address
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }
}

/// Spawn the fixed-cadence tick task driving expiry and snapshot pushes.
fn spawn_ticker(coordinator: Arc<Coordinator>, interval_ms: u64) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_millis(interval_ms));
        loop {
            interval.tick().await;
            if let Err(e) = coordinator.tick(Utc::now()).await {
                tracing::warn!(error = %e, "Tick failed");
            }
        }
    });
}
