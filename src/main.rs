//! # Arena Server
//!
//! Session lifecycle and real-time telemetry coordinator for networked
//! buzzer devices.
//!
//! This is the application entry point that initializes:
//! - Tracing/logging subsystem
//! - Configuration loading
//! - Database connection pool
//! - Telemetry transport subscriber
//! - HTTP/WebSocket server

use anyhow::Result;
use tracing::info;

use arena_server::config::Settings;
use arena_server::startup::Application;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing subscriber for structured logging
    arena_server::observability::init_tracing();

    info!("Starting Arena Server...");

    // Load configuration from environment and config files
    let settings = Settings::load()?;
    info!(
        host = %settings.server.host,
        port = %settings.server.port,
        environment = %settings.environment,
        "Configuration loaded"
    );

    // Build and run the application
    let application = Application::build(settings).await?;

    info!("Server ready to accept connections");
    application.run_until_stopped().await?;

    Ok(())
}
