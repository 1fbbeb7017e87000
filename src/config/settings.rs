//! Application settings and configuration structures.

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

/// Root configuration structure containing all application settings.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Server configuration (host, port)
    pub server: ServerSettings,

    /// Database configuration (PostgreSQL)
    pub database: DatabaseSettings,

    /// Redis configuration (telemetry transport)
    pub redis: RedisSettings,

    /// Telemetry ingestion settings
    pub ingest: IngestSettings,

    /// Session runtime settings (tick cadence, persistence throttle)
    pub session: SessionRuntimeSettings,

    /// CORS configuration
    pub cors: CorsSettings,

    /// Current environment (development, staging, production)
    pub environment: String,
}

/// Server binding configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    /// Host address to bind to (e.g., "0.0.0.0")
    pub host: String,

    /// Port number to listen on
    pub port: u16,
}

/// PostgreSQL database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    /// Database connection URL
    pub url: String,

    /// Maximum number of connections in the pool
    pub max_connections: u32,

    /// Minimum number of connections to maintain
    pub min_connections: u32,

    /// Connection acquire timeout in seconds
    pub acquire_timeout: u64,
}

/// Redis configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct RedisSettings {
    /// Redis connection URL
    pub url: String,
}

/// Telemetry ingestion configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct IngestSettings {
    /// Pub/sub pattern the subscriber listens on (e.g., "devices/*").
    /// The decoder only acts on the all-devices broadcast channel;
    /// messages on other matching channels are ignored.
    pub channel_pattern: String,

    /// Initial reconnect backoff in milliseconds
    pub reconnect_base_ms: u64,

    /// Maximum reconnect backoff in milliseconds
    pub reconnect_max_ms: u64,
}

/// Session runtime configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionRuntimeSettings {
    /// Coordinator tick interval in milliseconds (expiry check + snapshot push)
    pub tick_interval_ms: u64,

    /// Minimum interval between score persistence writes in milliseconds
    pub score_persist_throttle_ms: u64,
}

/// CORS configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct CorsSettings {
    /// Allowed origins (comma-separated in env)
    pub allowed_origins: Vec<String>,

    /// How long browsers may cache preflight responses, in seconds
    pub max_age_seconds: u64,
}

impl Settings {
    /// Load settings from environment variables and configuration files.
    ///
    /// The loading order is:
    /// 1. config/default.toml (base configuration)
    /// 2. config/{RUN_ENV}.toml (environment-specific overrides)
    /// 3. Environment variables (highest priority)
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if configuration cannot be loaded or parsed.
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        // Determine the running environment
        let environment = std::env::var("RUN_ENV").unwrap_or_else(|_| "development".into());

        Config::builder()
            // Start with default values
            .set_default("environment", environment.clone())?
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 3000)?
            .set_default("database.max_connections", 10)?
            .set_default("database.min_connections", 2)?
            .set_default("database.acquire_timeout", 30)?
            .set_default("ingest.channel_pattern", "devices/*")?
            .set_default("ingest.reconnect_base_ms", 500)?
            .set_default("ingest.reconnect_max_ms", 30000)?
            .set_default("session.tick_interval_ms", 1000)?
            .set_default("session.score_persist_throttle_ms", 2000)?
            .set_default("cors.allowed_origins", vec!["http://localhost:3000"])?
            .set_default("cors.max_age_seconds", 3600)?
            // Load from config files
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            // Load from environment variables
            // APP__SERVER__PORT=3000 -> server.port = 3000
            .add_source(
                Environment::default()
                    .prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            // Map simple environment variables
            .set_override_option("server.host", std::env::var("SERVER_HOST").ok())?
            .set_override_option("server.port", std::env::var("SERVER_PORT").ok())?
            .set_override_option("database.url", std::env::var("DATABASE_URL").ok())?
            .set_override_option("redis.url", std::env::var("REDIS_URL").ok())?
            .build()?
            .try_deserialize()
    }

    /// Get the full server address as a string.
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
