//! Configuration Management

mod settings;

pub use settings::{
    CorsSettings, DatabaseSettings, IngestSettings, RedisSettings, ServerSettings,
    SessionRuntimeSettings, Settings,
};
