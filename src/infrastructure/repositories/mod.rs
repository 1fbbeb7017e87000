//! Repository Implementations
//!
//! PostgreSQL-backed implementations of the domain repository traits.

pub mod device_registry;
pub mod session_store;

pub use device_registry::PgDeviceRegistry;
pub use session_store::PgSessionStore;
