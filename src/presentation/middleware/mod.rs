//! Middleware Components

pub mod cors;
pub mod security;

pub use cors::create_cors_layer;
pub use security::{create_security_headers_layer, SecurityHeadersLayer};
