//! Presentation Layer
//!
//! HTTP API and WebSocket observer surfaces.

pub mod http;
pub mod middleware;
pub mod websocket;
