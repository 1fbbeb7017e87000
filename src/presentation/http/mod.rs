//! HTTP API
//!
//! REST routes and handlers for the operator surface.

pub mod handlers;
pub mod routes;

pub use routes::create_router;
