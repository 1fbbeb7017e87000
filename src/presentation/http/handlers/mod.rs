//! HTTP Handlers

pub mod device;
pub mod health;
pub mod session;
