//! Data Transfer Objects
//!
//! Request and response shapes for the operator API and the observer
//! gateway.

pub mod request;
pub mod response;
