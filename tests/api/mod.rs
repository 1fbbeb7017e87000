//! REST API Tests

mod device_tests;
mod health_tests;
mod session_tests;
