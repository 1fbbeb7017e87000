//! Health Check API Tests

use axum::http::StatusCode;
use axum_test::TestServer;
use serde_json::Value;

use crate::common;

#[tokio::test]
async fn test_health_check_returns_ok() {
    let (router, _h) = common::test_router().await;
    let server = TestServer::new(router).unwrap();

    let response = server.get("/health").await;
    response.assert_status_ok();

    let body: Value = response.json();
    assert_eq!(body["status"], "healthy");
    assert!(body["version"].is_string());
}

#[tokio::test]
async fn test_liveness_probe() {
    let (router, _h) = common::test_router().await;
    let server = TestServer::new(router).unwrap();

    let response = server.get("/health/live").await;
    response.assert_status_ok();

    let body: Value = response.json();
    assert_eq!(body["status"], "alive");
}

#[tokio::test]
async fn test_readiness_reports_unreachable_database() {
    // The test pool points at a port nothing listens on, so the
    // readiness probe must report the database as down.
    let (router, _h) = common::test_router().await;
    let server = TestServer::new(router).unwrap();

    let response = server.get("/health/ready").await;
    assert_eq!(response.status_code(), StatusCode::SERVICE_UNAVAILABLE);

    let body: Value = response.json();
    assert_eq!(body["status"], "unhealthy");
    assert_eq!(body["checks"]["database"]["status"], "unhealthy");
}

#[tokio::test]
async fn test_metrics_endpoint_exposes_prometheus_text() {
    let (router, _h) = common::test_router().await;
    let server = TestServer::new(router).unwrap();

    let response = server.get("/metrics").await;
    response.assert_status_ok();
    assert!(response.text().contains("arena_server"));
}

#[tokio::test]
async fn test_security_headers_present_on_responses() {
    let (router, _h) = common::test_router().await;
    let server = TestServer::new(router).unwrap();

    let response = server.get("/health").await;
    assert_eq!(
        response.headers().get("x-content-type-options").unwrap(),
        "nosniff"
    );
    assert_eq!(response.headers().get("x-frame-options").unwrap(), "DENY");
}
