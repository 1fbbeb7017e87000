//! Device API Tests

use axum::http::StatusCode;
use axum_test::TestServer;
use serde_json::Value;

use crate::common;

#[tokio::test]
async fn test_list_devices_reports_liveness() {
    let (router, _h) = common::test_router().await;
    let server = TestServer::new(router).unwrap();

    let response = server.get("/api/v1/devices").await;
    response.assert_status_ok();

    let body: Value = response.json();
    let devices = body.as_array().unwrap();
    assert_eq!(devices.len(), common::SEEDED_DEVICES.len());
    assert!(devices.iter().all(|d| d["online"] == true));
}

#[tokio::test]
async fn test_heartbeat_registers_new_device() {
    let (router, h) = common::test_router().await;
    let server = TestServer::new(router).unwrap();

    let response = server.post("/api/v1/devices/D7/heartbeat").await;
    assert_eq!(response.status_code(), StatusCode::NO_CONTENT);

    assert!(h.registry.heartbeat_of("D7").await.is_some());

    let body: Value = server.get("/api/v1/devices").await.json();
    let devices = body.as_array().unwrap();
    let d7 = devices
        .iter()
        .find(|d| d["device_number"] == "D7")
        .unwrap();
    assert_eq!(d7["online"], true);
}
