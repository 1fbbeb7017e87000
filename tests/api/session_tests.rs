//! Session API Tests

use axum::http::StatusCode;
use axum_test::TestServer;
use serde_json::{json, Value};

use crate::common;

fn create_body() -> Value {
    json!({
        "players": [
            {"device_number": "D1", "player_name": "Alice"},
            {"device_number": "D2", "player_name": "Bob"}
        ],
        "duration_seconds": 60
    })
}

#[tokio::test]
async fn test_create_session_returns_created_snapshot() {
    let (router, _h) = common::test_router().await;
    let server = TestServer::new(router).unwrap();

    let response = server.post("/api/v1/sessions").json(&create_body()).await;
    assert_eq!(response.status_code(), StatusCode::CREATED);

    let body: Value = response.json();
    assert_eq!(body["session"]["status"], "pending");
    assert_eq!(body["remaining_seconds"], 60);
    assert_eq!(body["slots"].as_array().unwrap().len(), 2);
    assert_eq!(body["slots"][0]["device_number"], "D1");
    assert_eq!(body["slots"][0]["online"], true);
}

#[tokio::test]
async fn test_create_session_validates_roster_and_duration() {
    let (router, _h) = common::test_router().await;
    let server = TestServer::new(router).unwrap();

    // Empty roster.
    let response = server
        .post("/api/v1/sessions")
        .json(&json!({"players": [], "duration_seconds": 60}))
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);

    // Duration out of range.
    let response = server
        .post("/api/v1/sessions")
        .json(&json!({
            "players": [{"device_number": "D1", "player_name": "Alice"}],
            "duration_seconds": 601
        }))
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);

    let body: Value = response.json();
    assert_eq!(body["code"], 20004);
}

#[tokio::test]
async fn test_create_session_rejects_unknown_device() {
    let (router, _h) = common::test_router().await;
    let server = TestServer::new(router).unwrap();

    let response = server
        .post("/api/v1/sessions")
        .json(&json!({
            "players": [{"device_number": "D9", "player_name": "Eve"}],
            "duration_seconds": 60
        }))
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_session_lifecycle_over_http() {
    let (router, _h) = common::test_router().await;
    let server = TestServer::new(router).unwrap();

    let created: Value = server
        .post("/api/v1/sessions")
        .json(&create_body())
        .await
        .json();
    let id = created["session"]["id"].as_str().unwrap().to_string();

    // Start the session.
    let response = server.post(&format!("/api/v1/sessions/{}/start", id)).await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["session"]["status"], "active");

    // Progress shows a running countdown.
    let response = server
        .get(&format!("/api/v1/sessions/{}/progress", id))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["status"], "active");
    assert!(body["remaining_seconds"].as_u64().unwrap() <= 60);

    // Updating an active session is a conflict.
    let response = server
        .patch(&format!("/api/v1/sessions/{}", id))
        .json(&json!({"duration_seconds": 120}))
        .await;
    assert_eq!(response.status_code(), StatusCode::CONFLICT);
    let body: Value = response.json();
    assert_eq!(body["code"], 20003);

    // Cancel.
    let response = server.post(&format!("/api/v1/sessions/{}/cancel", id)).await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["session"]["status"], "cancelled");
    assert_eq!(body["remaining_seconds"], 0);
}

#[tokio::test]
async fn test_edit_window_over_http() {
    let (router, _h) = common::test_router().await;
    let server = TestServer::new(router).unwrap();

    let created: Value = server
        .post("/api/v1/sessions")
        .json(&create_body())
        .await
        .json();
    let id = created["session"]["id"].as_str().unwrap().to_string();

    let response = server.post(&format!("/api/v1/sessions/{}/edit", id)).await;
    assert_eq!(response.status_code(), StatusCode::NO_CONTENT);

    let response = server
        .put(&format!("/api/v1/sessions/{}/edit", id))
        .json(&json!({"duration_seconds": 300}))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["session"]["duration_seconds"], 300);

    // Discard without an open window is a conflict.
    let response = server.delete(&format!("/api/v1/sessions/{}/edit", id)).await;
    assert_eq!(response.status_code(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_unknown_and_malformed_session_ids() {
    let (router, _h) = common::test_router().await;
    let server = TestServer::new(router).unwrap();

    let response = server
        .get("/api/v1/sessions/00000000-0000-0000-0000-000000000000")
        .await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
    let body: Value = response.json();
    assert_eq!(body["code"], 20001);

    let response = server.get("/api/v1/sessions/not-a-uuid").await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["code"], 20002);
}
