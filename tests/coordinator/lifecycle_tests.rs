//! Session Lifecycle Tests

use std::sync::Arc;

use chrono::{Duration, Utc};
use pretty_assertions::assert_eq;
use uuid::Uuid;

use arena_server::application::decoder::BROADCAST_CHANNEL;
use arena_server::application::Coordinator;
use arena_server::application::dto::request::{
    CreateSessionRequest, PlayerSlotRequest, UpdateSessionRequest,
};
use arena_server::application::dto::response::SnapshotResponse;
use arena_server::domain::entities::SessionStatus;
use arena_server::shared::error::AppError;

use crate::common;

pub fn create_request(players: &[(&str, &str)], duration_seconds: u32) -> CreateSessionRequest {
    CreateSessionRequest {
        players: players
            .iter()
            .map(|(d, n)| PlayerSlotRequest {
                device_number: d.to_string(),
                player_name: n.to_string(),
            })
            .collect(),
        duration_seconds,
    }
}

pub fn session_id(snapshot: &SnapshotResponse) -> Uuid {
    snapshot.session.id.parse().unwrap()
}

fn score_payload(device: &str, ok: u32, wrong: u32) -> String {
    format!("{},Status,x,x,{},{},0,1.2,0.8", device, ok, wrong)
}

#[tokio::test]
async fn full_lifecycle_completes_with_winner() {
    let h = common::harness().await;

    let snapshot = h
        .coordinator
        .create_session(create_request(&[("D1", "Alice"), ("D2", "Bob")], 60))
        .await
        .unwrap();
    assert_eq!(snapshot.session.status, SessionStatus::Pending);
    assert_eq!(snapshot.remaining_seconds, 60);
    assert!(snapshot.winner.is_none());
    let id = session_id(&snapshot);

    let snapshot = h.coordinator.start(id).await.unwrap();
    assert_eq!(snapshot.session.status, SessionStatus::Active);
    assert!(snapshot.session.start_time.is_some());

    h.coordinator
        .ingest(BROADCAST_CHANNEL, &score_payload("D1", 5, 0))
        .await;
    h.coordinator
        .ingest(BROADCAST_CHANNEL, &score_payload("D2", 3, 0))
        .await;

    let snapshot = h.coordinator.snapshot(id, Utc::now()).await.unwrap();
    let d1 = snapshot
        .slots
        .iter()
        .find(|s| s.device_number == "D1")
        .unwrap();
    assert_eq!(d1.ok_pressed, 5);

    // Drive past expiry; the tick transitions to completed.
    h.coordinator
        .tick(Utc::now() + Duration::seconds(61))
        .await
        .unwrap();

    let snapshot = h.coordinator.snapshot(id, Utc::now()).await.unwrap();
    assert_eq!(snapshot.session.status, SessionStatus::Completed);
    assert_eq!(snapshot.remaining_seconds, 0);
    assert_eq!(snapshot.winner.as_deref(), Some("D1"));

    // Completion is written through to the store.
    let stored = h.store.get(id).await.unwrap();
    assert_eq!(stored.status, SessionStatus::Completed);
    assert!(stored.end_time.is_some());
}

#[tokio::test]
async fn create_conflicts_while_previous_session_is_live() {
    let h = common::harness().await;

    let snapshot = h
        .coordinator
        .create_session(create_request(&[("D1", "Alice")], 60))
        .await
        .unwrap();
    let id = session_id(&snapshot);

    let err = h
        .coordinator
        .create_session(create_request(&[("D2", "Bob")], 60))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    // A cancelled session no longer blocks creation.
    h.coordinator.cancel(id).await.unwrap();
    h.coordinator
        .create_session(create_request(&[("D2", "Bob")], 60))
        .await
        .unwrap();
}

#[tokio::test]
async fn update_is_rejected_after_start() {
    let h = common::harness().await;

    let snapshot = h
        .coordinator
        .create_session(create_request(&[("D1", "Alice")], 60))
        .await
        .unwrap();
    let id = session_id(&snapshot);
    h.coordinator.start(id).await.unwrap();

    let err = h
        .coordinator
        .update(
            id,
            UpdateSessionRequest {
                players: None,
                duration_seconds: Some(120),
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    // Duration survives the rejected update.
    let snapshot = h.coordinator.snapshot(id, Utc::now()).await.unwrap();
    assert_eq!(snapshot.session.duration_seconds, 60);
}

#[tokio::test]
async fn update_replaces_roster_on_pending_session() {
    let h = common::harness().await;

    let snapshot = h
        .coordinator
        .create_session(create_request(&[("D1", "Alice")], 60))
        .await
        .unwrap();
    let id = session_id(&snapshot);

    let snapshot = h
        .coordinator
        .update(
            id,
            UpdateSessionRequest {
                players: Some(vec![
                    PlayerSlotRequest {
                        device_number: "D2".into(),
                        player_name: "Bob".into(),
                    },
                    PlayerSlotRequest {
                        device_number: "D3".into(),
                        player_name: "Carol".into(),
                    },
                ]),
                duration_seconds: Some(120),
            },
        )
        .await
        .unwrap();

    assert_eq!(snapshot.session.duration_seconds, 120);
    let devices: Vec<_> = snapshot
        .slots
        .iter()
        .map(|s| s.device_number.as_str())
        .collect();
    assert_eq!(devices, vec!["D2", "D3"]);
}

#[tokio::test]
async fn offline_or_unknown_devices_are_rejected_at_creation() {
    let h = common::harness().await;

    // Unknown device.
    let err = h
        .coordinator
        .create_session(create_request(&[("D9", "Eve")], 60))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    // Registered but stale heartbeat (over the 300 second window).
    h.registry
        .seed("STALE", Utc::now() - Duration::seconds(301))
        .await;
    let err = h
        .coordinator
        .create_session(create_request(&[("STALE", "Eve")], 60))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
}

#[tokio::test]
async fn edit_window_suspends_telemetry_and_ticks() {
    let h = common::harness().await;

    let snapshot = h
        .coordinator
        .create_session(create_request(&[("D1", "Alice")], 60))
        .await
        .unwrap();
    let id = session_id(&snapshot);
    h.coordinator.start(id).await.unwrap();

    h.coordinator.begin_edit(id).await.unwrap();

    // Telemetry during the window is discarded, not queued.
    h.coordinator
        .ingest(BROADCAST_CHANNEL, &score_payload("D1", 5, 0))
        .await;
    let snapshot = h.coordinator.snapshot(id, Utc::now()).await.unwrap();
    assert_eq!(snapshot.slots[0].ok_pressed, 0);

    // Ticks are suspended too: the session survives past its expiry.
    h.coordinator
        .tick(Utc::now() + Duration::seconds(120))
        .await
        .unwrap();
    let snapshot = h.coordinator.snapshot(id, Utc::now()).await.unwrap();
    assert_eq!(snapshot.session.status, SessionStatus::Active);

    // Closing the window resumes ingestion; the discarded event stays
    // lost and only post-window telemetry lands.
    h.coordinator.discard_edit(id).await.unwrap();
    h.coordinator
        .ingest(BROADCAST_CHANNEL, &score_payload("D1", 2, 1))
        .await;
    let snapshot = h.coordinator.snapshot(id, Utc::now()).await.unwrap();
    assert_eq!(snapshot.slots[0].ok_pressed, 2);
    assert_eq!(snapshot.slots[0].wrong_pressed, 1);
}

#[tokio::test]
async fn commit_edit_applies_staged_update() {
    let h = common::harness().await;

    let snapshot = h
        .coordinator
        .create_session(create_request(&[("D1", "Alice")], 60))
        .await
        .unwrap();
    let id = session_id(&snapshot);

    h.coordinator.begin_edit(id).await.unwrap();

    // Double begin is a conflict while the window is open.
    let err = h.coordinator.begin_edit(id).await.unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    let snapshot = h
        .coordinator
        .commit_edit(
            id,
            UpdateSessionRequest {
                players: None,
                duration_seconds: Some(300),
            },
        )
        .await
        .unwrap();
    assert_eq!(snapshot.session.duration_seconds, 300);

    // The window closed with the commit.
    let err = h
        .coordinator
        .commit_edit(id, UpdateSessionRequest::default())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));
}

#[tokio::test]
async fn failed_commit_still_closes_the_window() {
    let h = common::harness().await;

    let snapshot = h
        .coordinator
        .create_session(create_request(&[("D1", "Alice")], 60))
        .await
        .unwrap();
    let id = session_id(&snapshot);
    h.coordinator.start(id).await.unwrap();

    h.coordinator.begin_edit(id).await.unwrap();

    // Updates are pending-only, so committing against an active session
    // fails, but the suspend flag clears regardless.
    let err = h
        .coordinator
        .commit_edit(
            id,
            UpdateSessionRequest {
                players: None,
                duration_seconds: Some(120),
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    h.coordinator
        .ingest(BROADCAST_CHANNEL, &score_payload("D1", 1, 0))
        .await;
    let snapshot = h.coordinator.snapshot(id, Utc::now()).await.unwrap();
    assert_eq!(snapshot.slots[0].ok_pressed, 1);
}

#[tokio::test]
async fn completion_is_retried_after_a_failed_persist() {
    let store = Arc::new(common::FlakySessionStore::new());
    let registry = Arc::new(common::InMemoryDeviceRegistry::new());
    registry.seed("D1", Utc::now()).await;
    let coordinator = Coordinator::new(
        store.clone(),
        registry,
        std::time::Duration::from_millis(0),
    );

    let snapshot = coordinator
        .create_session(create_request(&[("D1", "Alice")], 60))
        .await
        .unwrap();
    let id = session_id(&snapshot);
    coordinator.start(id).await.unwrap();

    // The store goes down exactly when the session expires. The live
    // view completes; the stored copy is still active.
    store.set_fail_updates(true);
    coordinator
        .tick(Utc::now() + Duration::seconds(61))
        .await
        .unwrap();
    let live = coordinator.snapshot(id, Utc::now()).await.unwrap();
    assert_eq!(live.session.status, SessionStatus::Completed);
    let stored = store.get(id).await.unwrap();
    assert_eq!(stored.status, SessionStatus::Active);
    assert!(stored.end_time.is_none());

    // The first tick after recovery writes the transition through.
    store.set_fail_updates(false);
    coordinator
        .tick(Utc::now() + Duration::seconds(62))
        .await
        .unwrap();
    let stored = store.get(id).await.unwrap();
    assert_eq!(stored.status, SessionStatus::Completed);
    assert!(stored.end_time.is_some());
}

#[tokio::test]
async fn previous_session_remains_readable_after_replacement() {
    let h = common::harness().await;

    let first = h
        .coordinator
        .create_session(create_request(&[("D1", "Alice")], 60))
        .await
        .unwrap();
    let first_id = session_id(&first);
    h.coordinator.cancel(first_id).await.unwrap();

    let second = h
        .coordinator
        .create_session(create_request(&[("D2", "Bob")], 90))
        .await
        .unwrap();
    let second_id = session_id(&second);

    // The replaced session is served from the store.
    let snapshot = h.coordinator.snapshot(first_id, Utc::now()).await.unwrap();
    assert_eq!(snapshot.session.status, SessionStatus::Cancelled);
    assert_eq!(snapshot.remaining_seconds, 0);

    let progress = h.coordinator.progress(second_id, Utc::now()).await.unwrap();
    assert_eq!(progress.status, SessionStatus::Pending);
    assert_eq!(progress.remaining_seconds, 90);

    let err = h
        .coordinator
        .snapshot(Uuid::new_v4(), Utc::now())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}
