//! Lifecycle manager tests against the public library API.
//!
//! Covers the concurrency guarantee on first transitions and the
//! documented end-to-end scenarios without the HTTP layer.

use chrono::{DateTime, Duration, TimeZone, Utc};
use common::clock::ManualClock;
use session_service::errors::SessionError;
use session_service::models::{
    CreateSessionRequest, LifecycleEvent, ParticipantRole, SessionStatus,
};
use session_service::repositories::{InMemorySessionStore, SessionStore};
use session_service::services::{
    compose, LifecycleManager, LifecycleSettings, SequentialIdGenerator,
};
use std::sync::Arc;

fn t() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2030, 11, 3, 14, 0, 0)
        .single()
        .unwrap_or_default()
}

fn setup() -> (Arc<LifecycleManager>, Arc<ManualClock>, Arc<InMemorySessionStore>) {
    let clock = Arc::new(ManualClock::new(t()));
    let store = Arc::new(InMemorySessionStore::new());
    let manager = Arc::new(LifecycleManager::new(
        store.clone(),
        clock.clone(),
        Arc::new(SequentialIdGenerator::new()),
        LifecycleSettings {
            join_base_url: "https://tutoring.test/join".to_string(),
            recording_base_url: "https://media.tutoring.test".to_string(),
            default_duration: Duration::minutes(60),
            recording_retention: Duration::days(30),
        },
    ));
    (manager, clock, store)
}

fn scheduled(invitees: &[&str]) -> CreateSessionRequest {
    CreateSessionRequest {
        host_id: Some("h1".to_string()),
        participant_ids: invitees.iter().map(|s| (*s).to_string()).collect(),
        scheduled_start: Some(t()),
        scheduled_end: Some(t() + Duration::hours(1)),
        ..Default::default()
    }
}

#[tokio::test]
async fn test_concurrent_joins_record_one_first_join() -> Result<(), anyhow::Error> {
    let (manager, clock, store) = setup();
    let callers: Vec<String> = (0..32).map(|i| format!("p{i}")).collect();
    let refs: Vec<&str> = callers.iter().map(String::as_str).collect();
    let session = manager.create(scheduled(&refs)).await?;
    let id = session.id;

    clock.set(t() + Duration::minutes(1));

    let joins = callers.iter().map(|caller| {
        let manager = manager.clone();
        let caller = caller.clone();
        tokio::spawn(async move { manager.join(id, &caller).await })
    });
    let outcomes = futures::future::join_all(joins).await;

    let mut first = 0;
    for outcome in outcomes {
        let outcome = outcome??;
        assert_eq!(outcome.role, ParticipantRole::Participant);
        if outcome.first_join {
            first += 1;
        }
    }
    assert_eq!(first, 1);

    let stored = store.get(id).await?.ok_or_else(|| anyhow::anyhow!("missing"))?;
    assert_eq!(stored.status, SessionStatus::InProgress);
    assert_eq!(stored.actual_start, Some(t() + Duration::minutes(1)));

    Ok(())
}

#[tokio::test]
async fn test_concurrent_end_and_join_leave_session_completed() -> Result<(), anyhow::Error> {
    let (manager, clock, _) = setup();
    let session = manager.create(scheduled(&["p1"])).await?;
    let id = session.id;

    clock.set(t() + Duration::minutes(10));
    manager.join(id, "h1").await?;

    let ends = (0..8).map(|_| {
        let manager = manager.clone();
        tokio::spawn(async move { manager.end(id).await })
    });
    let outcomes = futures::future::join_all(ends).await;

    let mut first = 0;
    for outcome in outcomes {
        if outcome??.first_end {
            first += 1;
        }
    }
    assert_eq!(first, 1);

    let err = manager.join(id, "p1").await;
    assert_eq!(
        err.err(),
        Some(SessionError::AccessDenied("session ended".to_string()))
    );

    Ok(())
}

#[tokio::test]
async fn test_cancelled_session_has_recording_without_duration() -> Result<(), anyhow::Error> {
    let (manager, clock, _) = setup();
    let session = manager.create(scheduled(&["p1"])).await?;

    clock.set(t() - Duration::hours(2));
    let ended = manager.end(session.id).await?;
    assert_eq!(ended.session.status, SessionStatus::Completed);
    assert_eq!(ended.session.actual_end, Some(t() - Duration::hours(2)));

    let recordings = manager.list_recordings(session.id).await?;
    assert_eq!(recordings.len(), 1);
    assert_eq!(recordings[0].duration_minutes, None);

    let payloads = compose(&ended.session, LifecycleEvent::Ended);
    assert_eq!(payloads.len(), 1);
    assert_eq!(payloads[0].recipient_ids.len(), 2);

    Ok(())
}

#[tokio::test]
async fn test_failed_join_does_not_write() -> Result<(), anyhow::Error> {
    let (manager, clock, store) = setup();
    let session = manager.create(scheduled(&["p1"])).await?;
    let before = store.get(session.id).await?;

    clock.set(t() + Duration::hours(2));
    assert!(manager.join(session.id, "p1").await.is_err());

    assert_eq!(store.get(session.id).await?, before);

    Ok(())
}
