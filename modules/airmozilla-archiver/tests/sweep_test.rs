//! Sweeper passes over the in-memory event table.

use std::sync::Arc;

use chrono::Utc;
use serde_json::json;

use airmozilla_archiver::testing::{
    admins, test_event, MemoryEventStore, MockStatusSource, RecordingMailer, SAMPLE_MEDIALIST_XML,
};
use airmozilla_archiver::{Archiver, ArchiverConfig, EventStatus, Sweeper};

fn sweeper(
    store: Arc<MemoryEventStore>,
    status: Arc<MockStatusSource>,
    mailer: Arc<RecordingMailer>,
) -> Sweeper {
    Sweeper::new(Archiver::new(
        ArchiverConfig::new(admins(), "https://air.example.com"),
        status,
        store,
        mailer,
    ))
}

#[tokio::test]
async fn sweep_reconciles_every_pending_vidly_event() {
    let finished = test_event(1, "Vid.ly Test", json!({ "tag": "abc123" }));
    let errored = test_event(2, "Vid.ly Test", json!({ "tag": "xyz987" }));
    let unknown = test_event(3, "Vid.ly Test", json!({ "tag": "NOTKNOWN" }));
    let untagged = test_event(4, "Vid.ly Test", json!({}));
    let other_template = test_event(5, "Live Stream", json!({ "tag": "abc123" }));
    let mut already_archived = test_event(6, "Vid.ly Test", json!({ "tag": "abc123" }));
    already_archived.archive_time = Some(Utc::now());
    let mut scheduled = test_event(7, "Vid.ly Test", json!({ "tag": "abc123" }));
    scheduled.status = EventStatus::Scheduled;

    let store = Arc::new(MemoryEventStore::with_events(vec![
        finished,
        errored,
        unknown,
        untagged,
        other_template,
        already_archived,
        scheduled,
    ]));
    let status = Arc::new(MockStatusSource::new().respond_with_xml(SAMPLE_MEDIALIST_XML));
    let mailer = Arc::new(RecordingMailer::new());

    let stats = sweeper(store.clone(), status.clone(), mailer.clone())
        .run_once()
        .await
        .unwrap();

    assert_eq!(stats.checked, 4);
    assert_eq!(stats.scheduled, 1);
    assert_eq!(stats.notified, 2);
    assert_eq!(stats.skipped, 1);
    assert_eq!(stats.failed, 0);

    // Untagged event is skipped before the lookup.
    assert_eq!(status.requested_tags(), vec!["abc123", "xyz987", "NOTKNOWN"]);
    assert_eq!(mailer.outbox().len(), 2);
    assert_eq!(store.get(1).unwrap().status, EventStatus::Scheduled);
    assert_eq!(store.get(2).unwrap().status, EventStatus::Pending);
    assert_eq!(store.get(5).unwrap().status, EventStatus::Pending);
}

#[tokio::test]
async fn second_sweep_skips_archived_events() {
    let store = Arc::new(MemoryEventStore::with_events(vec![test_event(
        1,
        "Vid.ly Test",
        json!({ "tag": "abc123" }),
    )]));
    let status = Arc::new(MockStatusSource::new().respond_with_xml(SAMPLE_MEDIALIST_XML));
    let mailer = Arc::new(RecordingMailer::new());
    let sweeper = sweeper(store.clone(), status.clone(), mailer);

    let first = sweeper.run_once().await.unwrap();
    let second = sweeper.run_once().await.unwrap();

    assert_eq!(first.scheduled, 1);
    assert_eq!(second.checked, 0);
    assert_eq!(status.calls(), 1);
    assert_eq!(store.saves(), 1);
}

#[tokio::test]
async fn lookup_failures_are_counted_and_do_not_stop_the_sweep() {
    let store = Arc::new(MemoryEventStore::with_events(vec![
        test_event(1, "Vid.ly Test", json!({ "tag": "abc123" })),
        test_event(2, "Vid.ly Test", json!({ "tag": "xyz987" })),
    ]));
    let status = Arc::new(MockStatusSource::new().fail_with("connection refused"));
    let mailer = Arc::new(RecordingMailer::new());

    let stats = sweeper(store.clone(), status.clone(), mailer.clone())
        .run_once()
        .await
        .unwrap();

    assert_eq!(stats.checked, 2);
    assert_eq!(stats.failed, 2);
    assert_eq!(status.calls(), 2);
    assert!(mailer.outbox().is_empty());
    assert_eq!(store.saves(), 0);
}
