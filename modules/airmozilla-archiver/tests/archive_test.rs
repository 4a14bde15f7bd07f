//! Reconciliation outcomes against canned Vid.ly responses.

use std::sync::Arc;

use chrono::Utc;
use serde_json::json;

use airmozilla_archiver::testing::{
    admins, sample_task_xml, test_event, MemoryEventStore, MockStatusSource, RecordingMailer,
    SAMPLE_MEDIALIST_XML,
};
use airmozilla_archiver::{ArchiveOutcome, Archiver, ArchiverConfig, Event, EventStatus};
use vidly_client::MediaStatus;

const SITE_URL: &str = "https://air.example.com";

struct Harness {
    archiver: Archiver,
    status: Arc<MockStatusSource>,
    store: Arc<MemoryEventStore>,
    mailer: Arc<RecordingMailer>,
}

fn harness(event: &Event, status: MockStatusSource) -> Harness {
    let status = Arc::new(status);
    let store = Arc::new(MemoryEventStore::with_events(vec![event.clone()]));
    let mailer = Arc::new(RecordingMailer::new());
    let archiver = Archiver::new(
        ArchiverConfig::new(admins(), SITE_URL),
        status.clone(),
        store.clone(),
        mailer.clone(),
    );
    Harness {
        archiver,
        status,
        store,
        mailer,
    }
}

fn vidly_event(tag: &str) -> Event {
    test_event(1, "Vid.ly Test", json!({ "tag": tag }))
}

#[tokio::test]
async fn unknown_tag_mails_administrators() {
    let mut event = vidly_event("NOTKNOWN");
    let h = harness(
        &event,
        MockStatusSource::new().respond_with_xml(SAMPLE_MEDIALIST_XML),
    );

    let outcome = h.archiver.archive(&mut event).await.unwrap();

    assert_eq!(outcome, ArchiveOutcome::TagNotFound);
    assert_eq!(h.status.requested_tags(), vec!["NOTKNOWN"]);

    let outbox = h.mailer.outbox();
    assert_eq!(outbox.len(), 1);
    let sent = &outbox[0];
    assert_eq!(sent.to, vec!["foo@bar.com", "bar@foo.com"]);
    assert!(sent.subject.contains("NOTKNOWN"));
    assert!(sent.body.contains("https://air.example.com/manage/events/1/"));

    assert_eq!(h.store.saves(), 0);
    assert_eq!(h.store.get(1).unwrap().status, EventStatus::Pending);
}

#[tokio::test]
async fn unknown_tag_mail_includes_vidly_errors() {
    let xml = concat!(
        "<Response><Message>Action failed.</Message><MessageCode>4.3</MessageCode>",
        "<Errors><Error><ErrorCode>4.1</ErrorCode><ErrorName>Media not found</ErrorName>",
        "<Description>The requested media does not exist</Description>",
        "<MediaShortLink>gone42</MediaShortLink></Error></Errors></Response>",
    );
    let mut event = vidly_event("gone42");
    let h = harness(&event, MockStatusSource::new().respond_with_xml(xml));

    let outcome = h.archiver.archive(&mut event).await.unwrap();

    assert_eq!(outcome, ArchiveOutcome::TagNotFound);
    let outbox = h.mailer.outbox();
    assert_eq!(outbox.len(), 1);
    assert!(outbox[0].body.contains("Media not found"));
}

#[tokio::test]
async fn errored_transcode_mails_administrators() {
    let mut event = vidly_event("abc123");
    let h = harness(
        &event,
        MockStatusSource::new().respond_with_xml(&sample_task_xml("abc123", "Error")),
    );

    let outcome = h.archiver.archive(&mut event).await.unwrap();

    assert_eq!(outcome, ArchiveOutcome::Errored);
    let outbox = h.mailer.outbox();
    assert_eq!(outbox.len(), 1);
    let sent = &outbox[0];
    assert_eq!(sent.to, vec!["foo@bar.com", "bar@foo.com"]);
    assert!(sent.subject.contains("Unable to archive pending event"));
    assert!(sent.subject.contains("abc123"));
    assert!(sent.body.contains("https://air.example.com/manage/events/1/"));

    assert_eq!(event.status, EventStatus::Pending);
    assert_eq!(h.store.saves(), 0);
}

#[tokio::test]
async fn errored_entry_in_media_list_mails_administrators() {
    let mut event = vidly_event("xyz987");
    let h = harness(
        &event,
        MockStatusSource::new().respond_with_xml(SAMPLE_MEDIALIST_XML),
    );

    let outcome = h.archiver.archive(&mut event).await.unwrap();

    assert_eq!(outcome, ArchiveOutcome::Errored);
    assert!(h.mailer.outbox()[0].subject.contains("xyz987"));
}

#[tokio::test]
async fn processing_transcode_is_left_alone() {
    let mut event = vidly_event("abc123");
    let h = harness(
        &event,
        MockStatusSource::new().respond_with_xml(&sample_task_xml("abc123", "Processing")),
    );

    let outcome = h.archiver.archive(&mut event).await.unwrap();

    assert_eq!(
        outcome,
        ArchiveOutcome::StillProcessing(MediaStatus::Processing)
    );
    assert!(h.mailer.outbox().is_empty());
    assert_eq!(h.store.saves(), 0);
    assert_eq!(h.store.get(1).unwrap().status, EventStatus::Pending);
}

#[tokio::test]
async fn new_transcode_is_left_alone() {
    let mut event = vidly_event("abc123");
    let h = harness(
        &event,
        MockStatusSource::new().respond_with_xml(&sample_task_xml("abc123", "New")),
    );

    let outcome = h.archiver.archive(&mut event).await.unwrap();

    assert_eq!(outcome, ArchiveOutcome::StillProcessing(MediaStatus::New));
    assert!(h.mailer.outbox().is_empty());
}

#[tokio::test]
async fn finished_transcode_schedules_event() {
    let mut event = vidly_event("abc123");
    event.status = EventStatus::Pending;
    event.archive_time = None;
    let h = harness(
        &event,
        MockStatusSource::new().respond_with_xml(&sample_task_xml("abc123", "Finished")),
    );

    let outcome = h.archiver.archive(&mut event).await.unwrap();

    assert_eq!(outcome, ArchiveOutcome::Scheduled);
    assert!(h.mailer.outbox().is_empty());
    assert_eq!(h.store.saves(), 1);

    let stored = h.store.get(1).unwrap();
    assert_eq!(stored.status, EventStatus::Scheduled);
    let archived = stored.archive_time.expect("archive time should be stamped");
    let now = Utc::now();
    assert_eq!(
        archived.format("%Y%m%d %H%M").to_string(),
        now.format("%Y%m%d %H%M").to_string()
    );
    assert!(now.signed_duration_since(archived).num_seconds() < 60);

    assert_eq!(event.status, EventStatus::Scheduled);
    assert_eq!(event.archive_time, stored.archive_time);
}

#[tokio::test]
async fn non_vidly_event_makes_no_calls() {
    let mut event = test_event(1, "Live Stream", json!({ "tag": "abc123" }));
    let h = harness(
        &event,
        MockStatusSource::new().respond_with_xml(&sample_task_xml("abc123", "Finished")),
    );

    let outcome = h.archiver.archive(&mut event).await.unwrap();

    assert_eq!(outcome, ArchiveOutcome::NotVidly);
    assert_eq!(h.status.calls(), 0);
    assert!(h.mailer.outbox().is_empty());
    assert_eq!(h.store.saves(), 0);
}

#[tokio::test]
async fn placeholder_tag_makes_no_calls() {
    let mut event = vidly_event("None");
    let h = harness(
        &event,
        MockStatusSource::new().respond_with_xml(&sample_task_xml("None", "Finished")),
    );

    let outcome = h.archiver.archive(&mut event).await.unwrap();

    assert_eq!(outcome, ArchiveOutcome::MissingTag);
    assert_eq!(h.status.calls(), 0);
}
