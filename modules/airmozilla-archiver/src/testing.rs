// Test mocks for the archiver.
//
// Three mocks matching the three collaborator seams:
// - MockStatusSource (StatusSource): canned Vid.ly XML, call counting
// - MemoryEventStore (EventStore): in-memory event table
// - RecordingMailer (NotifyBackend): in-memory outbox
//
// Plus fixtures mirroring real Vid.ly responses.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use vidly_client::{parse_response, TagStatuses, VidlyError};

use crate::config::Administrator;
use crate::error::Result;
use crate::notify::{AdminEmail, NotifyBackend};
use crate::traits::{EventStore, StatusSource};
use crate::types::{Event, EventStatus, Template};

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// `GetStatus` answer for a single tag.
pub fn sample_task_xml(tag: &str, status: &str) -> String {
    format!(
        concat!(
            r#"<?xml version="1.0"?>"#,
            "<Response><Message>Action successful.</Message>",
            "<MessageCode>4.1</MessageCode><Success><Task><UserID>1234</UserID>",
            "<MediaShortLink>{tag}</MediaShortLink>",
            "<SourceFile>http://videos.mozilla.org/bla.f4v</SourceFile>",
            "<BatchID>35402</BatchID>",
            "<Status>{status}</Status>",
            "<Private>false</Private>",
            "<PrivateCDN>false</PrivateCDN><Created>2012-08-23 19:30:58</Created>",
            "<Updated>2012-08-23 20:44:22</Updated>",
            "<UserEmail>airmozilla@mozilla.com</UserEmail>",
            "</Task></Success></Response>",
        ),
        tag = tag,
        status = status,
    )
}

/// `GetMediaList` answer: abc123 finished, xyz987 errored.
pub const SAMPLE_MEDIALIST_XML: &str = concat!(
    r#"<?xml version="1.0"?>"#,
    "<Response><Message>OK</Message><MessageCode>7.4</MessageCode><Success>",
    "<Media><MediaShortLink>abc123</MediaShortLink><VanityLink/>",
    "<Notify>vvm@spb-team.com</Notify><Created>2011-12-25 18:45:56</Created>",
    "<Updated>2012-11-28 14:05:07</Updated><Status>Finished</Status>",
    "<IsDeleted>false</IsDeleted><IsPrivate>false</IsPrivate>",
    "<IsPrivateCDN>false</IsPrivateCDN><CDN>AWS</CDN></Media>",
    "<Media><MediaShortLink>xyz987</MediaShortLink><VanityLink/>",
    "<Notify>vvm@spb-team.com</Notify><Created>2011-12-25 19:41:05</Created>",
    "<Updated>2012-11-28 14:04:57</Updated><Status>Error</Status>",
    "<IsDeleted>false</IsDeleted><IsPrivate>false</IsPrivate>",
    "<IsPrivateCDN>false</IsPrivateCDN><CDN>AWS</CDN></Media>",
    "</Success></Response>",
);

pub fn admins() -> Vec<Administrator> {
    vec![
        Administrator {
            name: "F".to_string(),
            email: "foo@bar.com".to_string(),
        },
        Administrator {
            name: "B".to_string(),
            email: "bar@foo.com".to_string(),
        },
    ]
}

/// A pending "Test event" on the named template.
pub fn test_event(id: i64, template_name: &str, environment: serde_json::Value) -> Event {
    Event {
        id,
        title: "Test event".to_string(),
        status: EventStatus::Pending,
        archive_time: None,
        template: Some(Template {
            id,
            name: template_name.to_string(),
        }),
        template_environment: environment.as_object().cloned().unwrap_or_default(),
    }
}

// ---------------------------------------------------------------------------
// MockStatusSource
// ---------------------------------------------------------------------------

enum CannedResponse {
    Xml(String),
    Failure(String),
}

/// Answers every lookup with one canned Vid.ly document (or failure).
/// Returns `Err` when nothing is registered.
pub struct MockStatusSource {
    response: Option<CannedResponse>,
    calls: AtomicUsize,
    requested: Mutex<Vec<String>>,
}

impl MockStatusSource {
    pub fn new() -> Self {
        Self {
            response: None,
            calls: AtomicUsize::new(0),
            requested: Mutex::new(Vec::new()),
        }
    }

    pub fn respond_with_xml(mut self, xml: &str) -> Self {
        self.response = Some(CannedResponse::Xml(xml.to_string()));
        self
    }

    pub fn fail_with(mut self, message: &str) -> Self {
        self.response = Some(CannedResponse::Failure(message.to_string()));
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Every tag asked for, in call order.
    pub fn requested_tags(&self) -> Vec<String> {
        self.requested.lock().unwrap().clone()
    }
}

impl Default for MockStatusSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StatusSource for MockStatusSource {
    async fn statuses(&self, tags: &[&str]) -> vidly_client::Result<TagStatuses> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requested
            .lock()
            .unwrap()
            .extend(tags.iter().map(|t| t.to_string()));

        match &self.response {
            Some(CannedResponse::Xml(xml)) => Ok(parse_response(xml)?.into_statuses()),
            Some(CannedResponse::Failure(message)) => Err(VidlyError::Network(message.clone())),
            None => Err(VidlyError::Network(
                "MockStatusSource: no response registered".to_string(),
            )),
        }
    }
}

// ---------------------------------------------------------------------------
// MemoryEventStore
// ---------------------------------------------------------------------------

/// In-memory event table keyed by id.
pub struct MemoryEventStore {
    events: Mutex<BTreeMap<i64, Event>>,
    saves: AtomicUsize,
}

impl MemoryEventStore {
    pub fn new() -> Self {
        Self {
            events: Mutex::new(BTreeMap::new()),
            saves: AtomicUsize::new(0),
        }
    }

    pub fn with_events(events: Vec<Event>) -> Self {
        let store = Self::new();
        for event in events {
            store.insert(event);
        }
        store
    }

    pub fn insert(&self, event: Event) {
        self.events.lock().unwrap().insert(event.id, event);
    }

    /// Current stored copy, for assertions.
    pub fn get(&self, id: i64) -> Option<Event> {
        self.events.lock().unwrap().get(&id).cloned()
    }

    pub fn saves(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

impl Default for MemoryEventStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EventStore for MemoryEventStore {
    async fn event(&self, id: i64) -> Result<Option<Event>> {
        Ok(self.get(id))
    }

    async fn pending_archive_candidates(&self, provider_marker: &str) -> Result<Vec<Event>> {
        let events = self.events.lock().unwrap();
        Ok(events
            .values()
            .filter(|e| e.status == EventStatus::Pending)
            .filter(|e| e.archive_time.is_none())
            .filter(|e| e.is_provider_event(provider_marker))
            .cloned()
            .collect())
    }

    async fn save_archive_state(&self, event: &Event) -> Result<()> {
        let mut events = self.events.lock().unwrap();
        let stored = events
            .get_mut(&event.id)
            .ok_or(crate::error::ArchiveError::EventNotFound(event.id))?;
        stored.status = event.status;
        stored.archive_time = event.archive_time;
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// RecordingMailer
// ---------------------------------------------------------------------------

/// Keeps every sent email in an outbox. `failing()` rejects every send.
pub struct RecordingMailer {
    outbox: Mutex<Vec<AdminEmail>>,
    fail: bool,
}

impl RecordingMailer {
    pub fn new() -> Self {
        Self {
            outbox: Mutex::new(Vec::new()),
            fail: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            outbox: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn outbox(&self) -> Vec<AdminEmail> {
        self.outbox.lock().unwrap().clone()
    }
}

impl Default for RecordingMailer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl NotifyBackend for RecordingMailer {
    async fn send(&self, email: &AdminEmail) -> anyhow::Result<()> {
        if self.fail {
            anyhow::bail!("RecordingMailer: delivery refused");
        }
        self.outbox.lock().unwrap().push(email.clone());
        Ok(())
    }
}
