use chrono::{DateTime, Utc};
use std::fmt;
use std::str::FromStr;

use vidly_client::MediaStatus;

/// Key in the template environment that holds the Vid.ly short link.
pub const TAG_KEY: &str = "tag";

/// Lifecycle status of an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventStatus {
    Initiated,
    Pending,
    Processing,
    Scheduled,
    Failed,
}

impl EventStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Initiated => "initiated",
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Scheduled => "scheduled",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for EventStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "initiated" => Ok(Self::Initiated),
            "pending" => Ok(Self::Pending),
            "processing" => Ok(Self::Processing),
            "scheduled" => Ok(Self::Scheduled),
            "failed" | "error" => Ok(Self::Failed),
            other => Err(format!("unknown event status: {other}")),
        }
    }
}

/// Template an event is rendered with. The name decides which provider
/// workflow applies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    pub id: i64,
    pub name: String,
}

impl Template {
    pub fn is_provider(&self, marker: &str) -> bool {
        self.name.contains(marker)
    }
}

#[derive(Debug, Clone)]
pub struct Event {
    pub id: i64,
    pub title: String,
    pub status: EventStatus,
    pub archive_time: Option<DateTime<Utc>>,
    pub template: Option<Template>,
    pub template_environment: serde_json::Map<String, serde_json::Value>,
}

impl Event {
    pub fn is_provider_event(&self, marker: &str) -> bool {
        self.template
            .as_ref()
            .is_some_and(|t| t.is_provider(marker))
    }

    /// The Vid.ly tag, if one is set. Blank values and the literal "None"
    /// left behind by old form submissions count as missing.
    pub fn vidly_tag(&self) -> Option<&str> {
        let tag = self.template_environment.get(TAG_KEY)?.as_str()?.trim();
        if tag.is_empty() || tag == "None" {
            return None;
        }
        Some(tag)
    }
}

/// Which branch a reconciliation took.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArchiveOutcome {
    NotVidly,
    MissingTag,
    TagNotFound,
    Errored,
    StillProcessing(MediaStatus),
    Scheduled,
}

/// Counters for one sweep over pending events.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SweepStats {
    pub checked: u64,
    pub scheduled: u64,
    pub still_processing: u64,
    pub notified: u64,
    pub skipped: u64,
    pub failed: u64,
}

impl SweepStats {
    pub fn record(&mut self, outcome: &ArchiveOutcome) {
        match outcome {
            ArchiveOutcome::NotVidly | ArchiveOutcome::MissingTag => self.skipped += 1,
            ArchiveOutcome::TagNotFound | ArchiveOutcome::Errored => self.notified += 1,
            ArchiveOutcome::StillProcessing(_) => self.still_processing += 1,
            ArchiveOutcome::Scheduled => self.scheduled += 1,
        }
    }
}

impl fmt::Display for SweepStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "checked={} scheduled={} still_processing={} notified={} skipped={} failed={}",
            self.checked,
            self.scheduled,
            self.still_processing,
            self.notified,
            self.skipped,
            self.failed
        )
    }
}
