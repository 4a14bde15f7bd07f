use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

// --- Request documents ---

/// `<Query>` document posted to the API in the `xml` form field.
#[derive(Debug, Clone, Serialize)]
#[serde(rename = "Query")]
pub(crate) struct QueryDocument<'a> {
    #[serde(rename = "Action")]
    pub action: &'a str,
    #[serde(rename = "UserID")]
    pub user_id: &'a str,
    #[serde(rename = "UserKey")]
    pub user_key: &'a str,
    #[serde(rename = "MediaShortLink", skip_serializing_if = "Option::is_none")]
    pub media_short_link: Option<String>,
}

// --- Response documents ---

/// Top-level `<Response>` returned by every API action.
#[derive(Debug, Clone, Deserialize)]
pub struct VidlyResponse {
    #[serde(rename = "Message", default)]
    pub message: Option<String>,
    #[serde(rename = "MessageCode", default)]
    pub message_code: Option<String>,
    #[serde(rename = "Success", default)]
    pub success: Option<SuccessBlock>,
    #[serde(rename = "Errors", default)]
    pub errors: Option<ErrorsBlock>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SuccessBlock {
    #[serde(rename = "$value", default)]
    pub items: Vec<SuccessItem>,
}

/// One child of `<Success>`. `GetStatus` answers with `<Task>` elements,
/// `GetMediaList` with `<Media>` elements.
#[derive(Debug, Clone, Deserialize)]
pub enum SuccessItem {
    Task(TaskEntry),
    Media(MediaEntry),
}

#[derive(Debug, Clone, Deserialize)]
pub struct TaskEntry {
    #[serde(rename = "MediaShortLink")]
    pub media_short_link: String,
    #[serde(rename = "Status")]
    pub status: String,
    #[serde(rename = "SourceFile", default)]
    pub source_file: Option<String>,
    #[serde(rename = "BatchID", default)]
    pub batch_id: Option<String>,
    #[serde(rename = "Created", default)]
    pub created: Option<String>,
    #[serde(rename = "Updated", default)]
    pub updated: Option<String>,
    #[serde(rename = "UserEmail", default)]
    pub user_email: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MediaEntry {
    #[serde(rename = "MediaShortLink")]
    pub media_short_link: String,
    #[serde(rename = "Status")]
    pub status: String,
    #[serde(rename = "Notify", default)]
    pub notify: Option<String>,
    #[serde(rename = "Created", default)]
    pub created: Option<String>,
    #[serde(rename = "Updated", default)]
    pub updated: Option<String>,
    #[serde(rename = "IsDeleted", default)]
    pub is_deleted: Option<String>,
    #[serde(rename = "CDN", default)]
    pub cdn: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorsBlock {
    #[serde(rename = "Error", default)]
    pub errors: Vec<ApiErrorEntry>,
}

/// An `<Error>` entry. Vid.ly reports per-item failures here alongside
/// (or instead of) the `<Success>` block.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorEntry {
    #[serde(rename = "ErrorCode", default)]
    pub code: Option<String>,
    #[serde(rename = "ErrorName", default)]
    pub name: Option<String>,
    #[serde(rename = "Description", default)]
    pub description: Option<String>,
    #[serde(rename = "Suggestion", default)]
    pub suggestion: Option<String>,
    #[serde(rename = "MediaShortLink", default)]
    pub media_short_link: Option<String>,
}

impl fmt::Display for ApiErrorEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let code = self.code.as_deref().unwrap_or("?");
        let name = self.name.as_deref().unwrap_or("Unknown error");
        write!(f, "[{code}] {name}")?;
        if let Some(description) = &self.description {
            write!(f, ": {description}")?;
        }
        Ok(())
    }
}

// --- Normalized view ---

/// Transcoding state of a media item as reported by Vid.ly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaStatus {
    New,
    Processing,
    Finished,
    Error,
    Other(String),
}

impl MediaStatus {
    /// True for states Vid.ly will not move out of on its own.
    pub fn is_terminal(&self) -> bool {
        matches!(self, MediaStatus::Finished | MediaStatus::Error)
    }
}

impl From<&str> for MediaStatus {
    fn from(s: &str) -> Self {
        match s.trim() {
            "New" => MediaStatus::New,
            "Processing" => MediaStatus::Processing,
            "Finished" => MediaStatus::Finished,
            "Error" => MediaStatus::Error,
            other => MediaStatus::Other(other.to_string()),
        }
    }
}

impl fmt::Display for MediaStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaStatus::New => write!(f, "New"),
            MediaStatus::Processing => write!(f, "Processing"),
            MediaStatus::Finished => write!(f, "Finished"),
            MediaStatus::Error => write!(f, "Error"),
            MediaStatus::Other(s) => write!(f, "{s}"),
        }
    }
}

/// A media item from either response shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaRecord {
    pub tag: String,
    pub status: MediaStatus,
    pub created: Option<String>,
    pub updated: Option<String>,
}

impl From<SuccessItem> for MediaRecord {
    fn from(item: SuccessItem) -> Self {
        match item {
            SuccessItem::Task(task) => MediaRecord {
                status: MediaStatus::from(task.status.as_str()),
                tag: task.media_short_link.trim().to_string(),
                created: task.created,
                updated: task.updated,
            },
            SuccessItem::Media(media) => MediaRecord {
                status: MediaStatus::from(media.status.as_str()),
                tag: media.media_short_link.trim().to_string(),
                created: media.created,
                updated: media.updated,
            },
        }
    }
}

/// Tag → status lookup collapsed from a response, plus whatever errors
/// the API reported next to it.
#[derive(Debug, Clone, Default)]
pub struct TagStatuses {
    records: BTreeMap<String, MediaRecord>,
    errors: Vec<ApiErrorEntry>,
}

impl TagStatuses {
    pub fn get(&self, tag: &str) -> Option<&MediaRecord> {
        self.records.get(tag)
    }

    pub fn status(&self, tag: &str) -> Option<&MediaStatus> {
        self.records.get(tag).map(|r| &r.status)
    }

    pub fn errors(&self) -> &[ApiErrorEntry] {
        &self.errors
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl VidlyResponse {
    /// Collapse `<Task>` and `<Media>` entries into one lookup keyed by tag.
    /// A later entry for the same tag wins.
    pub fn into_statuses(self) -> TagStatuses {
        let records = self
            .success
            .map(|s| s.items)
            .unwrap_or_default()
            .into_iter()
            .map(MediaRecord::from)
            .map(|r| (r.tag.clone(), r))
            .collect();
        let errors = self.errors.map(|e| e.errors).unwrap_or_default();

        TagStatuses { records, errors }
    }

    /// Entries in document order, for listings.
    pub fn into_records(self) -> Vec<MediaRecord> {
        self.success
            .map(|s| s.items)
            .unwrap_or_default()
            .into_iter()
            .map(MediaRecord::from)
            .collect()
    }
}
