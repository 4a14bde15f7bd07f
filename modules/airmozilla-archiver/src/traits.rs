// Trait seams for the archiver's collaborators.
//
// StatusSource: Vid.ly status lookups (VidlyClient in production).
// EventStore: reads pending events, saves the archive result.
//
// Mocks for both live in `testing`.

use async_trait::async_trait;

use vidly_client::{TagStatuses, VidlyClient};

use crate::error::Result;
use crate::types::Event;

#[async_trait]
pub trait StatusSource: Send + Sync {
    /// Current transcoding status for the given tags.
    async fn statuses(&self, tags: &[&str]) -> vidly_client::Result<TagStatuses>;
}

#[async_trait]
impl StatusSource for VidlyClient {
    async fn statuses(&self, tags: &[&str]) -> vidly_client::Result<TagStatuses> {
        self.query(tags).await
    }
}

#[async_trait]
pub trait EventStore: Send + Sync {
    async fn event(&self, id: i64) -> Result<Option<Event>>;

    /// Pending events on a provider template that have not been archived yet.
    async fn pending_archive_candidates(&self, provider_marker: &str) -> Result<Vec<Event>>;

    /// Persist `status` and `archive_time` in a single write.
    async fn save_archive_state(&self, event: &Event) -> Result<()>;
}
