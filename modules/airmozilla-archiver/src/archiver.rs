use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};

use vidly_client::MediaStatus;

use crate::config::ArchiverConfig;
use crate::error::{ArchiveError, Result};
use crate::notify::{AdminEmail, NotifyBackend};
use crate::traits::{EventStore, StatusSource};
use crate::types::{ArchiveOutcome, Event, EventStatus};

/// Reconciles a pending event with the transcoding status Vid.ly reports
/// for its tag.
pub struct Archiver {
    config: ArchiverConfig,
    status: Arc<dyn StatusSource>,
    store: Arc<dyn EventStore>,
    notifier: Arc<dyn NotifyBackend>,
}

impl Archiver {
    pub fn new(
        config: ArchiverConfig,
        status: Arc<dyn StatusSource>,
        store: Arc<dyn EventStore>,
        notifier: Arc<dyn NotifyBackend>,
    ) -> Self {
        Self {
            config,
            status,
            store,
            notifier,
        }
    }

    pub fn config(&self) -> &ArchiverConfig {
        &self.config
    }

    pub fn store(&self) -> &dyn EventStore {
        self.store.as_ref()
    }

    /// Check one event against Vid.ly.
    ///
    /// A finished transcode schedules the event and stamps its archive time.
    /// An unknown tag or a failed transcode is mailed to the administrators
    /// and leaves the event alone. Anything else is left for the next sweep.
    ///
    /// Events without a Vid.ly template or tag are logged and skipped before
    /// any network call.
    pub async fn archive(&self, event: &mut Event) -> Result<ArchiveOutcome> {
        if !event.is_provider_event(&self.config.provider_marker) {
            warn!(event_id = event.id, "Event {:?} not a Vid.ly event", event.title);
            return Ok(ArchiveOutcome::NotVidly);
        }

        let Some(tag) = event.vidly_tag().map(str::to_owned) else {
            warn!(event_id = event.id, "Event {:?} does not have a Vid.ly tag", event.title);
            return Ok(ArchiveOutcome::MissingTag);
        };

        let statuses = self.status.statuses(&[tag.as_str()]).await?;

        let Some(record) = statuses.get(&tag) else {
            info!(event_id = event.id, tag = %tag, "Vid.ly tag not found, notifying administrators");
            let email = AdminEmail::tag_not_found(&self.config, event, &tag, statuses.errors());
            self.notify(&email).await?;
            return Ok(ArchiveOutcome::TagNotFound);
        };

        match &record.status {
            MediaStatus::Error => {
                info!(event_id = event.id, tag = %tag, "Vid.ly transcode failed, notifying administrators");
                let email = AdminEmail::archive_failed(&self.config, event, record);
                self.notify(&email).await?;
                Ok(ArchiveOutcome::Errored)
            }
            MediaStatus::Finished => {
                // Caller's copy only changes once the store has accepted it.
                let mut scheduled = event.clone();
                scheduled.status = EventStatus::Scheduled;
                scheduled.archive_time = Some(Utc::now());
                self.store.save_archive_state(&scheduled).await?;
                *event = scheduled;
                info!(event_id = event.id, tag = %tag, "Event archived and scheduled");
                Ok(ArchiveOutcome::Scheduled)
            }
            other => {
                debug!(event_id = event.id, tag = %tag, status = %other, "Vid.ly still processing");
                Ok(ArchiveOutcome::StillProcessing(other.clone()))
            }
        }
    }

    /// Load an event by id and reconcile it.
    pub async fn archive_by_id(&self, event_id: i64) -> Result<ArchiveOutcome> {
        let mut event = self
            .store
            .event(event_id)
            .await?
            .ok_or(ArchiveError::EventNotFound(event_id))?;
        self.archive(&mut event).await
    }

    async fn notify(&self, email: &AdminEmail) -> Result<()> {
        self.notifier
            .send(email)
            .await
            .map_err(ArchiveError::Notify)
    }
}
