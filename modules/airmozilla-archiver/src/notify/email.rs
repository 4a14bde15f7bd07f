use vidly_client::{ApiErrorEntry, MediaRecord};

use crate::config::ArchiverConfig;
use crate::types::Event;

/// A message addressed to every configured administrator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminEmail {
    pub to: Vec<String>,
    pub subject: String,
    pub body: String,
}

impl AdminEmail {
    /// Vid.ly has no record of the event's tag.
    pub fn tag_not_found(
        config: &ArchiverConfig,
        event: &Event,
        tag: &str,
        api_errors: &[ApiErrorEntry],
    ) -> Self {
        let subject = format!("Vid.ly tag {tag} not found for pending event {:?}", event.title);

        let mut body = format!(
            "The event {:?} is waiting to be archived, but Vid.ly does not know \
             about its tag {tag}.\n\n\
             Check the tag and update the event here:\n{}\n",
            event.title,
            config.event_edit_url(event.id),
        );
        if !api_errors.is_empty() {
            body.push_str("\nVid.ly reported:\n");
            for err in api_errors {
                body.push_str(&format!("  {err}\n"));
            }
        }

        Self {
            to: config.admin_addresses(),
            subject,
            body,
        }
    }

    /// Vid.ly failed to transcode the event's media.
    pub fn archive_failed(config: &ArchiverConfig, event: &Event, record: &MediaRecord) -> Self {
        let subject = format!(
            "Unable to archive pending event {:?} ({})",
            event.title, record.tag
        );

        let mut body = format!(
            "Vid.ly reported status {} for tag {} of event {:?}.\n\n\
             Resubmit the media or pick another tag here:\n{}\n",
            record.status,
            record.tag,
            event.title,
            config.event_edit_url(event.id),
        );
        if let Some(updated) = &record.updated {
            body.push_str(&format!("\nLast updated by Vid.ly: {updated}\n"));
        }

        Self {
            to: config.admin_addresses(),
            subject,
            body,
        }
    }
}
