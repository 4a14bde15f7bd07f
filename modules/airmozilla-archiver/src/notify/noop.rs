use async_trait::async_trait;
use tracing::info;

use super::backend::NotifyBackend;
use super::email::AdminEmail;

/// Drops notifications after logging them. Used when no SMTP host is configured.
pub struct NoopBackend;

#[async_trait]
impl NotifyBackend for NoopBackend {
    async fn send(&self, email: &AdminEmail) -> anyhow::Result<()> {
        info!(subject = %email.subject, recipients = email.to.len(), "Mail disabled, dropping notification");
        Ok(())
    }
}
