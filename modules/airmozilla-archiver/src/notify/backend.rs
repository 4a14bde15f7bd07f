use async_trait::async_trait;

use super::email::AdminEmail;

/// Pluggable delivery for administrator notifications.
#[async_trait]
pub trait NotifyBackend: Send + Sync {
    async fn send(&self, email: &AdminEmail) -> anyhow::Result<()>;
}
