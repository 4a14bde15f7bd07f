/// Result type alias for archive operations.
pub type Result<T> = std::result::Result<T, ArchiveError>;

#[derive(Debug, thiserror::Error)]
pub enum ArchiveError {
    #[error("Vid.ly lookup failed: {0}")]
    Vidly(#[from] vidly_client::VidlyError),

    #[error("Failed to notify administrators: {0}")]
    Notify(#[source] anyhow::Error),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Event {0} not found")]
    EventNotFound(i64),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
