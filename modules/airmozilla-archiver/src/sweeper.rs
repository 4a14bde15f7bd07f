use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::archiver::Archiver;
use crate::types::SweepStats;

/// Walks every pending Vid.ly event and reconciles it.
pub struct Sweeper {
    archiver: Archiver,
}

impl Sweeper {
    pub fn new(archiver: Archiver) -> Self {
        Self { archiver }
    }

    pub fn archiver(&self) -> &Archiver {
        &self.archiver
    }

    /// One pass. Per-event failures are logged and counted; only a failure
    /// to list candidates aborts the pass.
    pub async fn run_once(&self) -> Result<SweepStats> {
        let marker = &self.archiver.config().provider_marker;
        let candidates = self
            .archiver
            .store()
            .pending_archive_candidates(marker)
            .await
            .context("Failed to load pending events")?;

        info!(count = candidates.len(), "Sweeping pending Vid.ly events");

        let mut stats = SweepStats::default();
        for mut event in candidates {
            stats.checked += 1;
            match self.archiver.archive(&mut event).await {
                Ok(outcome) => stats.record(&outcome),
                Err(e) => {
                    stats.failed += 1;
                    warn!(event_id = event.id, error = %e, "Failed to archive event");
                }
            }
        }

        info!("Sweep complete. {stats}");
        Ok(stats)
    }

    /// Sweep, then wait out the pester interval, forever.
    pub async fn watch(&self) -> Result<()> {
        let interval = self
            .archiver
            .config()
            .pester_interval
            .to_std()
            .context("pester interval must be positive")?;

        loop {
            if let Err(e) = self.run_once().await {
                warn!(error = %e, "Sweep failed");
            }
            info!(next_in_secs = interval.as_secs(), "Waiting for next sweep");
            tokio::time::sleep(interval).await;
        }
    }
}
