//! Archive reconciler for Vid.ly-hosted events.
//!
//! An event recorded on a Vid.ly template waits in `Pending` until Vid.ly
//! has transcoded its media. The [`Archiver`] asks Vid.ly for the status of
//! the event's tag and either schedules the event, mails the administrators,
//! or leaves it for the next [`Sweeper`] pass.

pub mod archiver;
pub mod config;
pub mod error;
pub mod notify;
pub mod store;
pub mod sweeper;
#[cfg(any(test, feature = "test-support"))]
pub mod testing;
pub mod traits;
pub mod types;

pub use archiver::Archiver;
pub use config::{AppConfig, ArchiverConfig, Administrator, FileConfig};
pub use error::{ArchiveError, Result};
pub use store::PgEventStore;
pub use sweeper::Sweeper;
pub use traits::{EventStore, StatusSource};
pub use types::{ArchiveOutcome, Event, EventStatus, SweepStats, Template};
