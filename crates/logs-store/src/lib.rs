//! Append-only failure log for ingestion runs.
//!
//! Every entry carries an optional correlation id (the record's reference
//! number) so failures can be traced back to their source row. Writes are
//! durable before [`FailureLog::log`] returns and errors are surfaced to the
//! caller rather than dropped.

use async_trait::async_trait;
use thiserror::Error;

mod csv_sink;
mod entry;
mod memory;

pub use csv_sink::CsvFailureLog;
pub use entry::{FailureLogEntry, LogLevel};
pub use memory::MemoryFailureLog;

#[derive(Debug, Error)]
pub enum FailureLogError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Csv(#[from] csv::Error),
}

#[async_trait]
pub trait FailureLog: Send + Sync {
    async fn log(&self, entry: FailureLogEntry) -> Result<(), FailureLogError>;
}
