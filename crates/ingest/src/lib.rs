//! Shipment event ingestion: resolve each input record to its order, write
//! one event per present timestamp and update the order's return flag.

pub mod date;
pub mod error;
pub mod pipeline;
pub mod record;
pub mod resolver;
pub mod store;
pub mod writer;

#[cfg(test)]
mod test_support;

pub use date::{DateFormatError, DateNormalizer, SourceTimezone, TimezoneError};
pub use error::IngestError;
pub use pipeline::{BatchSummary, IngestPipeline, PipelineSettings};
pub use record::{Record, RecordSourceError, read_records};
pub use store::IngestStore;
