use std::{
    fmt,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

use config::{EventColumn, IngestConfig};
use db::query::SqlMode;
use futures::{StreamExt, stream};
use logs_store::{FailureLog, FailureLogEntry, FailureLogError};
use tracing::Instrument;

use crate::{
    date::{DateNormalizer, SourceTimezone, TimezoneError},
    error::IngestError,
    record::Record,
    resolver::resolve_order,
    store::IngestStore,
    writer::{EventWriter, WriteOutcome},
};

/// Per-run settings shared by every record.
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub organization_id: String,
    pub normalizer: DateNormalizer,
    pub events: Vec<EventColumn>,
    pub returned_status: String,
    pub sql_mode: SqlMode,
}

impl PipelineSettings {
    pub fn from_config(config: &IngestConfig) -> Result<Self, TimezoneError> {
        let timezone = SourceTimezone::parse(&config.source_timezone)?;
        if config.sql_mode == SqlMode::LegacyLiteral {
            tracing::warn!("Legacy literal SQL enabled; single quotes in values will be dropped");
        }
        Ok(Self {
            organization_id: config.organization_id.clone(),
            normalizer: DateNormalizer::new(timezone),
            events: config.columns.events.clone(),
            returned_status: config.returned_status.clone(),
            sql_mode: config.sql_mode,
        })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub events_written: usize,
    /// A connection-class error was seen; the run must be reported as failed.
    pub connection_lost: bool,
}

impl fmt::Display for BatchSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "total={} succeeded={} failed={} events_written={}",
            self.total, self.succeeded, self.failed, self.events_written
        )?;
        if self.connection_lost {
            f.write_str(" connection_lost=true")?;
        }
        Ok(())
    }
}

/// Runs records through resolve-then-write with a bounded number in flight.
pub struct IngestPipeline<S: ?Sized, L: ?Sized> {
    store: Arc<S>,
    failure_log: Arc<L>,
    organization_id: String,
    writer: EventWriter<S>,
    connection_lost: AtomicBool,
}

impl<S, L> IngestPipeline<S, L>
where
    S: IngestStore + ?Sized,
    L: FailureLog + ?Sized,
{
    pub fn new(store: Arc<S>, failure_log: Arc<L>, settings: PipelineSettings) -> Self {
        let writer = EventWriter::new(
            store.clone(),
            settings.normalizer,
            settings.events,
            settings.returned_status,
            settings.sql_mode,
        );
        Self {
            store,
            failure_log,
            organization_id: settings.organization_id,
            writer,
            connection_lost: AtomicBool::new(false),
        }
    }

    /// Processes `records` with at most `limit` handlers active. Record
    /// failures are logged and counted; only a failing failure log aborts.
    pub async fn run(
        &self,
        records: Vec<Record>,
        limit: usize,
    ) -> Result<BatchSummary, FailureLogError> {
        let limit = limit.max(1);
        let mut summary = BatchSummary {
            total: records.len(),
            ..Default::default()
        };
        self.connection_lost.store(false, Ordering::SeqCst);
        tracing::info!(total = summary.total, limit, "Starting ingestion batch");

        let mut outcomes = stream::iter(records)
            .map(|record| self.process(record))
            .buffer_unordered(limit);
        while let Some(outcome) = outcomes.next().await {
            match outcome? {
                Some(events_written) => {
                    summary.succeeded += 1;
                    summary.events_written += events_written;
                }
                None => summary.failed += 1,
            }
        }

        summary.connection_lost = self.connection_lost.load(Ordering::SeqCst);
        tracing::info!(%summary, "Ingestion batch finished");
        Ok(summary)
    }

    /// `Some(events written)` on success, `None` once the failure is logged.
    async fn process(&self, record: Record) -> Result<Option<usize>, FailureLogError> {
        let span = tracing::info_span!("record", reference = %record.reference, line = record.line);
        async {
            match self.handle(&record).await {
                Ok(outcome) => {
                    tracing::debug!(
                        events_written = outcome.events_written,
                        is_return_to_sender = outcome.is_return_to_sender,
                        "Record ingested"
                    );
                    Ok(Some(outcome.events_written))
                }
                Err(err) => {
                    if err.is_connection() && !self.connection_lost.swap(true, Ordering::SeqCst) {
                        tracing::error!(error = %err, "Database connection lost");
                    }
                    tracing::warn!(error = %err, "Record failed");

                    let correlation_id = Some(record.reference.as_str()).filter(|r| !r.is_empty());
                    self.failure_log
                        .log(FailureLogEntry::error(
                            correlation_id,
                            err.summary(),
                            format!("line {}: {err}", record.line),
                        ))
                        .await?;
                    Ok(None)
                }
            }
        }
        .instrument(span)
        .await
    }

    async fn handle(&self, record: &Record) -> Result<WriteOutcome, IngestError> {
        if self.connection_lost.load(Ordering::SeqCst) {
            return Err(IngestError::Connection(
                "skipped after an earlier connection failure".to_string(),
            ));
        }
        if let Some(reason) = record.invalid_reason() {
            return Err(IngestError::RecordValidation(reason.to_string()));
        }

        let order = resolve_order(self.store.as_ref(), &record.reference, &self.organization_id)
            .await?;
        self.writer.write(record, &order).await
    }
}
