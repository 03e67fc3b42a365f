use std::sync::Arc;

use config::EventColumn;
use db::{
    models::{consignment_event::ConsignmentEvent, order::Order},
    query::SqlMode,
};

use crate::{date::DateNormalizer, error::IngestError, record::Record, store::IngestStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WriteOutcome {
    pub events_written: usize,
    pub is_return_to_sender: bool,
}

/// Writes the events of one record and the derived return flag of its order.
pub struct EventWriter<S: ?Sized> {
    store: Arc<S>,
    normalizer: DateNormalizer,
    events: Vec<EventColumn>,
    returned_status: String,
    sql_mode: SqlMode,
}

impl<S: IngestStore + ?Sized> EventWriter<S> {
    pub fn new(
        store: Arc<S>,
        normalizer: DateNormalizer,
        events: Vec<EventColumn>,
        returned_status: impl Into<String>,
        sql_mode: SqlMode,
    ) -> Self {
        Self {
            store,
            normalizer,
            events,
            returned_status: returned_status.into(),
            sql_mode,
        }
    }

    /// Exact, case-sensitive match against the configured returned status.
    pub fn is_returned(&self, status: &str) -> bool {
        status == self.returned_status
    }

    /// Every present timestamp is normalized before the first insert, so a
    /// malformed field leaves nothing written for the record.
    pub async fn write(&self, record: &Record, order: &Order) -> Result<WriteOutcome, IngestError> {
        let mut timeline = Vec::with_capacity(self.events.len());
        for event in &self.events {
            if let Some(raw) = record.field(&event.column) {
                timeline.push((event.event_type.as_str(), self.normalizer.normalize(raw)?));
            }
        }

        let base = ConsignmentEvent::base_columns(order);
        for (event_type, event_time) in &timeline {
            let columns = ConsignmentEvent::event_columns(&base, event_type, *event_time);
            let rows = self.store.insert_event(&columns, self.sql_mode).await?;
            if rows != 1 {
                return Err(IngestError::InsertVerification {
                    event_type: event_type.to_string(),
                    rows,
                });
            }
            tracing::debug!(order_id = order.id, event_type, %event_time, "Inserted event");
        }

        let is_return_to_sender = self.is_returned(&record.status);
        let rows = self
            .store
            .set_return_to_sender(order.id, is_return_to_sender, self.sql_mode)
            .await?;
        if rows != 1 {
            return Err(IngestError::UpdateVerification {
                order_id: order.id,
                rows,
            });
        }

        Ok(WriteOutcome {
            events_written: timeline.len(),
            is_return_to_sender,
        })
    }
}
