use db::DbErr;
use thiserror::Error;

use crate::date::DateFormatError;

/// Failure of a single record. None of these abort the batch on their own.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("Database connection lost: {0}")]
    Connection(String),
    #[error("Invalid record: {0}")]
    RecordValidation(String),
    #[error("No order with reference '{reference}' in organization '{org_id}'")]
    OrderNotFound { reference: String, org_id: String },
    #[error("Reference '{reference}' matches more than one order in organization '{org_id}'")]
    AmbiguousReference { reference: String, org_id: String },
    #[error(transparent)]
    DateFormat(#[from] DateFormatError),
    #[error("Insert of {event_type} event affected {rows} rows, expected 1")]
    InsertVerification { event_type: String, rows: u64 },
    #[error("Update of order {order_id} affected {rows} rows, expected 1")]
    UpdateVerification { order_id: i64, rows: u64 },
    #[error("Failed to build statement: {0}")]
    Query(String),
    #[error(transparent)]
    Database(DbErr),
}

impl From<DbErr> for IngestError {
    fn from(err: DbErr) -> Self {
        if db::is_connection_error(&err) {
            return IngestError::Connection(err.to_string());
        }
        match err {
            DbErr::Custom(msg) => IngestError::Query(msg),
            other => IngestError::Database(other),
        }
    }
}

impl IngestError {
    pub fn is_connection(&self) -> bool {
        matches!(self, IngestError::Connection(_))
    }

    /// Short message for the failure log; the full error goes in the detail.
    pub fn summary(&self) -> &'static str {
        match self {
            IngestError::Connection(_) => "Database connection error",
            IngestError::RecordValidation(_) => "Invalid record",
            IngestError::OrderNotFound { .. } => "Order not found",
            IngestError::AmbiguousReference { .. } => "Ambiguous reference number",
            IngestError::DateFormat(_) => "Unrecognized date",
            IngestError::InsertVerification { .. } => "Event insert not verified",
            IngestError::UpdateVerification { .. } => "Order update not verified",
            IngestError::Query(_) => "Statement build failed",
            IngestError::Database(_) => "Database error",
        }
    }
}
