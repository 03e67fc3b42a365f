use std::{collections::HashMap, fs::File, io::Read, path::Path};

use config::ColumnMapping;
use csv::{ReaderBuilder, Trim};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RecordSourceError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error("Input has no '{0}' column")]
    MissingColumn(String),
}

/// One input row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Record {
    /// 1-based line in the source file.
    pub line: u64,
    pub reference: String,
    pub status: String,
    fields: HashMap<String, String>,
    /// Set when the row could not be decoded cleanly; such a record is
    /// rejected instead of written.
    invalid: Option<String>,
}

impl Record {
    pub fn new(reference: &str, status: &str) -> Self {
        Self {
            reference: reference.to_string(),
            status: status.to_string(),
            ..Default::default()
        }
    }

    pub fn with_field(mut self, column: &str, value: &str) -> Self {
        self.fields.insert(column.to_string(), value.to_string());
        self
    }

    pub fn invalid_reason(&self) -> Option<&str> {
        self.invalid.as_deref()
    }

    /// The value of `column`, or `None` when it is absent or blank.
    pub fn field(&self, column: &str) -> Option<&str> {
        self.fields
            .get(column)
            .map(|value| value.trim())
            .filter(|value| !value.is_empty())
    }
}

pub fn read_records(path: &Path, columns: &ColumnMapping) -> Result<Vec<Record>, RecordSourceError> {
    let file = File::open(path)?;
    let records = read_records_from(file, columns)?;
    tracing::info!(
        path = %path.display(),
        count = records.len(),
        "Read input records"
    );
    Ok(records)
}

/// Reads a CSV with a header row. The reference column must exist; missing
/// status or event columns are treated as empty on every row.
pub fn read_records_from<R: Read>(
    reader: R,
    columns: &ColumnMapping,
) -> Result<Vec<Record>, RecordSourceError> {
    let mut reader = ReaderBuilder::new()
        .trim(Trim::All)
        .flexible(true)
        .from_reader(reader);

    let headers = reader.headers()?.clone();
    let position = |name: &str| headers.iter().position(|header| header == name);

    let reference_idx = position(&columns.reference)
        .ok_or_else(|| RecordSourceError::MissingColumn(columns.reference.clone()))?;
    let status_idx = position(&columns.status);
    if status_idx.is_none() {
        tracing::warn!(column = %columns.status, "Status column missing from input");
    }
    for event in &columns.events {
        if position(&event.column).is_none() {
            tracing::warn!(column = %event.column, "Event column missing from input");
        }
    }

    let mut records = Vec::new();
    for row in reader.byte_records() {
        let row = row?;
        let line = row.position().map_or(0, |pos| pos.line());

        let mut invalid_columns = Vec::new();
        let values: Vec<String> = headers
            .iter()
            .zip(row.iter())
            .map(|(header, raw)| match std::str::from_utf8(raw) {
                Ok(value) => value.to_string(),
                Err(_) => {
                    invalid_columns.push(header);
                    String::from_utf8_lossy(raw).into_owned()
                }
            })
            .collect();
        let value_at = |idx: usize| values.get(idx).cloned().unwrap_or_default();

        let invalid = (!invalid_columns.is_empty())
            .then(|| format!("invalid UTF-8 in column(s): {}", invalid_columns.join(", ")));
        if let Some(reason) = &invalid {
            tracing::warn!(line, "{reason}");
        }

        records.push(Record {
            line,
            reference: value_at(reference_idx),
            status: status_idx.map(value_at).unwrap_or_default(),
            fields: headers
                .iter()
                .map(str::to_string)
                .zip(values.iter().cloned())
                .collect(),
            invalid,
        });
    }

    Ok(records)
}
