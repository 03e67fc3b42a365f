use std::{
    fs::{File, OpenOptions},
    path::Path,
};

use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::Mutex;

use crate::{FailureLog, FailureLogEntry, FailureLogError};

const HEADER: [&str; 5] = ["Timestamp", "Level", "Reference_Number", "Message", "Details"];
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Serialize)]
struct CsvRow<'a> {
    timestamp: String,
    level: &'static str,
    reference_number: &'a str,
    message: &'a str,
    details: &'a str,
}

/// CSV file sink. The header row is written only when the file is new or
/// empty, so repeated runs keep appending to one log.
pub struct CsvFailureLog {
    writer: Mutex<csv::Writer<File>>,
}

impl CsvFailureLog {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, FailureLogError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new().create(true).append(true).open(path)?;
        let is_new = file.metadata()?.len() == 0;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);
        if is_new {
            writer.write_record(HEADER)?;
            writer.flush()?;
        }

        tracing::debug!(path = %path.display(), is_new, "Opened failure log");
        Ok(Self {
            writer: Mutex::new(writer),
        })
    }
}

#[async_trait]
impl FailureLog for CsvFailureLog {
    async fn log(&self, entry: FailureLogEntry) -> Result<(), FailureLogError> {
        let row = CsvRow {
            timestamp: entry.timestamp.format(TIMESTAMP_FORMAT).to_string(),
            level: entry.level.as_str(),
            reference_number: entry.correlation_id.as_deref().unwrap_or(""),
            message: &entry.message,
            details: &entry.detail,
        };

        let mut writer = self.writer.lock().await;
        writer.serialize(row)?;
        writer.flush()?;
        writer.get_ref().sync_data()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read_rows(path: &Path) -> Vec<Vec<String>> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .from_path(path)
            .unwrap();
        reader
            .records()
            .map(|record| record.unwrap().iter().map(str::to_string).collect())
            .collect()
    }

    #[tokio::test]
    async fn writes_header_once_and_appends_entries() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs").join("ingest.csv");

        {
            let log = CsvFailureLog::open(&path).unwrap();
            log.log(FailureLogEntry::error(
                Some("REF1"),
                "Order not found",
                "",
            ))
            .await
            .unwrap();
        }
        {
            let log = CsvFailureLog::open(&path).unwrap();
            log.log(FailureLogEntry::info(
                "Ingestion completed",
                "total=2, failed=1",
            ))
            .await
            .unwrap();
        }

        let rows = read_rows(&path);
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0], HEADER.iter().map(|h| h.to_string()).collect::<Vec<_>>());
        assert_eq!(rows[1][1], "error");
        assert_eq!(rows[1][2], "REF1");
        assert_eq!(rows[1][3], "Order not found");
        assert_eq!(rows[2][1], "info");
        assert_eq!(rows[2][2], "");
        assert_eq!(rows[2][4], "total=2, failed=1");
    }

    #[tokio::test]
    async fn concurrent_writers_do_not_interleave_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ingest.csv");
        let log = std::sync::Arc::new(CsvFailureLog::open(&path).unwrap());

        let mut handles = Vec::new();
        for i in 0..16 {
            let log = log.clone();
            handles.push(tokio::spawn(async move {
                let reference = format!("REF{i}");
                log.log(FailureLogEntry::error(
                    Some(&reference),
                    "Date format not recognized",
                    "value \"31/02/2024, 10:00\"",
                ))
                .await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let rows = read_rows(&path);
        assert_eq!(rows.len(), 17);
        assert!(rows[1..].iter().all(|row| row.len() == 5));
    }
}
