use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::{FailureLog, FailureLogEntry, FailureLogError};

/// Keeps entries in memory for tests.
#[derive(Debug, Default)]
pub struct MemoryFailureLog {
    entries: Mutex<Vec<FailureLogEntry>>,
}

impl MemoryFailureLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn entries(&self) -> Vec<FailureLogEntry> {
        self.entries.lock().await.clone()
    }
}

#[async_trait]
impl FailureLog for MemoryFailureLog {
    async fn log(&self, entry: FailureLogEntry) -> Result<(), FailureLogError> {
        self.entries.lock().await.push(entry);
        Ok(())
    }
}
