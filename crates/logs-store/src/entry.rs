use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Info => "info",
            LogLevel::Error => "error",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureLogEntry {
    pub timestamp: DateTime<Utc>,
    pub level: LogLevel,
    /// Reference number of the originating record; `None` for run-level entries.
    pub correlation_id: Option<String>,
    pub message: String,
    pub detail: String,
}

impl FailureLogEntry {
    pub fn new(
        level: LogLevel,
        correlation_id: Option<&str>,
        message: impl Into<String>,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            level,
            correlation_id: correlation_id.map(str::to_string),
            message: message.into(),
            detail: detail.into(),
        }
    }

    pub fn error(
        correlation_id: Option<&str>,
        message: impl Into<String>,
        detail: impl Into<String>,
    ) -> Self {
        Self::new(LogLevel::Error, correlation_id, message, detail)
    }

    pub fn info(message: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::new(LogLevel::Info, None, message, detail)
    }
}
