use std::path::Path;

use thiserror::Error;

mod env;
mod schema;

pub use schema::{ColumnMapping, DatabaseConfig, EventColumn, IngestConfig, RetrySettings};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error("Validation error: {0}")]
    ValidationError(String),
}

/// Reads, applies environment overrides, normalizes and validates.
pub fn load_config_from_file(config_path: &Path) -> Result<IngestConfig, ConfigError> {
    let raw_config = std::fs::read_to_string(config_path)?;
    let config = IngestConfig::from_raw(&raw_config)?
        .with_env_overrides()
        .normalized();
    config.validate()?;
    tracing::info!(
        path = %config_path.display(),
        organization_id = %config.organization_id,
        concurrency = config.concurrency,
        source_timezone = %config.source_timezone,
        "Loaded ingestion config"
    );
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_and_validates_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{ "organisationId": " org-1 ", "database": "shipments", "concurrency": 3 }"#,
        )
        .unwrap();

        let config = load_config_from_file(&path).unwrap();
        assert_eq!(config.organization_id, "org-1");
        assert_eq!(config.concurrency, 3);
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            load_config_from_file(&dir.path().join("absent.json")),
            Err(ConfigError::Io(_))
        ));
    }

    #[test]
    fn invalid_values_fail_loading() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{ "database": "shipments" }"#).unwrap();

        assert!(matches!(
            load_config_from_file(&path),
            Err(ConfigError::ValidationError(_))
        ));
    }
}
