use crate::schema::IngestConfig;

pub const DATABASE_URL_ENV: &str = "INGEST_DATABASE_URL";
pub const DB_PASSWORD_ENV: &str = "INGEST_DB_PASSWORD";
pub const CONCURRENCY_ENV: &str = "INGEST_CONCURRENCY";
pub const SOURCE_TIMEZONE_ENV: &str = "INGEST_SOURCE_TIMEZONE";

impl IngestConfig {
    pub fn with_env_overrides(self) -> Self {
        self.apply_env_with(|key| std::env::var(key).ok())
    }

    /// Applies overrides from `get_env`. Empty values are ignored and so is a
    /// concurrency that does not parse as an integer.
    pub fn apply_env_with<F>(mut self, get_env: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| get_env(key).filter(|value| !value.trim().is_empty());

        if let Some(url) = get(DATABASE_URL_ENV) {
            self.database.url = Some(url);
        }
        if let Some(password) = get(DB_PASSWORD_ENV) {
            self.database.password = password;
        }
        if let Some(raw) = get(CONCURRENCY_ENV) {
            match raw.trim().parse::<usize>() {
                Ok(concurrency) => self.concurrency = concurrency,
                Err(err) => tracing::warn!(
                    value = %raw,
                    "Ignoring {CONCURRENCY_ENV}: {err}"
                ),
            }
        }
        if let Some(timezone) = get(SOURCE_TIMEZONE_ENV) {
            self.source_timezone = timezone;
        }

        self
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn overrides_replace_file_values() {
        let config = IngestConfig::default().apply_env_with(env(&[
            (DATABASE_URL_ENV, "sqlite::memory:"),
            (DB_PASSWORD_ENV, "from-env"),
            (CONCURRENCY_ENV, "3"),
            (SOURCE_TIMEZONE_ENV, "Asia/Kolkata"),
        ]));

        assert_eq!(config.database.url.as_deref(), Some("sqlite::memory:"));
        assert_eq!(config.database.password, "from-env");
        assert_eq!(config.concurrency, 3);
        assert_eq!(config.source_timezone, "Asia/Kolkata");
    }

    #[test]
    fn empty_and_malformed_values_are_ignored() {
        let config = IngestConfig::default().apply_env_with(env(&[
            (DATABASE_URL_ENV, "   "),
            (CONCURRENCY_ENV, "many"),
        ]));

        assert!(config.database.url.is_none());
        assert_eq!(config.concurrency, 10);
    }
}
