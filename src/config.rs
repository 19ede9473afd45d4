//! Dashboard configuration.
//! Defaults point at the published upstream CSV; an optional `camedu.json`
//! next to the binary can override them.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::data::{
    DataSource, DuplicatePolicy, FileSource, HttpSource, RetryingSource, ValidationMode,
};

/// Upstream location of the cleaned 2020-2021 dataset.
pub const DEFAULT_DATA_URL: &str =
    "https://raw.githubusercontent.com/bur3hani/camedu/main/cleaned_cambodia_education_2020_2021.csv";

/// Config file looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = "camedu.json";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid config {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Where the dataset comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceLocation {
    Url(String),
    Path(PathBuf),
}

impl Default for SourceLocation {
    fn default() -> Self {
        SourceLocation::Url(DEFAULT_DATA_URL.to_string())
    }
}

/// Bounded retry with exponential backoff for fetching the dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff_ms: 500,
            max_backoff_ms: 4000,
        }
    }
}

/// Top level settings for the dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub source: SourceLocation,
    pub http_timeout_secs: u64,
    pub retry: RetryPolicy,
    /// `None` keeps the dataset for the whole process lifetime.
    pub cache_ttl_secs: Option<u64>,
    pub duplicate_policy: DuplicatePolicy,
    pub validation: ValidationMode,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            source: SourceLocation::default(),
            http_timeout_secs: 30,
            retry: RetryPolicy::default(),
            cache_ttl_secs: None,
            duplicate_policy: DuplicatePolicy::default(),
            validation: ValidationMode::default(),
        }
    }
}

impl DashboardConfig {
    /// Read a JSON config file. Missing keys fall back to defaults.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::Json {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Use the file at `path` if it exists, defaults otherwise.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            log::info!("Loading config from {}", path.display());
            Self::from_file(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn cache_ttl(&self) -> Option<Duration> {
        self.cache_ttl_secs.map(Duration::from_secs)
    }

    /// Build the configured data source, wrapped in the retry policy.
    pub fn build_source(&self) -> Box<dyn DataSource> {
        match &self.source {
            SourceLocation::Url(url) => Box::new(RetryingSource::new(
                HttpSource::new(url.clone(), Duration::from_secs(self.http_timeout_secs)),
                self.retry,
            )),
            SourceLocation::Path(path) => {
                Box::new(RetryingSource::new(FileSource::new(path.clone()), self.retry))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn defaults_point_at_upstream() {
        let config = DashboardConfig::default();
        assert_eq!(config.source, SourceLocation::Url(DEFAULT_DATA_URL.into()));
        assert_eq!(config.cache_ttl(), None);
        assert_eq!(config.duplicate_policy, DuplicatePolicy::FirstMatch);
        assert_eq!(config.validation, ValidationMode::Strict);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let mut tmp = NamedTempFile::new().unwrap();
        write!(
            tmp,
            r#"{{"source": {{"path": "data/local.csv"}}, "cache_ttl_secs": 600, "retry": {{"max_attempts": 5}}}}"#
        )
        .unwrap();

        let config = DashboardConfig::from_file(tmp.path()).unwrap();
        assert_eq!(config.source, SourceLocation::Path("data/local.csv".into()));
        assert_eq!(config.cache_ttl(), Some(Duration::from_secs(600)));
        assert_eq!(config.retry.max_attempts, 5);
        assert_eq!(config.retry.initial_backoff_ms, 500);
        assert_eq!(config.http_timeout_secs, 30);
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let config = DashboardConfig::load_or_default(Path::new("/no/such/camedu.json")).unwrap();
        assert_eq!(config, DashboardConfig::default());
    }

    #[test]
    fn malformed_file_is_an_error() {
        let mut tmp = NamedTempFile::new().unwrap();
        write!(tmp, "{{ not json").unwrap();
        assert!(matches!(
            DashboardConfig::from_file(tmp.path()),
            Err(ConfigError::Json { .. })
        ));
    }
}
