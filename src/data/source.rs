//! Data Source Module
//! Fetches raw CSV bytes from a remote URL or a local file, with bounded retry.

use log::{debug, warn};
use std::io::{self, Read};
use std::path::PathBuf;
use std::thread;
use std::time::Duration;
use thiserror::Error;

use crate::config::RetryPolicy;

#[derive(Error, Debug)]
pub enum DataSourceError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Request to {url} failed: {message}")]
    Transport { url: String, message: String },
    #[error("Request to {url} returned HTTP {status}")]
    Status { url: String, status: u16 },
    #[error("Giving up after {attempts} attempts: {last}")]
    Exhausted {
        attempts: u32,
        #[source]
        last: Box<DataSourceError>,
    },
}

impl DataSourceError {
    /// Whether another attempt could plausibly succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            DataSourceError::Io { source, .. } => !matches!(
                source.kind(),
                io::ErrorKind::NotFound | io::ErrorKind::PermissionDenied
            ),
            DataSourceError::Transport { .. } => true,
            DataSourceError::Status { status, .. } => *status >= 500,
            DataSourceError::Exhausted { .. } => false,
        }
    }
}

/// Anything that can hand back the raw bytes of the dataset.
pub trait DataSource: Send + Sync {
    fn fetch(&self) -> Result<Vec<u8>, DataSourceError>;

    /// Human readable location, used in logs and status messages.
    fn describe(&self) -> String;
}

/// Downloads the CSV over HTTP(S).
pub struct HttpSource {
    url: String,
    timeout: Duration,
}

impl HttpSource {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            url: url.into(),
            timeout,
        }
    }
}

impl DataSource for HttpSource {
    fn fetch(&self) -> Result<Vec<u8>, DataSourceError> {
        let response = ureq::get(&self.url)
            .timeout(self.timeout)
            .call()
            .map_err(|e| match e {
                ureq::Error::Status(status, _) => DataSourceError::Status {
                    url: self.url.clone(),
                    status,
                },
                ureq::Error::Transport(t) => DataSourceError::Transport {
                    url: self.url.clone(),
                    message: t.to_string(),
                },
            })?;

        let mut bytes = Vec::new();
        response
            .into_reader()
            .read_to_end(&mut bytes)
            .map_err(|e| DataSourceError::Transport {
                url: self.url.clone(),
                message: e.to_string(),
            })?;

        Ok(bytes)
    }

    fn describe(&self) -> String {
        self.url.clone()
    }
}

/// Reads the CSV from local disk.
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl DataSource for FileSource {
    fn fetch(&self) -> Result<Vec<u8>, DataSourceError> {
        std::fs::read(&self.path).map_err(|source| DataSourceError::Io {
            path: self.path.clone(),
            source,
        })
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// Wraps another source and retries transient failures with exponential backoff.
pub struct RetryingSource<S> {
    inner: S,
    policy: RetryPolicy,
}

impl<S: DataSource> RetryingSource<S> {
    pub fn new(inner: S, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    /// Delay before attempt `attempt + 1`, counting attempts from zero.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let initial = Duration::from_millis(self.policy.initial_backoff_ms);
        let max = Duration::from_millis(self.policy.max_backoff_ms);
        let factor = 2u32.saturating_pow(attempt);
        initial.saturating_mul(factor).min(max)
    }
}

impl<S: DataSource> DataSource for RetryingSource<S> {
    fn fetch(&self) -> Result<Vec<u8>, DataSourceError> {
        let max_attempts = self.policy.max_attempts.max(1);
        let mut attempt = 0;

        loop {
            match self.inner.fetch() {
                Ok(bytes) => return Ok(bytes),
                Err(e) if !e.is_transient() => return Err(e),
                Err(e) => {
                    attempt += 1;
                    if attempt >= max_attempts {
                        return Err(DataSourceError::Exhausted {
                            attempts: attempt,
                            last: Box::new(e),
                        });
                    }
                    let delay = self.backoff(attempt - 1);
                    warn!(
                        "Fetching {} failed (attempt {}/{}): {}; retrying in {:?}",
                        self.inner.describe(),
                        attempt,
                        max_attempts,
                        e,
                        delay
                    );
                    thread::sleep(delay);
                }
            }
        }
    }

    fn describe(&self) -> String {
        self.inner.describe()
    }
}

/// Source that always serves the same bytes. Handy for tests and demos.
pub struct StaticSource {
    bytes: Vec<u8>,
}

impl StaticSource {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: bytes.into(),
        }
    }
}

impl DataSource for StaticSource {
    fn fetch(&self) -> Result<Vec<u8>, DataSourceError> {
        debug!("Serving {} static bytes", self.bytes.len());
        Ok(self.bytes.clone())
    }

    fn describe(&self) -> String {
        "<in-memory>".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Fails with the given error a fixed number of times, then succeeds.
    struct Flaky {
        failures: u32,
        calls: AtomicU32,
        status: Option<u16>,
    }

    impl DataSource for Flaky {
        fn fetch(&self) -> Result<Vec<u8>, DataSourceError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if n < self.failures {
                return Err(match self.status {
                    Some(status) => DataSourceError::Status {
                        url: "http://test".into(),
                        status,
                    },
                    None => DataSourceError::Transport {
                        url: "http://test".into(),
                        message: "connection reset".into(),
                    },
                });
            }
            Ok(b"ok".to_vec())
        }

        fn describe(&self) -> String {
            "flaky".into()
        }
    }

    fn fast_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            initial_backoff_ms: 1,
            max_backoff_ms: 2,
        }
    }

    #[test]
    fn retries_transient_errors_until_success() {
        let flaky = Flaky {
            failures: 2,
            calls: AtomicU32::new(0),
            status: None,
        };
        let source = RetryingSource::new(flaky, fast_policy(3));
        assert_eq!(source.fetch().unwrap(), b"ok");
        assert_eq!(source.inner.calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn gives_up_after_max_attempts() {
        let flaky = Flaky {
            failures: 10,
            calls: AtomicU32::new(0),
            status: Some(503),
        };
        let source = RetryingSource::new(flaky, fast_policy(3));
        match source.fetch() {
            Err(DataSourceError::Exhausted { attempts, .. }) => assert_eq!(attempts, 3),
            other => panic!("expected Exhausted, got {:?}", other),
        }
        assert_eq!(source.inner.calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn client_errors_are_not_retried() {
        let flaky = Flaky {
            failures: 10,
            calls: AtomicU32::new(0),
            status: Some(404),
        };
        let source = RetryingSource::new(flaky, fast_policy(5));
        assert!(matches!(
            source.fetch(),
            Err(DataSourceError::Status { status: 404, .. })
        ));
        assert_eq!(source.inner.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn backoff_doubles_and_caps() {
        let source = RetryingSource::new(
            StaticSource::new(Vec::new()),
            RetryPolicy {
                max_attempts: 5,
                initial_backoff_ms: 100,
                max_backoff_ms: 350,
            },
        );
        assert_eq!(source.backoff(0), Duration::from_millis(100));
        assert_eq!(source.backoff(1), Duration::from_millis(200));
        assert_eq!(source.backoff(2), Duration::from_millis(350));
        assert_eq!(source.backoff(30), Duration::from_millis(350));
    }

    #[test]
    fn missing_file_reports_path() {
        let source = FileSource::new("/definitely/not/here.csv");
        let err = source.fetch().unwrap_err();
        assert!(err.to_string().contains("/definitely/not/here.csv"));
        assert!(!err.is_transient());
    }

    #[test]
    fn missing_file_is_read_once() {
        let source =
            RetryingSource::new(FileSource::new("/definitely/not/here.csv"), fast_policy(3));
        match source.fetch() {
            Err(DataSourceError::Io { source, .. }) => {
                assert_eq!(source.kind(), io::ErrorKind::NotFound)
            }
            other => panic!("expected Io, got {:?}", other),
        }
    }

    #[test]
    fn interrupted_reads_are_transient() {
        let err = DataSourceError::Io {
            path: PathBuf::from("data.csv"),
            source: io::Error::new(io::ErrorKind::Interrupted, "interrupted"),
        };
        assert!(err.is_transient());
    }
}
