//! Configuration shared by the WebHDFS blocks.
//!
//! Every value is resolved once when a block is built; nothing is
//! reconfigured while a stream is running.

use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use serde::{Deserialize, Serialize, de::DeserializeOwned};
use snafu::{ResultExt, Snafu, ensure};

use crate::{SampleType, http::HttpError, retries::RetryPolicy};

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum ConfigError {
    #[snafu(display("Invalid WebHDFS address {:?}: {}", address, reason))]
    InvalidAddress { address: String, reason: String },
    #[snafu(display("Invalid folder {:?}: {}", folder, reason))]
    InvalidFolder { folder: String, reason: String },
    #[snafu(display("Invalid file name {:?}: {}", file_name, reason))]
    InvalidFileName { file_name: String, reason: String },
    #[snafu(display("Invalid HDFS user name {:?}", user))]
    InvalidUser { user: String },
    #[snafu(display(
        "Buffer size of {} bytes cannot hold one {} sample ({} bytes)",
        buffer_size,
        sample_type,
        sample_type.width()
    ))]
    BufferTooSmall {
        buffer_size: usize,
        sample_type: SampleType,
    },
    #[snafu(display("Request timeout must be greater than zero"))]
    ZeroTimeout,
    #[snafu(display(
        "Retry backoff must satisfy initial ({}s) <= max ({}s) <= {}s",
        initial_secs,
        max_secs,
        MAX_BACKOFF_SECS
    ))]
    InvalidBackoff { initial_secs: u64, max_secs: u64 },
    #[snafu(display("Could not read config file {}: {}", path.display(), source))]
    ReadFile {
        path: PathBuf,
        source: std::io::Error,
    },
    #[snafu(display("Could not parse config file {}: {}", path.display(), source))]
    ParseFile {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[snafu(display("Could not build HTTP transport: {}", source))]
    BuildTransport { source: HttpError },
}

/// Longest wait allowed between retries, one hour.
pub const MAX_BACKOFF_SECS: u64 = 3_600;

/// Generates a default configuration for a block, as printed by
/// `hdfs-stream generate`.
pub trait GenerateConfig {
    fn generate_config() -> Result<toml::Value, toml::ser::Error>;
}

/// Per-request timeout and retry settings.
#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct RequestConfig {
    /// Upper bound on each blocking HTTP call, in seconds.
    pub timeout_secs: u64,

    /// How many times a transient failure is retried before the stream fails.
    pub retry_attempts: usize,

    /// Backoff before the first retry, in seconds. Doubles on each retry.
    pub retry_initial_backoff_secs: u64,

    /// Ceiling for the retry backoff, in seconds.
    pub retry_max_backoff_secs: u64,
}

impl Default for RequestConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 10,
            retry_attempts: 3,
            retry_initial_backoff_secs: 1,
            retry_max_backoff_secs: 10,
        }
    }
}

impl RequestConfig {
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub const fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.retry_attempts,
            Duration::from_secs(self.retry_initial_backoff_secs),
            Duration::from_secs(self.retry_max_backoff_secs),
        )
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        ensure!(self.timeout_secs > 0, ZeroTimeoutSnafu);
        ensure!(
            self.retry_initial_backoff_secs <= self.retry_max_backoff_secs
                && self.retry_max_backoff_secs <= MAX_BACKOFF_SECS,
            InvalidBackoffSnafu {
                initial_secs: self.retry_initial_backoff_secs,
                max_secs: self.retry_max_backoff_secs,
            }
        );
        Ok(())
    }
}

pub(crate) fn validate_buffer_size(
    buffer_size: usize,
    sample_type: SampleType,
) -> Result<(), ConfigError> {
    ensure!(
        buffer_size >= sample_type.width(),
        BufferTooSmallSnafu {
            buffer_size,
            sample_type,
        }
    );
    Ok(())
}

pub(crate) fn default_user() -> String {
    "hadoop".to_owned()
}

pub(crate) const fn default_sample_type() -> SampleType {
    SampleType::Complex64
}

/// 128 MiB, one HDFS block.
pub(crate) const fn default_buffer_size() -> usize {
    134_217_728
}

/// Reads and deserializes a TOML config file.
pub fn load_from_path<T: DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let contents = fs::read_to_string(path).context(ReadFileSnafu { path })?;
    toml::from_str(&contents).context(ParseFileSnafu { path })
}
