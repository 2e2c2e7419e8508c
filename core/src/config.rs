//! Retry and timeout policy shared by every request built from a `Client`.
//!
//! # Design
//! `Config` is plain serde data with the field units of the JSON surface
//! (seconds for the timeout, milliseconds for the retry interval). It is
//! wrapped in an `Arc` by `Client` and never mutated afterwards, so
//! concurrent dispatches from independent requests can share it.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

const DEFAULT_TIMEOUT_SECS: u64 = 10;
const DEFAULT_RETRY_STATUS: [u16; 6] = [500, 502, 503, 504, 506, 507];
const DEFAULT_RETRY_COUNT: u32 = 1;
const DEFAULT_RETRY_INTERVAL_MS: u64 = 1000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Timeout applied to each individual attempt. Zero disables it.
    pub timeout_secs: u64,
    /// Response statuses treated like a transport failure.
    pub retry_status: Vec<u16>,
    /// Retries against the same endpoint before failing over.
    pub retry_count: u32,
    /// Pause between retries against the same endpoint.
    pub retry_interval_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            retry_status: DEFAULT_RETRY_STATUS.to_vec(),
            retry_count: DEFAULT_RETRY_COUNT,
            retry_interval_ms: DEFAULT_RETRY_INTERVAL_MS,
        }
    }
}

impl Config {
    /// Parse and validate a JSON document. Missing fields take their defaults.
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&raw)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(&status) = self.retry_status.iter().find(|s| !(100..=599).contains(*s)) {
            return Err(ConfigError::InvalidRetryStatus(status));
        }
        Ok(())
    }

    /// Per-attempt timeout, or `None` when `timeout_secs` is zero.
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs))
    }

    pub fn retry_interval(&self) -> Duration {
        Duration::from_millis(self.retry_interval_ms)
    }

    pub fn is_retry_status(&self, status: u16) -> bool {
        self.retry_status.contains(&status)
    }

    /// Upper bound on attempts for one dispatch over `endpoints` endpoints.
    pub fn max_attempts(&self, endpoints: usize) -> u64 {
        (u64::from(self.retry_count) + 1) * endpoints as u64
    }
}
