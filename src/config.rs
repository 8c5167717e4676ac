use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Top-level configuration for the response core.
///
/// Everything is optional in `boardroom.toml`; missing fields take the
/// defaults below so a bare `BoardConfig::default()` is always usable.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct BoardConfig {
    /// Upper bound on simultaneous in-flight model calls per batch.
    #[serde(default = "default_concurrency")]
    pub max_concurrent_requests: usize,
    /// Per-call model timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub response_timeout_ms: u64,
    /// Enables both the fallback cache and the batch result cache.
    #[serde(default = "default_true")]
    pub enable_caching: bool,
    /// TTL for whole-batch result cache entries, in milliseconds.
    #[serde(default = "default_result_ttl_ms")]
    pub result_cache_ttl_ms: u64,
    #[serde(default)]
    pub retry: RetryConfig,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct RetryConfig {
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
    #[serde(default = "default_multiplier")]
    pub backoff_multiplier: f64,
}

fn default_concurrency() -> usize {
    5
}
fn default_timeout_ms() -> u64 {
    30_000
}
fn default_true() -> bool {
    true
}
fn default_result_ttl_ms() -> u64 {
    5 * 60 * 1000
}
fn default_max_retries() -> u32 {
    3
}
fn default_base_delay_ms() -> u64 {
    500
}
fn default_max_delay_ms() -> u64 {
    8_000
}
fn default_multiplier() -> f64 {
    2.0
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            max_concurrent_requests: default_concurrency(),
            response_timeout_ms: default_timeout_ms(),
            enable_caching: true,
            result_cache_ttl_ms: default_result_ttl_ms(),
            retry: RetryConfig::default(),
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            base_delay_ms: default_base_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            backoff_multiplier: default_multiplier(),
        }
    }
}

impl BoardConfig {
    /// Load `boardroom.toml` from the working directory, falling back to
    /// defaults when the file is missing. A malformed file is an error; a
    /// missing one is not.
    pub fn load() -> Result<Self> {
        Self::load_from("boardroom.toml")
    }

    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&raw)?;
        Ok(config)
    }

    pub fn response_timeout(&self) -> Duration {
        Duration::from_millis(self.response_timeout_ms)
    }

    pub fn result_cache_ttl(&self) -> Duration {
        Duration::from_millis(self.result_cache_ttl_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = BoardConfig::default();
        assert_eq!(config.max_concurrent_requests, 5);
        assert!(config.enable_caching);
        assert_eq!(config.retry.max_retries, 3);
        assert_eq!(config.retry.backoff_multiplier, 2.0);
    }

    #[test]
    fn test_partial_toml() {
        let config: BoardConfig =
            toml::from_str("max_concurrent_requests = 2\n[retry]\nmax_retries = 1\n").unwrap();
        assert_eq!(config.max_concurrent_requests, 2);
        assert_eq!(config.retry.max_retries, 1);
        // Unspecified fields keep their defaults
        assert_eq!(config.response_timeout_ms, 30_000);
        assert_eq!(config.retry.base_delay_ms, 500);
    }

    #[test]
    fn test_missing_file_is_default() {
        let config = BoardConfig::load_from("/nonexistent/boardroom.toml").unwrap();
        assert_eq!(config.max_concurrent_requests, 5);
    }
}
