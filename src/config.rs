//! Collector configuration
//!
//! All fields have defaults matching the public API's published limits, so an
//! empty YAML file (or no file at all) yields a working configuration.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;
use url::Url;

use crate::camara::client::RetryPolicy;
use crate::camara::collectors::DateRange;
use crate::camara::rate_limit::RateLimitPolicy;
use crate::error::ConfigError;

pub const CAMARA_API_BASE: &str = "https://dadosabertos.camara.leg.br/api/v2";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CollectorConfig {
    /// API base, endpoints such as `/deputados` are appended to it
    pub base_url: Url,
    pub request_timeout_secs: u64,
    /// Attempts per request, including the first
    pub max_attempts: u32,
    /// Wait after an HTTP 429
    pub rate_limit_cooldown_secs: u64,
    /// Wait after a transport error
    pub transport_backoff_secs: u64,
    pub courtesy_delay_ms: u64,
    pub requests_per_window: u64,
    pub window_cooldown_secs: u64,
    pub page_size: u32,
    pub date_start: NaiveDate,
    pub date_end: NaiveDate,
    pub output_dir: PathBuf,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        let range = DateRange::default();
        let retry = RetryPolicy::default();
        let limits = RateLimitPolicy::default();

        Self {
            base_url: default_base_url(),
            request_timeout_secs: 30,
            max_attempts: retry.max_attempts,
            rate_limit_cooldown_secs: retry.rate_limit_cooldown.as_secs(),
            transport_backoff_secs: retry.transport_backoff.as_secs(),
            courtesy_delay_ms: limits.courtesy_delay.as_millis() as u64,
            requests_per_window: limits.requests_per_window,
            window_cooldown_secs: limits.cooldown.as_secs(),
            page_size: 100,
            date_start: range.start(),
            date_end: range.end(),
            output_dir: PathBuf::from("dados_camara"),
        }
    }
}

fn default_base_url() -> Url {
    Url::parse(CAMARA_API_BASE).expect("CAMARA_API_BASE is a valid URL")
}

impl CollectorConfig {
    /// Load and validate a YAML configuration file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        info!("Loading collector configuration from {}", path.display());

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;

        let config: CollectorConfig = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;

        config
            .validate()
            .with_context(|| format!("Invalid configuration in {}", path.display()))?;

        Ok(config)
    }

    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        if self.max_attempts == 0 {
            return Err(ConfigError::InvalidValue {
                field: "max_attempts",
                message: "at least one attempt is required".to_string(),
            });
        }
        if self.page_size == 0 {
            return Err(ConfigError::InvalidValue {
                field: "page_size",
                message: "page size must be positive".to_string(),
            });
        }
        if self.requests_per_window == 0 {
            return Err(ConfigError::InvalidValue {
                field: "requests_per_window",
                message: "request ceiling must be positive".to_string(),
            });
        }
        if self.base_url.cannot_be_a_base() {
            return Err(ConfigError::InvalidValue {
                field: "base_url",
                message: format!("'{}' cannot be used as a base URL", self.base_url),
            });
        }
        self.date_range().map(|_| ())
    }

    pub fn date_range(&self) -> std::result::Result<DateRange, ConfigError> {
        DateRange::new(self.date_start, self.date_end)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts,
            rate_limit_cooldown: Duration::from_secs(self.rate_limit_cooldown_secs),
            transport_backoff: Duration::from_secs(self.transport_backoff_secs),
        }
    }

    pub fn rate_limit_policy(&self) -> RateLimitPolicy {
        RateLimitPolicy {
            courtesy_delay: Duration::from_millis(self.courtesy_delay_ms),
            requests_per_window: self.requests_per_window,
            cooldown: Duration::from_secs(self.window_cooldown_secs),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_match_api_limits() {
        let config = CollectorConfig::default();

        assert_eq!(config.base_url.as_str(), CAMARA_API_BASE);
        assert_eq!(config.max_attempts, 3);
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
        assert_eq!(config.retry_policy().rate_limit_cooldown, Duration::from_secs(60));
        assert_eq!(config.retry_policy().transport_backoff, Duration::from_secs(5));
        assert_eq!(config.rate_limit_policy().requests_per_window, 100);
        assert_eq!(config.page_size, 100);
        assert_eq!(config.date_start.to_string(), "2019-01-01");
        assert_eq!(config.date_end.to_string(), "2024-12-31");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_partial_yaml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "max_attempts: 5\npage_size: 50\ndate_start: 2023-02-01\noutput_dir: out"
        )
        .unwrap();

        let config = CollectorConfig::load(file.path()).unwrap();
        assert_eq!(config.max_attempts, 5);
        assert_eq!(config.page_size, 50);
        assert_eq!(config.date_start.to_string(), "2023-02-01");
        assert_eq!(config.output_dir, PathBuf::from("out"));
        assert_eq!(config.requests_per_window, 100);
    }

    #[test]
    fn test_load_rejects_unknown_fields() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "max_retries: 5").unwrap();
        assert!(CollectorConfig::load(file.path()).is_err());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let config = CollectorConfig {
            max_attempts: 0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue {
                field: "max_attempts",
                ..
            })
        ));

        let config = CollectorConfig {
            date_start: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvertedDateRange { .. })
        ));
    }
}
