//! Error types for the collector
//!
//! Fetch failures are values handed back to callers (the harvest degrades and
//! continues), while sink, graph and configuration errors are ordinary `Result`
//! errors.

use thiserror::Error;

/// Why a request to the open-data API produced no data
///
/// Returned inside [`crate::camara::FetchOutcome::Failed`] and
/// [`crate::camara::Detail::Unavailable`]; never raised past the client.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchFailure {
    #[error("transport error after {attempts} attempt(s): {message}")]
    Transport { attempts: u32, message: String },

    #[error("HTTP {status} after {attempts} attempt(s)")]
    Status { status: u16, attempts: u32 },

    #[error("rate limited (HTTP 429) after {attempts} attempt(s)")]
    RateLimited { attempts: u32 },

    #[error("undecodable response body after {attempts} attempt(s): {message}")]
    Decode { attempts: u32, message: String },

    #[error("response carried no usable `dados` payload")]
    MissingData,

    #[error("invalid endpoint '{endpoint}': {message}")]
    InvalidEndpoint { endpoint: String, message: String },
}

impl FetchFailure {
    /// Number of HTTP attempts made before giving up (0 when none were made)
    pub fn attempts(&self) -> u32 {
        match self {
            Self::Transport { attempts, .. }
            | Self::Status { attempts, .. }
            | Self::RateLimited { attempts }
            | Self::Decode { attempts, .. } => *attempts,
            Self::MissingData | Self::InvalidEndpoint { .. } => 0,
        }
    }
}

/// Errors raised while persisting or reading back a dataset
#[derive(Error, Debug)]
pub enum SinkError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Serialization error for dataset '{name}': {source}")]
    Serialization {
        name: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Errors raised by a graph store
#[derive(Error, Debug)]
pub enum GraphError {
    #[error("Graph backend error: {0}")]
    Backend(String),

    #[error("Graph query failed: {query}: {message}")]
    Query { query: String, message: String },
}

/// Configuration errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: &'static str, message: String },

    #[error("Invalid date range: start {start} is after end {end}")]
    InvertedDateRange { start: String, end: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_failure_attempts() {
        assert_eq!(
            FetchFailure::Transport {
                attempts: 3,
                message: "connection reset".to_string()
            }
            .attempts(),
            3
        );
        assert_eq!(FetchFailure::RateLimited { attempts: 2 }.attempts(), 2);
        assert_eq!(FetchFailure::MissingData.attempts(), 0);
    }

    #[test]
    fn test_fetch_failure_display() {
        let failure = FetchFailure::Status {
            status: 503,
            attempts: 3,
        };
        assert_eq!(failure.to_string(), "HTTP 503 after 3 attempt(s)");
    }
}
