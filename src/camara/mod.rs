//! Chamber of Deputies open-data API integration
//!
//! This module provides:
//! - API record types (entities with a validated id, flat join records)
//! - A call-counting rate limiter
//! - A retrying, paginating client over a pluggable HTTP transport
//! - Collectors for each entity type and their sub-resources
//! - The relationship flattener producing join records

pub mod client;
pub mod collectors;
pub mod flatten;
pub mod rate_limit;
pub mod transport;
pub mod types;

#[cfg(test)]
pub(crate) mod test_support;

pub use client::{CamaraClient, Collected, Detail, FetchOutcome, RequestStatsSnapshot, RetryPolicy};
pub use collectors::{DateRange, EntityCollector, EntityKind, SortOrder};
pub use flatten::{flatten, Flattened};
pub use rate_limit::{RateLimitPolicy, RateLimiter, Sleeper, TokioSleeper};
pub use transport::{HttpResponse, HttpTransport, ReqwestTransport, TransportError};
pub use types::*;
