//! Chamber of Deputies API client
//!
//! Rate-limited, retrying HTTP client for the open-data API. Every failure is
//! absorbed here and handed back as a value: a harvest of several thousand
//! calls must survive individual lookups going wrong.

use anyhow::Result;
use serde::Serialize;
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

use super::rate_limit::{RateLimiter, Sleeper, TokioSleeper};
use super::transport::{HttpTransport, ReqwestTransport};
use super::types::{EntityRecord, Page};
use crate::config::CollectorConfig;
use crate::error::FetchFailure;

const HTTP_OK: u16 = 200;
const HTTP_TOO_MANY_REQUESTS: u16 = 429;

/// Query string as ordered key/value pairs
pub type Query = Vec<(String, String)>;

pub fn param(key: &str, value: impl ToString) -> (String, String) {
    (key.to_string(), value.to_string())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts per request, including the first. HTTP 429 consumes an attempt.
    pub max_attempts: u32,
    pub rate_limit_cooldown: Duration,
    pub transport_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            rate_limit_cooldown: Duration::from_secs(60),
            transport_backoff: Duration::from_secs(5),
        }
    }
}

/// Result of one logical request (all of its attempts)
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome<T> {
    Success(T),
    Failed(FetchFailure),
}

impl<T> FetchOutcome<T> {
    pub fn ok(self) -> Option<T> {
        match self {
            Self::Success(value) => Some(value),
            Self::Failed(_) => None,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    pub fn failure(&self) -> Option<&FetchFailure> {
        match self {
            Self::Success(_) => None,
            Self::Failed(failure) => Some(failure),
        }
    }
}

/// Result of a single-item or sub-resource lookup
///
/// `Unavailable` is "no data for this call": callers skip the item and carry on.
#[derive(Debug, Clone, PartialEq)]
pub enum Detail<T> {
    Found(T),
    Unavailable(FetchFailure),
}

impl<T> Detail<T> {
    pub fn found(self) -> Option<T> {
        match self {
            Self::Found(value) => Some(value),
            Self::Unavailable(_) => None,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, Self::Found(_))
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Detail<U> {
        match self {
            Self::Found(value) => Detail::Found(f(value)),
            Self::Unavailable(failure) => Detail::Unavailable(failure),
        }
    }

    /// Turn a found value into another detail (e.g. validate its shape)
    pub fn and_then<U>(self, f: impl FnOnce(T) -> Detail<U>) -> Detail<U> {
        match self {
            Self::Found(value) => f(value),
            Self::Unavailable(failure) => Detail::Unavailable(failure),
        }
    }
}

impl<T: Default> Detail<T> {
    /// Lenient view: an unavailable detail reads as empty
    pub fn unwrap_or_default(self) -> T {
        self.found().unwrap_or_default()
    }
}

/// Items gathered from a paginated collection
#[derive(Debug, Clone, Default)]
pub struct Collected {
    pub items: Vec<EntityRecord>,
    pub pages: u32,
    /// Items dropped for lacking a usable `id`
    pub rejected: usize,
    /// Set when pagination stopped because a page could not be fetched
    pub failure: Option<FetchFailure>,
}

impl Collected {
    pub fn is_complete(&self) -> bool {
        self.failure.is_none()
    }
}

#[derive(Debug, Default)]
struct RequestStats {
    attempts: AtomicU64,
    successes: AtomicU64,
    rate_limited: AtomicU64,
    transport_errors: AtomicU64,
    failures: AtomicU64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RequestStatsSnapshot {
    pub attempts: u64,
    pub successes: u64,
    /// HTTP 429 responses seen
    pub rate_limited: u64,
    pub transport_errors: u64,
    /// Requests that exhausted every attempt
    pub failures: u64,
}

pub struct CamaraClient {
    base_url: Url,
    transport: Arc<dyn HttpTransport>,
    sleeper: Arc<dyn Sleeper>,
    limiter: RateLimiter,
    retry: RetryPolicy,
    page_size: u32,
    stats: RequestStats,
}

impl CamaraClient {
    /// Client talking to the real API
    pub fn new(config: &CollectorConfig) -> Result<Self> {
        let transport = ReqwestTransport::new(config.request_timeout())?;
        Ok(Self::with_transport(
            config,
            Arc::new(transport),
            Arc::new(TokioSleeper),
        ))
    }

    pub fn with_transport(
        config: &CollectorConfig,
        transport: Arc<dyn HttpTransport>,
        sleeper: Arc<dyn Sleeper>,
    ) -> Self {
        Self {
            base_url: config.base_url.clone(),
            transport,
            limiter: RateLimiter::new(config.rate_limit_policy(), sleeper.clone()),
            sleeper,
            retry: config.retry_policy(),
            page_size: config.page_size.max(1),
            stats: RequestStats::default(),
        }
    }

    /// Resolve an endpoint such as `/deputados/204554` against the base URL
    pub fn endpoint_url(&self, endpoint: &str) -> std::result::Result<Url, FetchFailure> {
        let url = format!(
            "{}/{}",
            self.base_url.as_str().trim_end_matches('/'),
            endpoint.trim_start_matches('/')
        );
        Url::parse(&url).map_err(|e| FetchFailure::InvalidEndpoint {
            endpoint: endpoint.to_string(),
            message: e.to_string(),
        })
    }

    /// Issue one GET with bounded retries
    ///
    /// Every attempt goes through the rate limiter. When attempts remain,
    /// HTTP 429 waits the rate-limit cooldown and transport or decode errors
    /// wait the transport backoff; other statuses retry immediately.
    pub async fn execute(&self, endpoint: &str, query: &[(String, String)]) -> FetchOutcome<Value> {
        let url = match self.endpoint_url(endpoint) {
            Ok(url) => url,
            Err(failure) => return FetchOutcome::Failed(failure),
        };

        let max_attempts = self.retry.max_attempts.max(1);
        let mut failure = FetchFailure::Transport {
            attempts: 0,
            message: "no attempt made".to_string(),
        };

        for attempt in 1..=max_attempts {
            self.limiter.acquire().await;
            self.stats.attempts.fetch_add(1, Ordering::Relaxed);
            let attempts_left = attempt < max_attempts;

            match self.transport.get(&url, query).await {
                Ok(response) if response.status == HTTP_OK => {
                    match serde_json::from_str::<Value>(&response.body) {
                        Ok(body) => {
                            self.stats.successes.fetch_add(1, Ordering::Relaxed);
                            return FetchOutcome::Success(body);
                        }
                        Err(e) => {
                            warn!(url = %response.url, attempt, error = %e, "Undecodable response body");
                            failure = FetchFailure::Decode {
                                attempts: attempt,
                                message: e.to_string(),
                            };
                            if attempts_left {
                                self.sleeper.sleep(self.retry.transport_backoff).await;
                            }
                        }
                    }
                }
                Ok(response) if response.status == HTTP_TOO_MANY_REQUESTS => {
                    self.stats.rate_limited.fetch_add(1, Ordering::Relaxed);
                    warn!(
                        endpoint,
                        attempt,
                        cooldown_secs = self.retry.rate_limit_cooldown.as_secs(),
                        "Rate limited by API, cooling down"
                    );
                    failure = FetchFailure::RateLimited { attempts: attempt };
                    if attempts_left {
                        self.sleeper.sleep(self.retry.rate_limit_cooldown).await;
                    }
                }
                Ok(response) => {
                    if attempt == 1 {
                        warn!(status = response.status, url = %response.url, "Unexpected status");
                    } else {
                        warn!(status = response.status, attempt, "Unexpected status");
                    }
                    failure = FetchFailure::Status {
                        status: response.status,
                        attempts: attempt,
                    };
                }
                Err(e) => {
                    self.stats.transport_errors.fetch_add(1, Ordering::Relaxed);
                    warn!(endpoint, attempt, error = %e, "Request failed");
                    failure = FetchFailure::Transport {
                        attempts: attempt,
                        message: e.to_string(),
                    };
                    if attempts_left {
                        self.sleeper.sleep(self.retry.transport_backoff).await;
                    }
                }
            }
        }

        self.stats.failures.fetch_add(1, Ordering::Relaxed);
        warn!(endpoint, error = %failure, "Giving up on request");
        FetchOutcome::Failed(failure)
    }

    /// Single un-paginated call, unwrapped to its `dados` payload
    pub async fn fetch_data(&self, endpoint: &str) -> Detail<Value> {
        match self.execute(endpoint, &[]).await {
            FetchOutcome::Success(mut body) => match body.get_mut("dados").map(Value::take) {
                Some(dados) if !dados.is_null() => Detail::Found(dados),
                _ => Detail::Unavailable(FetchFailure::MissingData),
            },
            FetchOutcome::Failed(failure) => Detail::Unavailable(failure),
        }
    }

    /// Walk a collection endpoint page by page using the configured page size
    pub async fn paginate(
        &self,
        endpoint: &str,
        base_query: &[(String, String)],
        max_items: Option<usize>,
    ) -> Collected {
        self.paginate_with_page_size(endpoint, base_query, self.page_size, max_items)
            .await
    }

    /// Walk a collection endpoint page by page
    ///
    /// Stops on a failed call, a missing or empty `dados` list, a page without
    /// a `rel=next` link, or once `max_items` have been gathered (the result is
    /// truncated to exactly `max_items`).
    pub async fn paginate_with_page_size(
        &self,
        endpoint: &str,
        base_query: &[(String, String)],
        page_size: u32,
        max_items: Option<usize>,
    ) -> Collected {
        let mut collected = Collected::default();
        if max_items == Some(0) {
            return collected;
        }

        let mut page_number: u32 = 1;
        loop {
            let mut query: Query = base_query
                .iter()
                .filter(|(key, _)| key != "itens" && key != "pagina")
                .cloned()
                .collect();
            query.push(param("itens", page_size.max(1)));
            query.push(param("pagina", page_number));

            debug!(endpoint, page = page_number, "Fetching page");

            let body = match self.execute(endpoint, &query).await {
                FetchOutcome::Success(body) => body,
                FetchOutcome::Failed(failure) => {
                    warn!(endpoint, page = page_number, error = %failure, "Stopping pagination");
                    collected.failure = Some(failure);
                    break;
                }
            };

            let Some(page) = Page::from_body(&body) else {
                debug!(endpoint, page = page_number, "Response has no item list");
                break;
            };
            if page.raw_len == 0 {
                break;
            }

            collected.pages += 1;
            collected.rejected += page.rejected;
            if page.rejected > 0 {
                warn!(endpoint, page = page_number, rejected = page.rejected, "Dropped items without id");
            }
            collected.items.extend(page.items);

            if let Some(max) = max_items {
                if collected.items.len() >= max {
                    collected.items.truncate(max);
                    break;
                }
            }

            if !page.has_next {
                break;
            }
            page_number += 1;
        }

        info!(
            endpoint,
            items = collected.items.len(),
            pages = collected.pages,
            "Collection finished"
        );
        collected
    }

    pub fn stats(&self) -> RequestStatsSnapshot {
        RequestStatsSnapshot {
            attempts: self.stats.attempts.load(Ordering::Relaxed),
            successes: self.stats.successes.load(Ordering::Relaxed),
            rate_limited: self.stats.rate_limited.load(Ordering::Relaxed),
            transport_errors: self.stats.transport_errors.load(Ordering::Relaxed),
            failures: self.stats.failures.load(Ordering::Relaxed),
        }
    }

    pub fn limiter(&self) -> &RateLimiter {
        &self.limiter
    }
}
