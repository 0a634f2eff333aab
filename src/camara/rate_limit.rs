//! Request throttling
//!
//! A courtesy delay after every call, replaced by a long cooldown after every
//! Nth call so a harvest stays under the API's requests-per-minute budget.

use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

const COURTESY_DELAY_MS: u64 = 500;
const REQUESTS_PER_WINDOW: u64 = 100;
const COOLDOWN_SECS: u64 = 60;

/// Something that can wait
///
/// Production code sleeps on the tokio timer; tests record the requested
/// durations instead of waiting.
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Sleeper backed by `tokio::time::sleep`
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitPolicy {
    /// Delay after every call
    pub courtesy_delay: Duration,
    /// Every Nth call waits `cooldown` instead of the courtesy delay
    pub requests_per_window: u64,
    pub cooldown: Duration,
}

impl Default for RateLimitPolicy {
    fn default() -> Self {
        Self {
            courtesy_delay: Duration::from_millis(COURTESY_DELAY_MS),
            requests_per_window: REQUESTS_PER_WINDOW,
            cooldown: Duration::from_secs(COOLDOWN_SECS),
        }
    }
}

/// Call-counting throttle shared by every attempt a client makes
///
/// The counter is owned by the limiter; a single sequential caller is assumed,
/// so the budget is not meaningful when shared across concurrent tasks.
pub struct RateLimiter {
    policy: RateLimitPolicy,
    calls: AtomicU64,
    sleeper: Arc<dyn Sleeper>,
}

impl RateLimiter {
    pub fn new(policy: RateLimitPolicy, sleeper: Arc<dyn Sleeper>) -> Self {
        Self {
            policy,
            calls: AtomicU64::new(0),
            sleeper,
        }
    }

    /// Account for one outbound attempt and wait as the policy requires
    pub async fn acquire(&self) {
        let call = self.calls.fetch_add(1, Ordering::Relaxed) + 1;
        let window = self.policy.requests_per_window.max(1);

        if call % window == 0 {
            info!(
                calls = call,
                cooldown_secs = self.policy.cooldown.as_secs(),
                "Request budget reached, cooling down"
            );
            self.sleeper.sleep(self.policy.cooldown).await;
        } else {
            self.sleeper.sleep(self.policy.courtesy_delay).await;
        }
    }

    /// Total calls accounted so far
    pub fn calls(&self) -> u64 {
        self.calls.load(Ordering::Relaxed)
    }

    pub fn policy(&self) -> &RateLimitPolicy {
        &self.policy
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camara::test_support::RecordingSleeper;

    #[tokio::test]
    async fn test_courtesy_delay_between_calls() {
        let sleeper = Arc::new(RecordingSleeper::default());
        let limiter = RateLimiter::new(RateLimitPolicy::default(), sleeper.clone());

        limiter.acquire().await;
        limiter.acquire().await;

        assert_eq!(limiter.calls(), 2);
        assert_eq!(
            sleeper.sleeps(),
            vec![Duration::from_millis(500), Duration::from_millis(500)]
        );
    }

    #[tokio::test]
    async fn test_cooldown_every_nth_call() {
        let sleeper = Arc::new(RecordingSleeper::default());
        let policy = RateLimitPolicy {
            courtesy_delay: Duration::from_millis(10),
            requests_per_window: 3,
            cooldown: Duration::from_secs(60),
        };
        let limiter = RateLimiter::new(policy, sleeper.clone());

        for _ in 0..7 {
            limiter.acquire().await;
        }

        let sleeps = sleeper.sleeps();
        assert_eq!(sleeps.len(), 7);
        let cooldowns: Vec<usize> = sleeps
            .iter()
            .enumerate()
            .filter(|(_, d)| **d == Duration::from_secs(60))
            .map(|(i, _)| i + 1)
            .collect();
        assert_eq!(cooldowns, vec![3, 6]);
    }

    #[tokio::test]
    async fn test_zero_window_treated_as_one() {
        let sleeper = Arc::new(RecordingSleeper::default());
        let policy = RateLimitPolicy {
            courtesy_delay: Duration::from_millis(1),
            requests_per_window: 0,
            cooldown: Duration::from_secs(2),
        };
        let limiter = RateLimiter::new(policy, sleeper.clone());

        limiter.acquire().await;
        assert_eq!(sleeper.sleeps(), vec![Duration::from_secs(2)]);
    }
}
