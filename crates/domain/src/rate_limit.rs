use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;

use crate::ports::BoxFuture;
use crate::ports::rate_limit::{RateLimitDecision, RateLimitError, RateLimitStore};

/// Full sweeps of idle keys happen once per this many hits.
const SWEEP_EVERY_HITS: u64 = 1_024;

#[derive(Clone, Copy, Debug)]
pub struct RateLimitPolicy {
    pub limit: u64,
    pub window: Duration,
}

impl Default for RateLimitPolicy {
    fn default() -> Self {
        Self {
            limit: 10,
            window: Duration::from_secs(60),
        }
    }
}

#[derive(Clone)]
pub struct RateLimiter {
    store: Arc<dyn RateLimitStore>,
    policy: RateLimitPolicy,
}

impl RateLimiter {
    pub fn new(store: Arc<dyn RateLimitStore>, policy: RateLimitPolicy) -> Self {
        Self { store, policy }
    }

    pub fn policy(&self) -> RateLimitPolicy {
        self.policy
    }

    /// Records a hit for `subject` within `scope`.
    ///
    /// A failing store lets the request through: throttling is not a safety
    /// gate, and content still passes moderation.
    pub async fn check(&self, scope: &str, subject: &str) -> RateLimitDecision {
        let key = format!("{scope}:{subject}");
        match self
            .store
            .hit(&key, self.policy.limit, self.policy.window)
            .await
        {
            Ok(decision) => {
                if !decision.allowed {
                    tracing::info!(key = %key, "rate limit exceeded");
                }
                decision
            }
            Err(err) => {
                tracing::warn!(key = %key, error = %err, "rate limit store failed; allowing");
                RateLimitDecision::allow(0)
            }
        }
    }
}

/// Process-local sliding-window log.
///
/// Only correct for a single instance; several instances must share a store
/// such as the Redis one.
#[derive(Clone, Default)]
pub struct InMemoryRateLimitStore {
    inner: Arc<Mutex<MemoryLog>>,
}

#[derive(Default)]
struct MemoryLog {
    hits: HashMap<String, VecDeque<Instant>>,
    hits_since_sweep: u64,
}

impl InMemoryRateLimitStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn tracked_keys(&self) -> usize {
        self.inner.lock().await.hits.len()
    }

    fn prune(log: &mut VecDeque<Instant>, now: Instant, window: Duration) {
        while let Some(oldest) = log.front() {
            if now.duration_since(*oldest) >= window {
                log.pop_front();
            } else {
                break;
            }
        }
    }
}

impl RateLimitStore for InMemoryRateLimitStore {
    fn hit(
        &self,
        key: &str,
        limit: u64,
        window: Duration,
    ) -> BoxFuture<'_, Result<RateLimitDecision, RateLimitError>> {
        let key = key.to_string();
        Box::pin(async move {
            let now = Instant::now();
            let mut guard = self.inner.lock().await;

            guard.hits_since_sweep += 1;
            if guard.hits_since_sweep >= SWEEP_EVERY_HITS {
                guard.hits_since_sweep = 0;
                guard.hits.retain(|_, log| {
                    Self::prune(log, now, window);
                    !log.is_empty()
                });
            }

            let log = guard.hits.entry(key).or_default();
            Self::prune(log, now, window);

            if limit == 0 {
                return Ok(RateLimitDecision::deny(window));
            }
            if log.len() as u64 >= limit {
                let retry_after = log
                    .front()
                    .map(|oldest| window.saturating_sub(now.duration_since(*oldest)))
                    .unwrap_or(window);
                return Ok(RateLimitDecision::deny(retry_after));
            }

            log.push_back(now);
            Ok(RateLimitDecision::allow(limit - log.len() as u64))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn denies_once_the_window_is_full() {
        let store = InMemoryRateLimitStore::new();
        let limiter = RateLimiter::new(
            Arc::new(store),
            RateLimitPolicy {
                limit: 2,
                window: Duration::from_secs(60),
            },
        );

        assert_eq!(limiter.check("comment", "u1").await.remaining, 1);
        assert!(limiter.check("comment", "u1").await.allowed);
        let denied = limiter.check("comment", "u1").await;
        assert!(!denied.allowed);
        assert!(denied.retry_after.is_some());

        assert!(limiter.check("comment", "u2").await.allowed);
    }

    #[tokio::test]
    async fn window_slides() {
        let store = InMemoryRateLimitStore::new();
        let window = Duration::from_millis(40);
        assert!(store.hit("k", 1, window).await.unwrap().allowed);
        assert!(!store.hit("k", 1, window).await.unwrap().allowed);
        tokio::time::sleep(Duration::from_millis(60)).await;
        assert!(store.hit("k", 1, window).await.unwrap().allowed);
    }

    #[tokio::test]
    async fn idle_keys_are_evicted_by_sweeps() {
        let store = InMemoryRateLimitStore::new();
        let window = Duration::from_millis(5);
        store.hit("idle", 5, window).await.unwrap();
        tokio::time::sleep(Duration::from_millis(10)).await;
        for _ in 0..SWEEP_EVERY_HITS {
            store.hit("busy", u64::MAX, window).await.unwrap();
        }
        assert_eq!(store.tracked_keys().await, 1);
    }
}
