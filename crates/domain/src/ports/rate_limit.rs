use std::time::Duration;

use thiserror::Error;

use super::BoxFuture;

#[derive(Debug, Error)]
pub enum RateLimitError {
    #[error("rate limit store unavailable: {0}")]
    Unavailable(String),
    #[error("rate limit store error: {0}")]
    Store(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RateLimitDecision {
    pub allowed: bool,
    pub remaining: u64,
    pub retry_after: Option<Duration>,
}

impl RateLimitDecision {
    pub fn allow(remaining: u64) -> Self {
        Self {
            allowed: true,
            remaining,
            retry_after: None,
        }
    }

    pub fn deny(retry_after: Duration) -> Self {
        Self {
            allowed: false,
            remaining: 0,
            retry_after: Some(retry_after),
        }
    }
}

/// Sliding-window hit log keyed by an opaque string.
pub trait RateLimitStore: Send + Sync {
    /// Records one hit for `key` unless the window is already full.
    fn hit(
        &self,
        key: &str,
        limit: u64,
        window: Duration,
    ) -> BoxFuture<'_, Result<RateLimitDecision, RateLimitError>>;
}
