use std::time::{Duration, SystemTime, UNIX_EPOCH};

use redis::aio::ConnectionManager;
use wishwall_domain::ports::BoxFuture;
use wishwall_domain::ports::rate_limit::{RateLimitDecision, RateLimitError, RateLimitStore};
use wishwall_domain::util::uuid_v7_without_dashes;

const DEFAULT_PREFIX: &str = "wishwall:ratelimit";

/// Sliding-window log shared by every api instance.
///
/// Each key is a sorted set of hit timestamps. Pruning, counting and the
/// conditional insert run as one server-side script.
#[derive(Clone)]
pub struct RedisRateLimitStore {
    manager: ConnectionManager,
    prefix: String,
}

const SLIDING_WINDOW_SCRIPT: &str = r"
local key = KEYS[1]
local now = tonumber(ARGV[1])
local window = tonumber(ARGV[2])
local limit = tonumber(ARGV[3])
redis.call('ZREMRANGEBYSCORE', key, '-inf', now - window)
local count = redis.call('ZCARD', key)
if count >= limit then
  local oldest = redis.call('ZRANGE', key, 0, 0, 'WITHSCORES')
  local retry = window
  if oldest[2] then
    retry = tonumber(oldest[2]) + window - now
  end
  return {0, 0, retry}
end
redis.call('ZADD', key, now, ARGV[4])
redis.call('PEXPIRE', key, window)
return {1, limit - count - 1, 0}
";

impl RedisRateLimitStore {
    pub async fn connect(redis_url: &str) -> Result<Self, RateLimitError> {
        Self::connect_with_prefix(redis_url, DEFAULT_PREFIX).await
    }

    pub async fn connect_with_prefix(
        redis_url: &str,
        prefix: impl Into<String>,
    ) -> Result<Self, RateLimitError> {
        let client = redis::Client::open(redis_url)
            .map_err(|err| RateLimitError::Unavailable(err.to_string()))?;
        let manager = ConnectionManager::new(client)
            .await
            .map_err(|err| RateLimitError::Unavailable(err.to_string()))?;
        Ok(Self {
            manager,
            prefix: prefix.into(),
        })
    }

    fn cache_key(&self, key: &str) -> String {
        format!("{}:{key}", self.prefix)
    }
}

fn epoch_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|duration| duration.as_millis() as u64)
        .unwrap_or(0)
}

impl RateLimitStore for RedisRateLimitStore {
    fn hit(
        &self,
        key: &str,
        limit: u64,
        window: Duration,
    ) -> BoxFuture<'_, Result<RateLimitDecision, RateLimitError>> {
        let cache_key = self.cache_key(key);
        Box::pin(async move {
            if limit == 0 {
                return Ok(RateLimitDecision::deny(window));
            }
            let window_ms = (window.as_millis() as u64).max(1);
            let mut conn = self.manager.clone();
            let (allowed, remaining, retry_ms): (u64, u64, i64) =
                redis::Script::new(SLIDING_WINDOW_SCRIPT)
                    .key(&cache_key)
                    .arg(epoch_ms())
                    .arg(window_ms)
                    .arg(limit)
                    .arg(uuid_v7_without_dashes())
                    .invoke_async(&mut conn)
                    .await
                    .map_err(|err| RateLimitError::Store(err.to_string()))?;

            if allowed == 1 {
                Ok(RateLimitDecision::allow(remaining))
            } else {
                let retry_ms = retry_ms.max(1) as u64;
                Ok(RateLimitDecision::deny(Duration::from_millis(retry_ms)))
            }
        })
    }
}
