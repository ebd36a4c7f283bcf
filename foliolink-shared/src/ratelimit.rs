/// Sliding-window rate limiting
///
/// Bounds the number of requests an identifier (client IP, API caller) may
/// make within a trailing window. State lives in Redis as a sorted set of
/// request timestamps, pruned and counted atomically by a Lua script so
/// concurrent requests across instances see a consistent window.
///
/// Deployments without Redis get the disabled variant, which always allows:
/// "no limiting" rather than an error, matching the rest of the optional
/// provider model.
///
/// # Algorithm
///
/// On each check, entries older than `now - window` are dropped, the
/// remaining entries are counted, and the request is admitted iff the count
/// is below the budget. Admitted requests append their own timestamp. The
/// key expires with the window so idle identifiers cost nothing.

use crate::redis::client::RedisClient;
use rand::Rng;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use thiserror::Error;

/// Default request budget per window
pub const DEFAULT_BUDGET: u32 = 10;

/// Default window length
pub const DEFAULT_WINDOW: Duration = Duration::from_secs(10);

/// Key prefix for limiter state
const KEY_PREFIX: &str = "foliolink:rl";

/// Rate limiter error
#[derive(Debug, Error)]
pub enum RateLimitError {
    /// Redis command failure
    #[error("Rate limit check failed: {0}")]
    Command(String),
}

impl From<redis::RedisError> for RateLimitError {
    fn from(err: redis::RedisError) -> Self {
        RateLimitError::Command(err.to_string())
    }
}

/// Outcome of a rate limit check
#[derive(Debug, Clone, Copy)]
pub struct RateLimitDecision {
    /// Whether the request is allowed
    pub allowed: bool,

    /// Request budget for the window
    pub limit: u32,

    /// Requests remaining in the current window
    pub remaining: u32,

    /// Seconds until the window has room again
    pub reset_after_secs: u64,
}

impl RateLimitDecision {
    /// Decision used when no limiter is configured
    fn unlimited() -> Self {
        RateLimitDecision {
            allowed: true,
            limit: u32::MAX,
            remaining: u32::MAX,
            reset_after_secs: 0,
        }
    }
}

/// Sliding-window rate limiter capability
#[derive(Clone)]
pub enum RateLimiter {
    /// Redis-backed limiter
    Live {
        /// Redis connection
        client: RedisClient,

        /// Requests allowed per window
        budget: u32,

        /// Trailing window length
        window: Duration,
    },

    /// No backing store; every request is allowed
    Disabled,
}

impl RateLimiter {
    /// Builds the capability from an optional Redis client
    pub fn new(client: Option<RedisClient>, budget: u32, window: Duration) -> Self {
        match client {
            Some(client) => RateLimiter::Live {
                client,
                budget,
                window,
            },
            None => {
                tracing::info!("Rate limiting disabled (Redis not configured)");
                RateLimiter::Disabled
            }
        }
    }

    /// Builds the capability with the default budget and window
    pub fn with_defaults(client: Option<RedisClient>) -> Self {
        Self::new(client, DEFAULT_BUDGET, DEFAULT_WINDOW)
    }

    /// Whether limiting is active
    pub fn is_enabled(&self) -> bool {
        matches!(self, RateLimiter::Live { .. })
    }

    /// Checks whether a request from `identifier` is within budget
    ///
    /// # Errors
    ///
    /// Returns an error only on Redis failure; the disabled variant always
    /// succeeds with an unlimited decision.
    pub async fn check(&self, identifier: &str) -> Result<RateLimitDecision, RateLimitError> {
        let (client, budget, window) = match self {
            RateLimiter::Live {
                client,
                budget,
                window,
            } => (client, *budget, *window),
            RateLimiter::Disabled => return Ok(RateLimitDecision::unlimited()),
        };

        let key = format!("{}:{}", KEY_PREFIX, identifier);
        let now_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system clock before Unix epoch")
            .as_millis() as u64;
        let window_ms = window.as_millis() as u64;

        // Unique member suffix so two requests in the same millisecond both
        // count.
        let nonce: u32 = rand::thread_rng().gen();

        // Atomic prune-count-admit. Returns {allowed, remaining, reset_ms}.
        let script = redis::Script::new(
            r#"
            local key = KEYS[1]
            local now = tonumber(ARGV[1])
            local window = tonumber(ARGV[2])
            local budget = tonumber(ARGV[3])

            redis.call('ZREMRANGEBYSCORE', key, 0, now - window)
            local count = redis.call('ZCARD', key)

            if count < budget then
                redis.call('ZADD', key, now, now .. '-' .. ARGV[4])
                redis.call('PEXPIRE', key, window)
                return {1, budget - count - 1, window}
            end

            local oldest = redis.call('ZRANGE', key, 0, 0, 'WITHSCORES')
            local reset = window
            if oldest[2] then
                reset = (tonumber(oldest[2]) + window) - now
            end
            return {0, 0, reset}
            "#,
        );

        let mut conn = client.connection();
        let result: Vec<i64> = script
            .key(&key)
            .arg(now_ms)
            .arg(window_ms)
            .arg(budget)
            .arg(nonce)
            .invoke_async(&mut conn)
            .await?;

        let allowed = result.first().copied().unwrap_or(0) == 1;
        let remaining = result.get(1).copied().unwrap_or(0).max(0) as u32;
        let reset_ms = result.get(2).copied().unwrap_or(window_ms as i64).max(0) as u64;

        Ok(RateLimitDecision {
            allowed,
            limit: budget,
            remaining,
            reset_after_secs: reset_ms.div_ceil(1000),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_disabled_limiter_always_allows() {
        let limiter = RateLimiter::with_defaults(None);
        assert!(!limiter.is_enabled());

        for _ in 0..100 {
            let decision = limiter.check("client-1").await.unwrap();
            assert!(decision.allowed);
            assert_eq!(decision.reset_after_secs, 0);
        }
    }

    #[test]
    fn test_unlimited_decision_shape() {
        let decision = RateLimitDecision::unlimited();
        assert!(decision.allowed);
        assert_eq!(decision.remaining, u32::MAX);
    }

    #[tokio::test]
    #[ignore] // Requires running Redis instance
    async fn test_live_limiter_enforces_budget() {
        use crate::redis::client::{RedisClient, RedisConfig};

        let client = RedisClient::new(RedisConfig::default_for_test())
            .await
            .unwrap();
        let limiter = RateLimiter::new(Some(client), 3, Duration::from_secs(10));

        let id = format!("test-{}", rand::thread_rng().gen::<u64>());
        for _ in 0..3 {
            assert!(limiter.check(&id).await.unwrap().allowed);
        }

        let denied = limiter.check(&id).await.unwrap();
        assert!(!denied.allowed);
        assert_eq!(denied.remaining, 0);
        assert!(denied.reset_after_secs > 0);
    }
}
