/// Redis integration for the web tier
///
/// Redis backs two optional features: the temporary store for short-lived
/// pending state (email-change requests) and the sliding-window rate
/// limiter. Both degrade gracefully when `REDIS_URL` is absent; the
/// connection wrapper here is only constructed when Redis is configured.
///
/// # Modules
///
/// - `client`: connection manager wrapper with health checks
/// - `store`: TTL'd JSON temporary store capability

pub mod client;
pub mod store;

// Re-export common types for convenience
pub use client::{RedisClient, RedisClientError, RedisConfig};
pub use store::{StoreError, TempStore};
