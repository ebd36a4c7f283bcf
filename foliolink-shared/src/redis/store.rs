/// Temporary store for short-lived pending state
///
/// A TTL-bounded JSON key-value store used to carry pending state across
/// request boundaries, currently the pending email-change request that
/// lives between "request change" and "confirm change". Built as an
/// explicit capability: the live variant talks to Redis, the disabled
/// variant makes reads fail with `Unavailable` so callers can answer with
/// an explicit "feature unavailable" page instead of silently dropping the
/// flow.
///
/// Deletes on the disabled variant are no-ops: cleanup is best-effort and
/// there is nothing to clean.

use crate::redis::client::RedisClient;
use redis::AsyncCommands;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;

/// Key for a user's pending email-change request
pub fn email_change_key(user_id: &str) -> String {
    format!("email-change-request:user:{}", user_id)
}

/// Temporary store errors
#[derive(Debug, Error)]
pub enum StoreError {
    /// The store is not configured in this deployment
    #[error("Temporary store is not configured")]
    Unavailable,

    /// Redis command failure
    #[error("Store command failed: {0}")]
    Command(String),

    /// Value (de)serialization failure
    #[error("Store serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<redis::RedisError> for StoreError {
    fn from(err: redis::RedisError) -> Self {
        StoreError::Command(err.to_string())
    }
}

/// Temporary store capability
///
/// Selected at process start from the deployment configuration and injected
/// into consumers.
#[derive(Clone)]
pub enum TempStore {
    /// Redis-backed store
    Live(RedisClient),

    /// Store absent in this deployment; reads fail explicitly
    Disabled,
}

impl TempStore {
    /// Builds the capability from an optional Redis client
    pub fn new(client: Option<RedisClient>) -> Self {
        match client {
            Some(client) => TempStore::Live(client),
            None => {
                tracing::info!("Temporary store disabled (Redis not configured)");
                TempStore::Disabled
            }
        }
    }

    /// Whether the store is usable
    pub fn is_enabled(&self) -> bool {
        matches!(self, TempStore::Live(_))
    }

    /// Reads and decodes a JSON value
    ///
    /// Returns Ok(None) when the key is absent or expired.
    ///
    /// # Errors
    ///
    /// `StoreError::Unavailable` on the disabled variant; callers decide
    /// how to degrade.
    pub async fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StoreError> {
        let client = match self {
            TempStore::Live(client) => client,
            TempStore::Disabled => return Err(StoreError::Unavailable),
        };

        let mut conn = client.connection();
        let raw: Option<String> = conn.get(key).await?;

        match raw {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    /// Encodes and writes a JSON value with a TTL
    pub async fn set_json<T: Serialize>(
        &self,
        key: &str,
        value: &T,
        ttl: Duration,
    ) -> Result<(), StoreError> {
        let client = match self {
            TempStore::Live(client) => client,
            TempStore::Disabled => return Err(StoreError::Unavailable),
        };

        let raw = serde_json::to_string(value)?;
        let mut conn = client.connection();
        let _: () = redis::cmd("SET")
            .arg(key)
            .arg(raw)
            .arg("EX")
            .arg(ttl.as_secs())
            .query_async(&mut conn)
            .await?;

        Ok(())
    }

    /// Deletes a key
    ///
    /// Best-effort: the disabled variant succeeds without doing anything.
    pub async fn delete(&self, key: &str) -> Result<(), StoreError> {
        let client = match self {
            TempStore::Live(client) => client,
            TempStore::Disabled => return Ok(()),
        };

        let mut conn = client.connection();
        let _: u64 = conn.del(key).await?;

        Ok(())
    }
}
