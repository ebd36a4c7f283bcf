/// Verification tokens for email flows
///
/// Tokens travel as 32-char base62 strings in confirmation links and are
/// stored only as SHA-256 hashes. Issuing an email-change token writes two
/// things: the hashed token row (what the link proves) and the pending
/// request in the temporary store (what the commit applies). The temporary
/// store entry gets the same 24h lifetime as the token so neither can
/// outlive the other.

use crate::models::verification_token::VerificationToken;
use crate::redis::store::{email_change_key, StoreError, TempStore};
use chrono::{Duration, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use sqlx::PgPool;
use thiserror::Error;
use uuid::Uuid;

/// Length of a plaintext token
const TOKEN_LENGTH: usize = 32;

/// Token (and pending-state) lifetime in hours
const TOKEN_TTL_HOURS: i64 = 24;

/// Token issue/consume error
#[derive(Debug, Error)]
pub enum TokenError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Temporary store error
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// Pending email-change request held in the temporary store
///
/// Field names match the JSON the original store entries carry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailChangeRequest {
    /// Current address
    pub email: String,

    /// Address being switched to
    pub new_email: String,
}

/// Hashes a plaintext token with SHA-256
///
/// # Example
///
/// ```
/// use foliolink_shared::auth::token::hash_token;
///
/// let hash = hash_token("some-token");
/// assert_eq!(hash.len(), 64); // SHA-256 hex is 64 chars
/// assert_eq!(hash, hash_token("some-token")); // deterministic
/// ```
pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Generates a new plaintext token and its hash
///
/// Base62 alphabet, 32 chars.
pub fn generate_token() -> (String, String) {
    const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";
    let mut rng = rand::thread_rng();

    let token: String = (0..TOKEN_LENGTH)
        .map(|_| {
            let idx = rng.gen_range(0..CHARSET.len());
            CHARSET[idx] as char
        })
        .collect();

    let hash = hash_token(&token);
    (token, hash)
}

/// Issues an email-change token for a user
///
/// Writes the hashed token row and the pending request. Returns the
/// plaintext token for the confirmation link; the plaintext is never
/// stored.
///
/// # Errors
///
/// Fails with `TokenError::Store` when the temporary store is unavailable;
/// email change requires it, so the caller surfaces "feature unavailable".
pub async fn issue_email_change_token(
    pool: &PgPool,
    store: &TempStore,
    user_id: Uuid,
    current_email: &str,
    new_email: &str,
) -> Result<String, TokenError> {
    let request = EmailChangeRequest {
        email: current_email.to_string(),
        new_email: new_email.to_string(),
    };

    let ttl = Duration::hours(TOKEN_TTL_HOURS);
    store
        .set_json(
            &email_change_key(&user_id.to_string()),
            &request,
            ttl.to_std().expect("positive TTL"),
        )
        .await?;

    let (token, hash) = generate_token();
    VerificationToken::create(pool, &hash, &user_id.to_string(), Utc::now() + ttl).await?;

    Ok(token)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_token_deterministic() {
        let a = hash_token("token-a");
        let b = hash_token("token-a");
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
        assert_ne!(a, hash_token("token-b"));
    }

    #[test]
    fn test_generate_token_shape() {
        let (token, hash) = generate_token();
        assert_eq!(token.len(), TOKEN_LENGTH);
        assert!(token.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_eq!(hash, hash_token(&token));
    }

    #[test]
    fn test_generate_token_unique() {
        let (a, _) = generate_token();
        let (b, _) = generate_token();
        assert_ne!(a, b);
    }

    #[test]
    fn test_email_change_request_wire_format() {
        let request = EmailChangeRequest {
            email: "old@example.com".to_string(),
            new_email: "new@example.com".to_string(),
        };

        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["email"], "old@example.com");
        assert_eq!(value["newEmail"], "new@example.com");
    }

    #[tokio::test]
    async fn test_issue_requires_temp_store() {
        // Without a database the store failure must surface first: issuing
        // against a disabled store never reaches the token insert.
        let store = TempStore::new(None);
        let pool_result = sqlx::postgres::PgPoolOptions::new()
            .max_connections(1)
            .connect_lazy("postgresql://localhost/unused");

        let pool = pool_result.unwrap();
        let result = issue_email_change_token(
            &pool,
            &store,
            Uuid::new_v4(),
            "old@example.com",
            "new@example.com",
        )
        .await;

        assert!(matches!(
            result,
            Err(TokenError::Store(StoreError::Unavailable))
        ));
    }
}
