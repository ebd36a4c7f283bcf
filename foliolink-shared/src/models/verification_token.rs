/// Verification token model
///
/// Single-use tokens backing the email-change confirmation flow. Only the
/// SHA-256 hash of a token is stored; the plaintext travels in the
/// confirmation link. A token is deleted when consumed, so re-confirming
/// the same link lands on not-found, giving at-most-once semantics per
/// token.
/// Expired rows are treated as absent by callers and swept by the periodic
/// cleanup job.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE verification_tokens (
///     token VARCHAR(255) PRIMARY KEY,
///     identifier VARCHAR(255) NOT NULL,
///     expires TIMESTAMPTZ NOT NULL
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

/// Verification token row (token column holds the SHA-256 hex hash)
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct VerificationToken {
    /// SHA-256 hex hash of the plaintext token
    pub token: String,

    /// Owning identifier (user id as text)
    pub identifier: String,

    /// Expiry timestamp
    pub expires: DateTime<Utc>,
}

impl VerificationToken {
    /// Whether the token has expired
    pub fn is_expired(&self) -> bool {
        self.expires < Utc::now()
    }

    /// Creates a token row
    ///
    /// `hashed_token` must already be the SHA-256 hash; plaintext tokens
    /// never reach the database.
    pub async fn create(
        pool: &PgPool,
        hashed_token: &str,
        identifier: &str,
        expires: DateTime<Utc>,
    ) -> Result<Self, sqlx::Error> {
        let token = sqlx::query_as::<_, VerificationToken>(
            r#"
            INSERT INTO verification_tokens (token, identifier, expires)
            VALUES ($1, $2, $3)
            RETURNING token, identifier, expires
            "#,
        )
        .bind(hashed_token)
        .bind(identifier)
        .bind(expires)
        .fetch_one(pool)
        .await?;

        Ok(token)
    }

    /// Finds a token row by its hash
    ///
    /// Returns expired rows too; callers treat expiry the same as absence so
    /// the response does not reveal which condition failed.
    pub async fn find_by_token(
        pool: &PgPool,
        hashed_token: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        let token = sqlx::query_as::<_, VerificationToken>(
            r#"
            SELECT token, identifier, expires
            FROM verification_tokens
            WHERE token = $1
            "#,
        )
        .bind(hashed_token)
        .fetch_optional(pool)
        .await?;

        Ok(token)
    }

    /// Deletes a token row by its hash
    ///
    /// Returns true if a row was removed. Deleting an already-deleted token
    /// is a no-op, which keeps the deferred cleanup task idempotent.
    pub async fn delete(pool: &PgPool, hashed_token: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM verification_tokens WHERE token = $1")
            .bind(hashed_token)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Deletes all expired token rows
    ///
    /// Run by the signed cleanup job; returns the number of rows removed.
    pub async fn delete_expired(pool: &PgPool) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM verification_tokens WHERE expires < NOW()")
            .execute(pool)
            .await?;

        Ok(result.rows_affected())
    }
}
