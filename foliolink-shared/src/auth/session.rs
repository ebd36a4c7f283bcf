/// Session token validation
///
/// Sessions are issued by the identity layer as HS256 tokens; this module
/// validates them (and can mint them, used by tests and local tooling).
/// A session carries only the user id; team membership is resolved per
/// request from the database.
///
/// # Security
///
/// - Algorithm: HS256, signature and expiry checked on every validation
/// - Issuer pinned to "foliolink"
/// - Secrets must be at least 32 bytes (enforced at config load)

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Pinned issuer value
const ISSUER: &str = "foliolink";

/// Default session lifetime
const SESSION_LIFETIME_HOURS: i64 = 24;

/// Session token error
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Failed to create token
    #[error("Failed to create session token: {0}")]
    Create(String),

    /// Token failed validation (bad signature, malformed, wrong issuer)
    #[error("Invalid session token: {0}")]
    Invalid(String),

    /// Token has expired
    #[error("Session token has expired")]
    Expired,
}

/// Session claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Subject: user ID
    pub sub: Uuid,

    /// Issuer, always "foliolink"
    pub iss: String,

    /// Issued-at (Unix seconds)
    pub iat: i64,

    /// Expiry (Unix seconds)
    pub exp: i64,
}

impl SessionClaims {
    /// Creates claims for a user with the default lifetime
    pub fn new(user_id: Uuid) -> Self {
        let now = Utc::now();
        SessionClaims {
            sub: user_id,
            iss: ISSUER.to_string(),
            iat: now.timestamp(),
            exp: (now + Duration::hours(SESSION_LIFETIME_HOURS)).timestamp(),
        }
    }
}

/// Creates a signed session token
pub fn create_session_token(user_id: Uuid, secret: &str) -> Result<String, SessionError> {
    let claims = SessionClaims::new(user_id);

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| SessionError::Create(e.to_string()))
}

/// Validates a session token and returns its claims
///
/// # Errors
///
/// `SessionError::Expired` for an expired token, `SessionError::Invalid`
/// for any other validation failure.
pub fn validate_session_token(token: &str, secret: &str) -> Result<SessionClaims, SessionError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[ISSUER]);

    let data = decode::<SessionClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => SessionError::Expired,
        _ => SessionError::Invalid(e.to_string()),
    })?;

    Ok(data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret-key-at-least-32-bytes-long";

    #[test]
    fn test_session_round_trip() {
        let user_id = Uuid::new_v4();
        let token = create_session_token(user_id, SECRET).unwrap();
        let claims = validate_session_token(&token, SECRET).unwrap();

        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.iss, ISSUER);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = create_session_token(Uuid::new_v4(), SECRET).unwrap();
        let result =
            validate_session_token(&token, "another-secret-key-at-least-32-bytes");
        assert!(matches!(result, Err(SessionError::Invalid(_))));
    }

    #[test]
    fn test_garbage_token_rejected() {
        let result = validate_session_token("not-a-token", SECRET);
        assert!(matches!(result, Err(SessionError::Invalid(_))));
    }

    #[test]
    fn test_expired_token_rejected() {
        let claims = SessionClaims {
            sub: Uuid::new_v4(),
            iss: ISSUER.to_string(),
            iat: Utc::now().timestamp() - 7200,
            exp: Utc::now().timestamp() - 3600,
        };

        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap();

        let result = validate_session_token(&token, SECRET);
        assert!(matches!(result, Err(SessionError::Expired)));
    }
}
