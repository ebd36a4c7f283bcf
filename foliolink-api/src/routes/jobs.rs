/// Inbound job callbacks from the queue service
///
/// The queue service delivers scheduled jobs by POSTing their payload back
/// to this endpoint with an HMAC signature header. Verification accepts
/// the current or next signing key (rotation-safe); deployments without a
/// queue answer 503 since no signature could ever validate.
///
/// # Endpoint
///
/// ```text
/// POST /api/jobs
/// X-Queue-Signature: <hex hmac of body>
///
/// { "type": "tokens.cleanup" }
/// ```

use crate::{app::AppState, error::ApiError};
use axum::{
    body::Bytes,
    extract::State,
    http::HeaderMap,
    Json,
};
use foliolink_shared::models::verification_token::VerificationToken;
use serde::{Deserialize, Serialize};

/// Signature header set by the queue service
const SIGNATURE_HEADER: &str = "x-queue-signature";

/// Job payload envelope
#[derive(Debug, Deserialize)]
pub struct JobPayload {
    /// Job type discriminator
    #[serde(rename = "type")]
    pub job_type: String,
}

/// Job result
#[derive(Debug, Serialize)]
pub struct JobResponse {
    /// Whether the job ran
    pub ok: bool,

    /// Rows affected, for cleanup jobs
    #[serde(skip_serializing_if = "Option::is_none")]
    pub removed: Option<u64>,
}

/// Job callback handler
pub async fn handle_job(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<JobResponse>, ApiError> {
    let receiver = state.services.receiver.as_ref().ok_or_else(|| {
        ApiError::ServiceUnavailable("Job queue is not configured".to_string())
    })?;

    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::Unauthorized("Missing job signature".to_string()))?;

    if !receiver.verify(signature, &body) {
        return Err(ApiError::Unauthorized("Invalid job signature".to_string()));
    }

    let payload: JobPayload = serde_json::from_slice(&body)
        .map_err(|e| ApiError::BadRequest(format!("Malformed job payload: {}", e)))?;

    match payload.job_type.as_str() {
        "tokens.cleanup" => {
            let removed = VerificationToken::delete_expired(&state.db).await?;
            tracing::info!(removed, "Expired verification tokens swept");

            Ok(Json(JobResponse {
                ok: true,
                removed: Some(removed),
            }))
        }
        other => Err(ApiError::BadRequest(format!("Unknown job type: {}", other))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_payload_decodes_type_field() {
        let payload: JobPayload =
            serde_json::from_str(r#"{"type": "tokens.cleanup"}"#).unwrap();
        assert_eq!(payload.job_type, "tokens.cleanup");
    }

    #[test]
    fn test_job_response_omits_removed_when_absent() {
        let response = JobResponse {
            ok: true,
            removed: None,
        };
        let value = serde_json::to_value(&response).unwrap();
        assert!(value.get("removed").is_none());
    }
}
