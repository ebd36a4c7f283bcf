/// Passkey registration endpoint
///
/// Starts a passkey registration ceremony with the hosted tenant for the
/// authenticated user. The WebAuthn creation options are passed through to
/// the browser untouched. Deployments without a passkey tenant answer 503.
///
/// # Endpoint
///
/// ```text
/// POST /api/auth/passkeys/register
/// Authorization: Bearer <session>
/// ```

use crate::app::{AppState, SessionContext};
use crate::error::{ApiError, ApiResult};
use axum::{extract::State, Extension, Json};
use foliolink_shared::models::user::User;
use foliolink_shared::passkeys::PasskeyError;

/// Start registration handler
pub async fn start_registration(
    State(state): State<AppState>,
    Extension(session): Extension<SessionContext>,
) -> ApiResult<Json<serde_json::Value>> {
    let user = User::find_by_id(&state.db, session.user_id)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Unknown user".to_string()))?;

    let options = state
        .services
        .passkeys
        .start_registration(&user.id.to_string(), &user.email)
        .await
        .map_err(|e| match e {
            PasskeyError::NotConfigured => ApiError::ServiceUnavailable(
                "Passkeys are not configured on this deployment".to_string(),
            ),
            other => {
                tracing::error!(error = %other, "Passkey registration failed");
                ApiError::InternalError("Passkey registration failed".to_string())
            }
        })?;

    Ok(Json(options))
}
