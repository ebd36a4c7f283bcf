/// Teammate invitation endpoint
///
/// # Endpoint
///
/// ```text
/// POST /api/teams/:team_id/invitations
/// Content-Type: application/json
///
/// { "email": "teammate@example.com" }
/// ```
///
/// Gated on the team's member limit. The accept URL carries an HMAC
/// checksum so the email/team pair cannot be tampered with; the invitation
/// email is sent from the background task runner after the response.

use crate::app::{AppState, SessionContext};
use crate::error::{ApiError, ApiResult, ValidationErrorDetail};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use foliolink_shared::auth::checksum::generate_checksum;
use foliolink_shared::email::templates;
use foliolink_shared::models::team::Team;
use foliolink_shared::models::user::User;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Invitation request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateInvitationRequest {
    /// Address to invite
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
}

/// Invitation response
#[derive(Debug, Serialize)]
pub struct CreateInvitationResponse {
    /// Invited address
    pub invited: String,
}

/// Builds the checksummed accept URL for an invitation
pub fn invitation_url(base_url: &str, secret: &str, team_id: Uuid, email: &str) -> String {
    let url = format!(
        "{}/teams/{}/invitations/accept?email={}",
        base_url, team_id, email
    );
    let checksum = generate_checksum(secret, &url);
    format!("{}&checksum={}", url, checksum)
}

/// Create invitation handler
pub async fn create_invitation(
    State(state): State<AppState>,
    Path(team_id): Path<Uuid>,
    Extension(session): Extension<SessionContext>,
    Json(request): Json<CreateInvitationRequest>,
) -> ApiResult<(StatusCode, Json<CreateInvitationResponse>)> {
    if let Err(errors) = request.validate() {
        let details = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |e| ValidationErrorDetail {
                    field: field.to_string(),
                    message: e
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| "Invalid value".to_string()),
                })
            })
            .collect();
        return Err(ApiError::ValidationError(details));
    }

    let team = Team::find_by_id(&state.db, team_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Team not found".to_string()))?;

    // Member-limit gate. The snapshot is advisory; a racing invite can
    // still slip past, matching the platform's limit semantics.
    if !state.services.limits.can_add_users(team_id).await? {
        return Err(ApiError::Forbidden(
            "Member limit reached for the current plan".to_string(),
        ));
    }

    let sender = User::find_by_id(&state.db, session.user_id)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Unknown user".to_string()))?;

    let url = invitation_url(
        &state.deployment.base_url,
        &state.deployment.verification_secret,
        team_id,
        &request.email,
    );

    // Email delivery continues after the response.
    let mailer = state.services.mailer.clone();
    let sender_name = sender.name.clone().unwrap_or_else(|| sender.email.clone());
    let sender_email = sender.email.clone();
    let team_name = team.name.clone();
    let recipient = request.email.clone();
    let invite_url = url.clone();

    state.services.tasks.spawn("teammate-invite-email", move || {
        let mailer = mailer.clone();
        let content = templates::teammate_invite(
            &sender_name,
            &sender_email,
            &team_name,
            &invite_url,
        );
        let email = content.to(&recipient);

        async move {
            mailer.send(&email).await?;
            Ok(())
        }
    });

    tracing::info!(team_id = %team_id, invited = %request.email, "Invitation created");

    Ok((
        StatusCode::CREATED,
        Json(CreateInvitationResponse {
            invited: request.email,
        }),
    ))
}
