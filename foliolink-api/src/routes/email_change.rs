/// Email-change request endpoint
///
/// Starts the email-change flow for the authenticated user: stores the
/// pending request in the temporary store, writes the hashed verification
/// token, and mails the confirmation link to the new address. The change
/// itself only happens when the link is confirmed.
///
/// # Endpoint
///
/// ```text
/// POST /api/account/email-change
/// Authorization: Bearer <session>
///
/// { "newEmail": "new@example.com" }
/// ```
///
/// Requires the temporary store; deployments without it answer 503.

use crate::app::{AppState, SessionContext};
use crate::error::{ApiError, ApiResult, ValidationErrorDetail};
use axum::{extract::State, http::StatusCode, Extension, Json};
use foliolink_shared::auth::token::issue_email_change_token;
use foliolink_shared::email::templates::EmailContent;
use foliolink_shared::models::user::User;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Email-change request body
#[derive(Debug, Deserialize, Validate)]
pub struct EmailChangeRequestBody {
    /// Address to switch the account to
    #[serde(rename = "newEmail")]
    #[validate(email(message = "Invalid email format"))]
    pub new_email: String,
}

/// Email-change response
#[derive(Debug, Serialize)]
pub struct EmailChangeResponse {
    /// Whether the confirmation email was queued
    pub requested: bool,
}

/// Builds the confirmation email for a pending change
fn confirmation_email(confirm_url: &str) -> EmailContent {
    let subject = "Confirm your new email address".to_string();

    let text = format!(
        "A change of your FolioLink account email was requested.\n\n\
         Confirm the new address: {}\n\n\
         If you did not request this, you can ignore this email.",
        confirm_url
    );

    let html = format!(
        "<p>A change of your FolioLink account email was requested.</p>\
         <p><a href=\"{}\">Confirm the new address</a></p>\
         <p>If you did not request this, you can ignore this email.</p>",
        confirm_url
    );

    EmailContent {
        subject,
        html,
        text,
    }
}

/// Request email change handler
pub async fn request_email_change(
    State(state): State<AppState>,
    Extension(session): Extension<SessionContext>,
    Json(body): Json<EmailChangeRequestBody>,
) -> ApiResult<(StatusCode, Json<EmailChangeResponse>)> {
    if let Err(errors) = body.validate() {
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

    // The flow cannot hold its pending state anywhere but the temporary
    // store; without one, answer up front instead of failing mid-flow.
    if !state.services.store.is_enabled() {
        return Err(ApiError::ServiceUnavailable(
            "Email change requires additional configuration".to_string(),
        ));
    }

    let user = User::find_by_id(&state.db, session.user_id)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Unknown user".to_string()))?;

    if user.email == body.new_email {
        return Err(ApiError::BadRequest(
            "The new address matches the current one".to_string(),
        ));
    }

    let token = issue_email_change_token(
        &state.db,
        &state.services.store,
        user.id,
        &user.email,
        &body.new_email,
    )
    .await?;

    let confirm_url = format!(
        "{}/auth/confirm-email-change/{}",
        state.deployment.base_url, token
    );

    // The confirmation email goes to the NEW address: only someone who can
    // read it may complete the change.
    let mailer = state.services.mailer.clone();
    let recipient = body.new_email.clone();

    state.services.tasks.spawn("email-change-confirmation", move || {
        let mailer = mailer.clone();
        let email = confirmation_email(&confirm_url).to(&recipient);

        async move {
            mailer.send(&email).await?;
            Ok(())
        }
    });

    tracing::info!(user_id = %user.id, "Email change requested");

    Ok((
        StatusCode::ACCEPTED,
        Json(EmailChangeResponse { requested: true }),
    ))
}
