/// Email-change confirmation flow
///
/// # Endpoint
///
/// ```text
/// GET /auth/confirm-email-change/:token
/// ```
///
/// Linear state machine:
///
/// 1. Token lookup by hash; absent or expired answers the same generic
///    not-found page.
/// 2. Session check; unauthenticated callers are redirected to login with
///    the confirmation URL preserved as the next hop.
/// 3. Pending-state lookup in the temporary store; a deployment without the
///    store answers "feature unavailable" rather than a misleading
///    not-found.
/// 4. Commit: the old address is unsubscribed and the user row updated
///    inline; token cleanup, re-subscription of the new address, and the
///    notification email run on the background task runner after the
///    response.
///
/// Confirming the same token twice fails at step 1 on the second pass: the
/// cleanup task deleted the token row, giving at-most-once semantics per
/// token. Two confirmations racing rely on the store's atomic deletes, not
/// on any locking here.

use crate::app::{extract_session, AppState};
use crate::error::ApiError;
use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
};
use foliolink_shared::auth::token::{hash_token, EmailChangeRequest};
use foliolink_shared::email::templates;
use foliolink_shared::models::user::User;
use foliolink_shared::models::verification_token::VerificationToken;
use foliolink_shared::redis::store::{email_change_key, StoreError};

/// Generic not-found page
///
/// Shared by every failed precondition so the response does not reveal
/// whether the token was wrong, expired, or already used.
fn not_found_page() -> Response {
    (
        StatusCode::NOT_FOUND,
        Html(
            "<h1>Not found</h1>\
             <p>This link is invalid or has expired.</p>"
                .to_string(),
        ),
    )
        .into_response()
}

/// Page shown when the deployment lacks the temporary store
fn unavailable_page() -> Response {
    (
        StatusCode::SERVICE_UNAVAILABLE,
        Html(
            "<h1>Feature not available</h1>\
             <p>Email change confirmation requires additional configuration \
             on this deployment.</p>"
                .to_string(),
        ),
    )
        .into_response()
}

/// Success page
fn confirmed_page(new_email: &str) -> Response {
    Html(format!(
        "<h1>Email updated</h1>\
         <p>Your account email is now <strong>{}</strong>.</p>",
        new_email
    ))
    .into_response()
}

/// Email-change confirmation handler
pub async fn confirm_email_change(
    State(state): State<AppState>,
    Path(token): Path<String>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    // Step 1: token lookup. Expired tokens are indistinguishable from
    // absent ones in the response.
    let hashed = hash_token(&token);
    let token_row = match VerificationToken::find_by_token(&state.db, &hashed).await? {
        Some(row) if !row.is_expired() => row,
        _ => return Ok(not_found_page()),
    };

    // Step 2: session check, preserving intent through the login redirect.
    let Some(session) = extract_session(&headers, state.session_secret()) else {
        let next = format!("/login?next=/auth/confirm-email-change/{}", token);
        return Ok(Redirect::temporary(&next).into_response());
    };

    let user_id = session.sub;

    // Step 3: pending state. The request is keyed by the confirming user,
    // not by the token row.
    let pending: EmailChangeRequest = match state
        .services
        .store
        .get_json(&email_change_key(&user_id.to_string()))
        .await
    {
        Ok(Some(pending)) => pending,
        Ok(None) => return Ok(not_found_page()),
        Err(StoreError::Unavailable) => return Ok(unavailable_page()),
        Err(e) => return Err(e.into()),
    };

    // Step 4: commit. The old address leaves the mailing list before the
    // account flips; a list failure is logged, never blocking the change.
    if let Err(e) = state.services.audience.unsubscribe(&pending.email).await {
        tracing::error!(error = %e, "Failed to unsubscribe old address");
    }

    if User::update_email(&state.db, user_id, &pending.new_email)
        .await?
        .is_none()
    {
        return Ok(not_found_page());
    }

    tracing::info!(user_id = %user_id, "Email address updated");

    // Cleanup and notifications continue after the response. The body is
    // idempotent: re-deleting the token row and store key are no-ops and
    // the subscribe/send calls tolerate repeats.
    let db = state.db.clone();
    let store = state.services.store.clone();
    let audience = state.services.audience.clone();
    let mailer = state.services.mailer.clone();
    let identifier = token_row.identifier.clone();
    let new_email = pending.new_email.clone();
    let old_email = pending.email.clone();

    state.services.tasks.spawn("email-change-cleanup", move || {
        let db = db.clone();
        let store = store.clone();
        let audience = audience.clone();
        let mailer = mailer.clone();
        let hashed = hashed.clone();
        let identifier = identifier.clone();
        let new_email = new_email.clone();
        let old_email = old_email.clone();

        async move {
            VerificationToken::delete(&db, &hashed).await?;
            store.delete(&email_change_key(&identifier)).await?;

            audience.subscribe(&new_email).await?;

            let email = templates::email_updated(&old_email, &new_email).to(&old_email);
            mailer.send(&email).await?;

            Ok(())
        }
    });

    Ok(confirmed_page(&pending.new_email))
}
