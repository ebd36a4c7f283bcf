/// End-to-end tests for the email-change confirmation flow
///
/// These run against real infrastructure (DATABASE_URL, and REDIS_URL for
/// the temporary store) and are ignored by default:
///
/// ```bash
/// DATABASE_URL=... REDIS_URL=... cargo test --test confirm_flow -- --ignored
/// ```

mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use common::TestContext;
use foliolink_shared::auth::session::create_session_token;
use foliolink_shared::auth::token::issue_email_change_token;
use foliolink_shared::models::user::{CreateUser, User};
use tower::ServiceExt;

fn confirm_request(token: &str, session: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(format!("/auth/confirm-email-change/{}", token));

    if let Some(session) = session {
        builder = builder.header("cookie", format!("fl_session={}", session));
    }

    builder.body(Body::empty()).unwrap()
}

#[tokio::test]
#[ignore] // Requires DATABASE_URL and REDIS_URL
async fn confirming_twice_is_at_most_once() {
    let ctx = TestContext::new().await.unwrap();

    let unique = uuid::Uuid::new_v4().simple().to_string();
    let old_email = format!("old-{}@example.com", unique);
    let new_email = format!("new-{}@example.com", unique);

    let user = User::create(
        &ctx.db,
        CreateUser {
            email: old_email.clone(),
            name: None,
        },
    )
    .await
    .unwrap();

    let token = issue_email_change_token(
        &ctx.db,
        &ctx.state.services.store,
        user.id,
        &old_email,
        &new_email,
    )
    .await
    .unwrap();

    let session = create_session_token(user.id, common::TEST_SECRET).unwrap();

    // First confirmation commits the change.
    let response = ctx
        .app
        .clone()
        .oneshot(confirm_request(&token, Some(&session)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let updated = User::find_by_id(&ctx.db, user.id).await.unwrap().unwrap();
    assert_eq!(updated.email, new_email);

    // Give the background cleanup a moment to delete the token row.
    tokio::time::sleep(std::time::Duration::from_millis(1500)).await;

    // Second confirmation fails at token lookup.
    let response = ctx
        .app
        .clone()
        .oneshot(confirm_request(&token, Some(&session)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    User::delete(&ctx.db, user.id).await.unwrap();
}

#[tokio::test]
#[ignore] // Requires DATABASE_URL and REDIS_URL
async fn unauthenticated_confirmation_redirects_to_login() {
    let ctx = TestContext::new().await.unwrap();

    let unique = uuid::Uuid::new_v4().simple().to_string();
    let old_email = format!("old-{}@example.com", unique);
    let new_email = format!("new-{}@example.com", unique);

    let user = User::create(
        &ctx.db,
        CreateUser {
            email: old_email.clone(),
            name: None,
        },
    )
    .await
    .unwrap();

    let token = issue_email_change_token(
        &ctx.db,
        &ctx.state.services.store,
        user.id,
        &old_email,
        &new_email,
    )
    .await
    .unwrap();

    let response = ctx
        .app
        .clone()
        .oneshot(confirm_request(&token, None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);

    let location = response.headers().get("location").unwrap().to_str().unwrap();
    assert!(location.starts_with("/login?next=/auth/confirm-email-change/"));
    assert!(location.ends_with(&token));

    User::delete(&ctx.db, user.id).await.unwrap();
}

#[tokio::test]
#[ignore] // Requires DATABASE_URL
async fn unknown_token_is_not_found() {
    let ctx = TestContext::new().await.unwrap();

    let response = ctx
        .app
        .clone()
        .oneshot(confirm_request("definitely-not-a-token", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
