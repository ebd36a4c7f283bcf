/// Application state and router builder
///
/// The state carries the database pool, both configuration layers, and the
/// service capabilities resolved at startup. Every optional provider is
/// injected here as an explicit live-or-disabled value; handlers never
/// consult the environment.
///
/// # Router layout
///
/// ```text
/// /
/// ├── /health                              # Health check (public)
/// ├── /auth/confirm-email-change/:token    # Email-change confirmation
/// └── /api/                                # Rate-limited API
///     ├── GET  /feature-flags
///     ├── POST /jobs                       # Signed queue callbacks
///     ├── GET  /teams/:team_id/limits
///     ├── POST /teams/:team_id/invitations # Session required
///     ├── POST /account/email-change       # Session required
///     └── POST /auth/passkeys/register     # Session required
/// ```

use crate::{config::Config, middleware::security::SecurityHeadersLayer};
use axum::{
    extract::Request,
    http::{header, HeaderMap, HeaderValue, Method},
    middleware::Next,
    response::Response,
    routing::{get, post},
    Router,
};
use foliolink_shared::auth::session::{validate_session_token, SessionClaims};
use foliolink_shared::config::DeploymentConfig;
use foliolink_shared::email::{Audience, Mailer};
use foliolink_shared::limits::LimitEvaluator;
use foliolink_shared::passkeys::PasskeyBackend;
use foliolink_shared::queue::{JobQueue, QueueReceiver};
use foliolink_shared::ratelimit::RateLimiter;
use foliolink_shared::redis::{RedisClient, TempStore};
use foliolink_shared::slack::SlackNotifier;
use foliolink_shared::tasks::TaskRunner;
use sqlx::PgPool;
use std::sync::Arc;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Service capabilities resolved at startup
///
/// Each field is a live or disabled implementation picked from the
/// deployment configuration; cloning shares the underlying clients.
#[derive(Clone)]
pub struct Services {
    /// Temporary store for pending state
    pub store: TempStore,

    /// Sliding-window rate limiter
    pub rate_limiter: RateLimiter,

    /// Job queue publisher
    pub queue: JobQueue,

    /// Inbound job signature verifier (present when the queue is configured)
    pub receiver: Option<QueueReceiver>,

    /// Transactional mailer
    pub mailer: Mailer,

    /// Mailing-list audience
    pub audience: Audience,

    /// Slack notification dispatcher
    pub slack: SlackNotifier,

    /// Passkey tenant
    pub passkeys: PasskeyBackend,

    /// Plan-limit evaluator
    pub limits: LimitEvaluator,

    /// Background task runner
    pub tasks: TaskRunner,
}

impl Services {
    /// Builds all capabilities from the deployment configuration
    pub fn build(
        db: PgPool,
        deployment: &DeploymentConfig,
        redis: Option<RedisClient>,
        tasks: TaskRunner,
    ) -> Self {
        Services {
            store: TempStore::new(redis.clone()),
            rate_limiter: RateLimiter::with_defaults(redis),
            queue: JobQueue::new(deployment.queue.clone()),
            receiver: deployment.queue.as_ref().map(QueueReceiver::new),
            mailer: Mailer::new(deployment.email.clone()),
            audience: Audience::new(deployment.email.clone()),
            slack: SlackNotifier::new(deployment.slack.as_ref(), db.clone()),
            passkeys: PasskeyBackend::new(deployment.passkeys.clone()),
            limits: LimitEvaluator::new(db, deployment.self_hosted),
            tasks,
        }
    }
}

/// Shared application state
///
/// Cloned for each request handler via Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: PgPool,

    /// Server configuration
    pub config: Arc<Config>,

    /// Deployment configuration
    pub deployment: Arc<DeploymentConfig>,

    /// Service capabilities
    pub services: Services,
}

impl AppState {
    /// Creates new application state
    pub fn new(
        db: PgPool,
        config: Config,
        deployment: DeploymentConfig,
        services: Services,
    ) -> Self {
        Self {
            db,
            config: Arc::new(config),
            deployment: Arc::new(deployment),
            services,
        }
    }

    /// Gets the session signing secret
    pub fn session_secret(&self) -> &str {
        &self.deployment.session_secret
    }
}

/// Authenticated session attached to request extensions
#[derive(Debug, Clone, Copy)]
pub struct SessionContext {
    /// Authenticated user ID
    pub user_id: uuid::Uuid,
}

/// Extracts and validates the session from request headers
///
/// Accepts a bearer token in `Authorization` or the `fl_session` cookie.
/// Returns None when no credential is presented or it fails validation;
/// callers decide between 401 and a login redirect.
pub fn extract_session(headers: &HeaderMap, secret: &str) -> Option<SessionClaims> {
    let token = bearer_token(headers).or_else(|| session_cookie(headers))?;
    validate_session_token(&token, secret).ok()
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|v| v.to_string())
}

fn session_cookie(headers: &HeaderMap) -> Option<String> {
    let cookies = headers.get(header::COOKIE)?.to_str().ok()?;

    cookies.split(';').find_map(|pair| {
        let (name, value) = pair.trim().split_once('=')?;
        (name == "fl_session").then(|| value.to_string())
    })
}

/// Builds the complete Axum router with all routes and middleware
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    // Health check (public, no auth)
    let health_routes = Router::new().route("/health", get(routes::health::health_check));

    // Email-change confirmation: handles its own session (redirects to
    // login instead of answering 401).
    let confirm_routes = Router::new().route(
        "/auth/confirm-email-change/:token",
        get(routes::confirm_email_change::confirm_email_change),
    );

    // Session-authenticated API routes
    let session_routes = Router::new()
        .route(
            "/teams/:team_id/invitations",
            post(routes::invitations::create_invitation),
        )
        .route(
            "/account/email-change",
            post(routes::email_change::request_email_change),
        )
        .route(
            "/auth/passkeys/register",
            post(routes::passkeys::start_registration),
        )
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            session_auth_layer,
        ));

    // Public API routes
    let api_routes = Router::new()
        .route("/feature-flags", get(routes::feature_flags::feature_flags))
        .route("/jobs", post(routes::jobs::handle_job))
        .route("/teams/:team_id/limits", get(routes::limits::team_limits))
        .merge(session_routes)
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            crate::middleware::rate_limit::rate_limit_layer,
        ));

    // Configure CORS based on environment
    let cors = if state.config.api.cors_origins.contains(&"*".to_string()) {
        // Development mode: permissive CORS
        CorsLayer::permissive()
    } else {
        // Production mode: configure allowed origins
        let origins: Vec<HeaderValue> = state
            .config
            .api
            .cors_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .allow_credentials(true)
            .max_age(std::time::Duration::from_secs(3600))
    };

    Router::new()
        .merge(health_routes)
        .merge(confirm_routes)
        .nest("/api", api_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .layer(SecurityHeadersLayer::new(state.config.api.production))
        .with_state(state)
}

/// Session authentication middleware layer
///
/// Validates the session credential and injects SessionContext into request
/// extensions.
async fn session_auth_layer(
    state: axum::extract::State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, crate::error::ApiError> {
    let claims = extract_session(req.headers(), state.session_secret()).ok_or_else(|| {
        crate::error::ApiError::Unauthorized("Missing or invalid session".to_string())
    })?;

    req.extensions_mut().insert(SessionContext {
        user_id: claims.sub,
    });

    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use foliolink_shared::auth::session::create_session_token;
    use uuid::Uuid;

    const SECRET: &str = "test-secret-key-at-least-32-bytes-long";

    #[test]
    fn test_extract_session_from_bearer() {
        let user_id = Uuid::new_v4();
        let token = create_session_token(user_id, SECRET).unwrap();

        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            format!("Bearer {}", token).parse().unwrap(),
        );

        let claims = extract_session(&headers, SECRET).unwrap();
        assert_eq!(claims.sub, user_id);
    }

    #[test]
    fn test_extract_session_from_cookie() {
        let user_id = Uuid::new_v4();
        let token = create_session_token(user_id, SECRET).unwrap();

        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            format!("theme=dark; fl_session={}", token).parse().unwrap(),
        );

        let claims = extract_session(&headers, SECRET).unwrap();
        assert_eq!(claims.sub, user_id);
    }

    #[test]
    fn test_extract_session_missing_credential() {
        let headers = HeaderMap::new();
        assert!(extract_session(&headers, SECRET).is_none());
    }

    #[test]
    fn test_extract_session_rejects_bad_token() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            "Bearer not-a-real-token".parse().unwrap(),
        );
        assert!(extract_session(&headers, SECRET).is_none());
    }
}
