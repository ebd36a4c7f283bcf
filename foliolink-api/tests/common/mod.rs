/// Common test utilities for integration tests
///
/// Two flavors of context:
/// - `state_without_providers`: every optional capability disabled and a
///   lazy (unconnected) pool, for exercising the degraded paths without
///   any infrastructure.
/// - `TestContext::new`: real database (and optionally Redis) from the
///   environment, used by the ignored end-to-end tests.

use foliolink_api::app::{build_router, AppState, Services};
use foliolink_api::config::{ApiConfig, Config, DatabaseConfig};
use foliolink_shared::config::DeploymentConfig;
use foliolink_shared::redis::{RedisClient, RedisConfig};
use foliolink_shared::tasks::TaskRunner;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tokio_util::sync::CancellationToken;

/// Session secret used across the test suite
pub const TEST_SECRET: &str = "test-secret-key-at-least-32-bytes-long";

/// Server config pointing at nothing in particular
pub fn test_config(database_url: &str) -> Config {
    Config {
        api: ApiConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            cors_origins: vec!["*".to_string()],
            production: false,
        },
        database: DatabaseConfig {
            url: database_url.to_string(),
            max_connections: 2,
        },
    }
}

/// Deployment config with every optional provider absent
pub fn test_deployment(self_hosted: bool) -> DeploymentConfig {
    DeploymentConfig {
        self_hosted,
        base_url: "http://localhost:8080".to_string(),
        session_secret: TEST_SECRET.to_string(),
        verification_secret: TEST_SECRET.to_string(),
        beta_teams: vec!["beta-team".to_string()],
        redis: None,
        slack: None,
        email: None,
        queue: None,
        passkeys: None,
    }
}

/// Builds app state with all capabilities disabled and no live database
///
/// The pool is lazy: routes that never touch the database work normally,
/// and routes that do observe a connection error.
pub fn state_without_providers() -> AppState {
    let config = test_config("postgresql://127.0.0.1:1/unreachable");
    let deployment = test_deployment(false);

    let db = PgPoolOptions::new()
        .max_connections(1)
        .connect_lazy(&config.database.url)
        .expect("lazy pool");

    let (tasks, _handle) = TaskRunner::start(CancellationToken::new());
    let services = Services::build(db.clone(), &deployment, None, tasks);

    AppState::new(db, config, deployment, services)
}

/// Builds the router over a provider-less state
pub fn app_without_providers() -> axum::Router {
    build_router(state_without_providers())
}

/// Test context backed by real infrastructure from the environment
///
/// Used by `#[ignore]`d tests; requires DATABASE_URL (and REDIS_URL for
/// the flows that need the temporary store).
pub struct TestContext {
    pub db: PgPool,
    pub app: axum::Router,
    pub state: AppState,
}

impl TestContext {
    /// Creates a context against the configured database
    pub async fn new() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")?;
        let config = test_config(&database_url);
        let deployment = test_deployment(false);

        let db = PgPoolOptions::new()
            .max_connections(2)
            .connect(&database_url)
            .await?;

        foliolink_shared::db::migrations::run_migrations(&db).await?;

        let redis = match RedisConfig::from_env_optional()? {
            Some(redis_config) => Some(RedisClient::new(redis_config).await?),
            None => None,
        };

        let (tasks, _handle) = TaskRunner::start(CancellationToken::new());
        let services = Services::build(db.clone(), &deployment, redis, tasks);
        let state = AppState::new(db.clone(), config, deployment, services);
        let app = build_router(state.clone());

        Ok(Self { db, app, state })
    }
}
