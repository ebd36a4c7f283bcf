//! # FolioLink API Server
//!
//! The web tier of the FolioLink document-sharing platform: feature flags,
//! plan limits, the email-change confirmation flow, teammate invitations,
//! passkey registration, and signed job callbacks.
//!
//! Optional providers (Redis, Slack, email, queue, passkeys) are resolved
//! once at startup into live or disabled capabilities; a self-hosted
//! install missing all of them still serves every route, with the
//! dependent features degraded explicitly.
//!
//! ## Usage
//!
//! ```bash
//! cargo run -p foliolink-api
//! ```

use foliolink_api::app::{build_router, AppState, Services};
use foliolink_api::config::Config;
use foliolink_shared::config::DeploymentConfig;
use foliolink_shared::db::migrations::run_migrations;
use foliolink_shared::db::pool::{close_pool, create_pool, DatabaseConfig};
use foliolink_shared::redis::RedisClient;
use foliolink_shared::tasks::TaskRunner;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "foliolink_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        "FolioLink API Server v{} starting...",
        env!("CARGO_PKG_VERSION")
    );

    let config = Config::from_env()?;
    let deployment = DeploymentConfig::from_env()?;

    if deployment.self_hosted {
        tracing::info!("Running in self-hosted mode");
    }

    // Database
    let db = create_pool(DatabaseConfig {
        url: config.database.url.clone(),
        max_connections: config.database.max_connections,
        ..Default::default()
    })
    .await?;

    run_migrations(&db).await?;

    // Redis is optional, but a configured Redis that cannot be reached is a
    // startup error, not a silent downgrade.
    let redis = match &deployment.redis {
        Some(redis_config) => Some(RedisClient::new(redis_config.clone()).await?),
        None => None,
    };

    // Background task runner, stopped via the shutdown token.
    let shutdown = CancellationToken::new();
    let (tasks, tasks_handle) = TaskRunner::start(shutdown.clone());

    let services = Services::build(db.clone(), &deployment, redis, tasks);

    // Ensure the periodic token sweep is scheduled when a queue is present.
    if let Some(callback_url) = services.queue.callback_url().map(|s| s.to_string()) {
        let payload = serde_json::json!({ "type": "tokens.cleanup" });
        match services.queue.publish_json(&callback_url, &payload).await {
            Ok(message_id) => {
                tracing::info!(%message_id, "Scheduled verification-token sweep")
            }
            Err(e) => tracing::error!(error = %e, "Failed to schedule token sweep"),
        }
    }

    let state = AppState::new(db.clone(), config.clone(), deployment, services);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(config.bind_address()).await?;
    tracing::info!("Server listening on http://{}", config.bind_address());

    let server_shutdown = shutdown.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutdown signal received");
            server_shutdown.cancel();
        })
        .await?;

    // Drain background tasks, then release the pool.
    shutdown.cancel();
    if let Err(e) = tasks_handle.await {
        tracing::error!(error = %e, "Task runner terminated abnormally");
    }
    close_pool(db).await;

    tracing::info!("Shutdown complete");
    Ok(())
}
