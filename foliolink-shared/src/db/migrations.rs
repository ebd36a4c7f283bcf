/// Database migration runner
///
/// Thin wrapper over sqlx's migration system. Migration files live in the
/// `migrations/` directory at the crate root; the API server runs pending
/// migrations on startup before serving traffic.
///
/// # Example
///
/// ```no_run
/// use foliolink_shared::db::migrations::run_migrations;
/// use sqlx::PgPool;
///
/// # async fn example(pool: PgPool) -> Result<(), Box<dyn std::error::Error>> {
/// run_migrations(&pool).await?;
/// # Ok(())
/// # }
/// ```

use sqlx::postgres::PgPool;
use tracing::info;

/// Runs all pending database migrations
///
/// # Errors
///
/// Returns an error if a migration file is malformed, a migration fails to
/// execute, or the database connection is lost mid-migration.
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    info!("Running database migrations");

    let migrator = sqlx::migrate!("./migrations");
    migrator.run(pool).await?;

    info!("Database migrations complete");
    Ok(())
}

/// Gets the number of applied migrations
///
/// Returns 0 when the migrations table does not exist yet.
pub async fn applied_migration_count(pool: &PgPool) -> Result<i64, sqlx::Error> {
    let exists: (bool,) = sqlx::query_as(
        r#"
        SELECT EXISTS (
            SELECT 1 FROM information_schema.tables
            WHERE table_name = '_sqlx_migrations'
        )
        "#,
    )
    .fetch_one(pool)
    .await?;

    if !exists.0 {
        return Ok(0);
    }

    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM _sqlx_migrations")
        .fetch_one(pool)
        .await?;

    Ok(count)
}
