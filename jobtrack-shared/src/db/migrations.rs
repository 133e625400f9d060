/// Embedded schema migrations
///
/// SQL files under `jobtrack-shared/migrations/` are compiled into the
/// binary with `sqlx::migrate!` and applied at startup.

use sqlx::postgres::PgPool;
use tracing::{debug, error, info};

/// Applies all pending migrations
///
/// # Errors
///
/// Returns the first failing migration's error; sqlx rolls that migration
/// back.
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    let migrator = sqlx::migrate!("./migrations");
    info!(count = migrator.iter().count(), "Running database migrations");

    migrator.run(pool).await.map_err(|e| {
        error!(error = %e, "Migration failed");
        e
    })?;

    info!("Database migrations complete");
    Ok(())
}

/// Number of successfully applied migrations
pub async fn applied_migrations(pool: &PgPool) -> Result<i64, sqlx::Error> {
    let count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM _sqlx_migrations WHERE success = true")
            .fetch_one(pool)
            .await?;

    debug!(applied = count, "Migration status retrieved");
    Ok(count)
}
