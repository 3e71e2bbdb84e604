use std::time::Duration;

use feedesk_core::AppError;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tracing::info;

use crate::api_config::ApiConfig;

/// Opens the shared pool and brings the schema up to date.
pub async fn connect_and_migrate(config: &ApiConfig) -> Result<PgPool, AppError> {
    let pool = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .acquire_timeout(Duration::from_secs(5))
        .connect(&config.database_url)
        .await
        .map_err(|error| AppError::Internal(format!("database unreachable: {error}")))?;

    let migrator = sqlx::migrate!("../../crates/infrastructure/migrations");
    migrator
        .run(&pool)
        .await
        .map_err(|error| AppError::Internal(format!("schema migration failed: {error}")))?;

    info!(
        migrations = migrator.iter().count(),
        max_connections = config.database_max_connections,
        "database ready"
    );

    Ok(pool)
}
