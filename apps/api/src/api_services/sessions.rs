use feedesk_core::AppError;
use sqlx::PgPool;
use tower_sessions::cookie::SameSite;
use tower_sessions::cookie::time::Duration;
use tower_sessions::{Expiry, SessionManagerLayer};
use tower_sessions_sqlx_store::PostgresStore;

use crate::api_config::ApiConfig;

/// Cookie carrying the server-side session id.
const SESSION_COOKIE_NAME: &str = "feedesk.sid";

/// Session layer backed by the `tower_sessions` table. Idle sessions lapse
/// after `SESSION_IDLE_MINUTES`; the absolute lifetime is enforced by
/// `require_auth`.
pub async fn build_postgres_session_layer(
    pool: PgPool,
    config: &ApiConfig,
) -> Result<SessionManagerLayer<PostgresStore>, AppError> {
    let store = PostgresStore::new(pool)
        .with_table_name("tower_sessions")
        .map_err(|error| AppError::Internal(format!("invalid session table name: {error}")))?;

    store
        .migrate()
        .await
        .map_err(|error| AppError::Internal(format!("session store migration failed: {error}")))?;

    Ok(SessionManagerLayer::new(store)
        .with_name(SESSION_COOKIE_NAME)
        .with_secure(config.cookie_secure)
        .with_same_site(SameSite::Lax)
        .with_http_only(true)
        .with_expiry(Expiry::OnInactivity(Duration::minutes(
            config.session_idle_minutes,
        ))))
}
