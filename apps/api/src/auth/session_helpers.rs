use chrono::Utc;
use feedesk_core::AppError;
use feedesk_domain::EffectiveUser;
use tower_sessions::Session;

use super::{SESSION_CREATED_AT_KEY, SESSION_USER_KEY};

/// Starts a fresh authenticated session under a new id.
pub(super) async fn establish_session(
    session: &Session,
    user: &EffectiveUser,
) -> Result<(), AppError> {
    session
        .cycle_id()
        .await
        .map_err(|error| AppError::Internal(format!("failed to cycle session id: {error}")))?;

    store_session_user(session, user).await?;

    session
        .insert(SESSION_CREATED_AT_KEY, Utc::now().timestamp())
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to persist session creation time: {error}"))
        })
}

/// Replaces the effective user of the current session.
pub(super) async fn store_session_user(
    session: &Session,
    user: &EffectiveUser,
) -> Result<(), AppError> {
    session
        .insert(SESSION_USER_KEY, user)
        .await
        .map_err(|error| AppError::Internal(format!("failed to persist session user: {error}")))
}
