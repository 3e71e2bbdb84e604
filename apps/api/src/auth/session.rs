use axum::Json;
use axum::extract::{Extension, State};
use axum::http::StatusCode;
use feedesk_core::AppError;
use feedesk_domain::EffectiveUser;
use tower_sessions::Session;

use crate::dto::{LoginRequest, SessionUserResponse};
use crate::error::ApiResult;
use crate::state::AppState;

use super::session_helpers::{establish_session, store_session_user};

pub async fn login_handler(
    State(state): State<AppState>,
    session: Session,
    Json(payload): Json<LoginRequest>,
) -> ApiResult<Json<SessionUserResponse>> {
    let user = state
        .session_service
        .sign_in(&payload.email, &payload.password)
        .await?;

    establish_session(&session, &user).await?;

    Ok(Json(SessionUserResponse::from(&user)))
}

pub async fn logout_handler(session: Session) -> ApiResult<StatusCode> {
    session
        .delete()
        .await
        .map_err(|error| AppError::Internal(format!("failed to delete session: {error}")))?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn me_handler(Extension(user): Extension<EffectiveUser>) -> Json<SessionUserResponse> {
    Json(SessionUserResponse::from(&user))
}

/// POST /auth/session/refresh - Rebuild permissions after an admin change.
pub async fn refresh_session_handler(
    State(state): State<AppState>,
    Extension(user): Extension<EffectiveUser>,
    session: Session,
) -> ApiResult<Json<SessionUserResponse>> {
    let refreshed = state.session_service.refresh(&user).await?;
    store_session_user(&session, &refreshed).await?;

    Ok(Json(SessionUserResponse::from(&refreshed)))
}
