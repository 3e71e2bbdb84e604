use axum::Json;
use axum::extract::{Extension, State};
use feedesk_domain::{EffectiveUser, UserId};
use tower_sessions::Session;

use crate::dto::{ImpersonationRequest, SessionUserResponse};
use crate::error::ApiResult;
use crate::state::AppState;

use super::session_helpers::store_session_user;

/// POST /auth/impersonation - View the portal as another user.
pub async fn start_impersonation_handler(
    State(state): State<AppState>,
    Extension(user): Extension<EffectiveUser>,
    session: Session,
    Json(payload): Json<ImpersonationRequest>,
) -> ApiResult<Json<SessionUserResponse>> {
    let target_id = UserId::parse(&payload.user_id)?;
    let viewing = state
        .session_service
        .switch_to_user_view(user, target_id)
        .await?;
    store_session_user(&session, &viewing).await?;

    Ok(Json(SessionUserResponse::from(&viewing)))
}

/// DELETE /auth/impersonation - Return to the signed-in identity.
pub async fn exit_impersonation_handler(
    State(state): State<AppState>,
    Extension(user): Extension<EffectiveUser>,
    session: Session,
) -> ApiResult<Json<SessionUserResponse>> {
    let restored = state.session_service.exit_impersonation(user).await;
    store_session_user(&session, &restored).await?;

    Ok(Json(SessionUserResponse::from(&restored)))
}
