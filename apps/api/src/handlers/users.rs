use std::str::FromStr;

use axum::Json;
use axum::extract::{Extension, Path, State};
use axum::http::StatusCode;
use feedesk_domain::{DepartmentId, EffectiveUser, Role, UserId};

use super::parse_uuid;
use crate::dto::{
    AssignRoleRequest, ChangeRoleRequest, PermissionChangeResponse, RoleAssignmentResponse,
    SetActiveRequest, UserResponse,
};
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn list_users_handler(
    State(state): State<AppState>,
    Extension(user): Extension<EffectiveUser>,
) -> ApiResult<Json<Vec<UserResponse>>> {
    let users = state
        .user_admin_service
        .list_users(&user)
        .await?
        .into_iter()
        .map(UserResponse::from)
        .collect();

    Ok(Json(users))
}

pub async fn change_role_handler(
    State(state): State<AppState>,
    Extension(user): Extension<EffectiveUser>,
    Path(user_id): Path<String>,
    Json(payload): Json<ChangeRoleRequest>,
) -> ApiResult<StatusCode> {
    let target = UserId::parse(&user_id)?;
    let role = Role::from_str(&payload.role)?;
    state
        .user_admin_service
        .change_role(&user, target, role)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn set_active_handler(
    State(state): State<AppState>,
    Extension(user): Extension<EffectiveUser>,
    Path(user_id): Path<String>,
    Json(payload): Json<SetActiveRequest>,
) -> ApiResult<StatusCode> {
    let target = UserId::parse(&user_id)?;
    state
        .user_admin_service
        .set_active(&user, target, payload.is_active)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn remove_user_handler(
    State(state): State<AppState>,
    Extension(user): Extension<EffectiveUser>,
    Path(user_id): Path<String>,
) -> ApiResult<StatusCode> {
    let target = UserId::parse(&user_id)?;
    state.user_admin_service.remove_user(&user, target).await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn assign_role_handler(
    State(state): State<AppState>,
    Extension(user): Extension<EffectiveUser>,
    Json(payload): Json<AssignRoleRequest>,
) -> ApiResult<(StatusCode, Json<RoleAssignmentResponse>)> {
    let target = UserId::parse(&payload.user_id)?;
    let role_id = parse_uuid(&payload.role_id, "role id")?;
    let department = payload
        .department_id
        .as_deref()
        .filter(|value| !value.trim().is_empty())
        .map(DepartmentId::new)
        .transpose()?;

    let assignment = state
        .user_admin_service
        .assign_role(&user, target, role_id, department)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(RoleAssignmentResponse::from(assignment)),
    ))
}

pub async fn revoke_assignment_handler(
    State(state): State<AppState>,
    Extension(user): Extension<EffectiveUser>,
    Path(assignment_id): Path<String>,
) -> ApiResult<StatusCode> {
    let assignment_id = parse_uuid(&assignment_id, "assignment id")?;
    state
        .user_admin_service
        .revoke_assignment(&user, assignment_id)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn grant_permission_handler(
    State(state): State<AppState>,
    Extension(user): Extension<EffectiveUser>,
    Path((role_id, permission_id)): Path<(String, String)>,
) -> ApiResult<Json<PermissionChangeResponse>> {
    let role_id = parse_uuid(&role_id, "role id")?;
    let permission_id = parse_uuid(&permission_id, "permission id")?;
    let changed = state
        .user_admin_service
        .grant_permission(&user, role_id, permission_id)
        .await?;

    Ok(Json(PermissionChangeResponse { changed }))
}

pub async fn revoke_permission_handler(
    State(state): State<AppState>,
    Extension(user): Extension<EffectiveUser>,
    Path((role_id, permission_id)): Path<(String, String)>,
) -> ApiResult<Json<PermissionChangeResponse>> {
    let role_id = parse_uuid(&role_id, "role id")?;
    let permission_id = parse_uuid(&permission_id, "permission id")?;
    let changed = state
        .user_admin_service
        .revoke_permission(&user, role_id, permission_id)
        .await?;

    Ok(Json(PermissionChangeResponse { changed }))
}
