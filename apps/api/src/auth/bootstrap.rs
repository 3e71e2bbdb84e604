use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use feedesk_application::BootstrapAdminRequest;

use crate::dto::{BootstrapRequest, ProvisionedAccountResponse};
use crate::error::ApiResult;
use crate::state::AppState;

/// POST /auth/bootstrap - Create the first admin account.
pub async fn bootstrap_handler(
    State(state): State<AppState>,
    Json(payload): Json<BootstrapRequest>,
) -> ApiResult<(StatusCode, Json<ProvisionedAccountResponse>)> {
    let account = state
        .provisioning_service
        .bootstrap_admin(BootstrapAdminRequest {
            token: payload.token,
            email: payload.email,
            password: payload.password,
            name: payload.name,
            employee_id: payload.employee_id,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ProvisionedAccountResponse::from(account)),
    ))
}
