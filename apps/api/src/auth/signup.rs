use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use feedesk_application::{SignupCredentials, SignupProfile};

use crate::dto::{
    InvitationTokenStatusResponse, ProvisionedAccountResponse, SignupRequest,
    ValidateInvitationRequest,
};
use crate::error::ApiResult;
use crate::state::AppState;

/// POST /auth/invitations/validate - Check an invitation link before signup.
pub async fn validate_invitation_handler(
    State(state): State<AppState>,
    Json(payload): Json<ValidateInvitationRequest>,
) -> ApiResult<Json<InvitationTokenStatusResponse>> {
    let status = state.invitation_service.check_token(&payload.token).await?;

    Ok(Json(InvitationTokenStatusResponse::from(status)))
}

/// POST /auth/signup - Create an account from an invitation.
pub async fn signup_handler(
    State(state): State<AppState>,
    Json(payload): Json<SignupRequest>,
) -> ApiResult<(StatusCode, Json<ProvisionedAccountResponse>)> {
    let snapshot = state.invitation_service.validate(&payload.token).await?;

    let account = state
        .provisioning_service
        .provision(
            &snapshot,
            SignupCredentials {
                email: payload.email,
                password: payload.password,
            },
            SignupProfile {
                name: payload.name,
                roll_number: payload.roll_number,
                employee_id: payload.employee_id,
            },
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ProvisionedAccountResponse::from(account)),
    ))
}
