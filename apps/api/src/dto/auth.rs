use feedesk_application::{InvitationTokenStatus, ProvisionedAccount};
use feedesk_domain::InvitationSnapshot;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Incoming payload for email/password sign-in.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/login-request.ts"
)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Incoming payload for creating the first admin.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/bootstrap-request.ts"
)]
pub struct BootstrapRequest {
    pub token: String,
    pub email: String,
    pub password: String,
    pub name: String,
    pub employee_id: String,
}

/// Incoming payload for an invitation link check.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/validate-invitation-request.ts"
)]
pub struct ValidateInvitationRequest {
    pub token: String,
}

/// Invitation details shown on the signup form.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/invitation-snapshot-response.ts"
)]
pub struct InvitationSnapshotResponse {
    pub id: String,
    pub email: String,
    pub role: String,
    pub department: String,
    pub roll_number: Option<String>,
    pub employee_id: Option<String>,
    pub validated_at: String,
}

/// Outcome of an invitation link check.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/invitation-token-status-response.ts"
)]
pub struct InvitationTokenStatusResponse {
    pub is_valid: bool,
    /// One of `malformed`, `not found`, `expired`, `already used`.
    pub error_message: Option<String>,
    pub invitation: Option<InvitationSnapshotResponse>,
}

/// Incoming payload for signup through an invitation.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/signup-request.ts"
)]
pub struct SignupRequest {
    pub token: String,
    pub email: String,
    pub password: String,
    pub name: String,
    pub roll_number: Option<String>,
    pub employee_id: Option<String>,
}

/// Account created by signup or bootstrap.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/provisioned-account-response.ts"
)]
pub struct ProvisionedAccountResponse {
    pub user_id: String,
    pub role: String,
    pub department_id: Option<String>,
}

/// Incoming payload for switching to another user's view.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/impersonation-request.ts"
)]
pub struct ImpersonationRequest {
    pub user_id: String,
}

impl From<InvitationSnapshot> for InvitationSnapshotResponse {
    fn from(snapshot: InvitationSnapshot) -> Self {
        Self {
            id: snapshot.id.to_string(),
            email: snapshot.email.to_string(),
            role: snapshot.role.as_str().to_owned(),
            department: snapshot.department.to_string(),
            roll_number: snapshot.roll_number,
            employee_id: snapshot.employee_id,
            validated_at: snapshot.validated_at.to_rfc3339(),
        }
    }
}

impl From<InvitationTokenStatus> for InvitationTokenStatusResponse {
    fn from(status: InvitationTokenStatus) -> Self {
        Self {
            is_valid: status.is_valid,
            error_message: status.error_message.map(ToOwned::to_owned),
            invitation: status.invitation.map(InvitationSnapshotResponse::from),
        }
    }
}

impl From<ProvisionedAccount> for ProvisionedAccountResponse {
    fn from(account: ProvisionedAccount) -> Self {
        Self {
            user_id: account.identity_id.to_string(),
            role: account.role.as_str().to_owned(),
            department_id: account.department_id.map(String::from),
        }
    }
}
