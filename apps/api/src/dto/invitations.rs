use feedesk_application::{BulkInvitationFailure, BulkInvitationReport};
use feedesk_domain::Invitation;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Incoming payload for issuing one invitation.
#[derive(Debug, Clone, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/create-invitation-request.ts"
)]
pub struct CreateInvitationRequest {
    pub email: String,
    pub role: String,
    pub department: String,
    pub roll_number: Option<String>,
    pub employee_id: Option<String>,
}

/// Incoming payload for a bulk import.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/bulk-invitation-request.ts"
)]
pub struct BulkInvitationRequest {
    pub rows: Vec<CreateInvitationRequest>,
}

/// API representation of an invitation. Never carries the token.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/invitation-response.ts"
)]
pub struct InvitationResponse {
    pub id: String,
    pub email: String,
    pub role: String,
    pub department: String,
    pub roll_number: Option<String>,
    pub employee_id: Option<String>,
    pub invited_by: Option<String>,
    pub is_active: bool,
    pub expires_at: String,
    pub used_at: Option<String>,
    pub created_at: String,
}

/// One failed row of a bulk import.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/bulk-invitation-failure-response.ts"
)]
pub struct BulkInvitationFailureResponse {
    pub row: u32,
    pub email: String,
    pub reason: String,
}

/// Result of a bulk import.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/bulk-invitation-report-response.ts"
)]
pub struct BulkInvitationReportResponse {
    pub succeeded: Vec<InvitationResponse>,
    pub failed: Vec<BulkInvitationFailureResponse>,
}

impl From<Invitation> for InvitationResponse {
    fn from(invitation: Invitation) -> Self {
        Self {
            id: invitation.id.to_string(),
            email: invitation.email.to_string(),
            role: invitation.role.as_str().to_owned(),
            department: invitation.department.to_string(),
            roll_number: invitation.roll_number,
            employee_id: invitation.employee_id,
            invited_by: invitation.invited_by.map(|user_id| user_id.to_string()),
            is_active: invitation.is_active,
            expires_at: invitation.expires_at.to_rfc3339(),
            used_at: invitation.used_at.map(|used_at| used_at.to_rfc3339()),
            created_at: invitation.created_at.to_rfc3339(),
        }
    }
}

impl From<BulkInvitationFailure> for BulkInvitationFailureResponse {
    fn from(failure: BulkInvitationFailure) -> Self {
        Self {
            row: u32::try_from(failure.row).unwrap_or(u32::MAX),
            email: failure.email,
            reason: failure.reason,
        }
    }
}

impl From<BulkInvitationReport> for BulkInvitationReportResponse {
    fn from(report: BulkInvitationReport) -> Self {
        Self {
            succeeded: report
                .succeeded
                .into_iter()
                .map(InvitationResponse::from)
                .collect(),
            failed: report
                .failed
                .into_iter()
                .map(BulkInvitationFailureResponse::from)
                .collect(),
        }
    }
}
