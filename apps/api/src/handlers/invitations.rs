use std::str::FromStr;

use axum::Json;
use axum::extract::{Extension, Path, State};
use axum::http::StatusCode;
use feedesk_application::{BulkInvitationFailure, BulkInvitationReport, NewInvitation};
use feedesk_core::AppError;
use feedesk_domain::{DepartmentId, EffectiveUser, InvitationId, Role};

use crate::dto::{
    BulkInvitationReportResponse, BulkInvitationRequest, CreateInvitationRequest,
    InvitationResponse,
};
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn list_invitations_handler(
    State(state): State<AppState>,
    Extension(user): Extension<EffectiveUser>,
) -> ApiResult<Json<Vec<InvitationResponse>>> {
    let invitations = state
        .invitation_service
        .list_pending(&user)
        .await?
        .into_iter()
        .map(InvitationResponse::from)
        .collect();

    Ok(Json(invitations))
}

pub async fn create_invitation_handler(
    State(state): State<AppState>,
    Extension(user): Extension<EffectiveUser>,
    Json(payload): Json<CreateInvitationRequest>,
) -> ApiResult<(StatusCode, Json<InvitationResponse>)> {
    let input = new_invitation(payload)?;
    let invitation = state.invitation_service.issue(&user, input).await?;

    Ok((StatusCode::CREATED, Json(InvitationResponse::from(invitation))))
}

pub async fn bulk_invitations_handler(
    State(state): State<AppState>,
    Extension(user): Extension<EffectiveUser>,
    Json(payload): Json<BulkInvitationRequest>,
) -> ApiResult<Json<BulkInvitationReportResponse>> {
    let parsed = ParsedBatch::from_rows(payload.rows);
    let report = state
        .invitation_service
        .issue_bulk(&user, parsed.valid)
        .await?;

    Ok(Json(BulkInvitationReportResponse::from(merge_report(
        report,
        &parsed.positions,
        parsed.rejected,
    ))))
}

pub async fn revoke_invitation_handler(
    State(state): State<AppState>,
    Extension(user): Extension<EffectiveUser>,
    Path(invitation_id): Path<String>,
) -> ApiResult<StatusCode> {
    let invitation_id = InvitationId::parse(&invitation_id)?;
    state.invitation_service.revoke(&user, invitation_id).await?;

    Ok(StatusCode::NO_CONTENT)
}

fn new_invitation(payload: CreateInvitationRequest) -> Result<NewInvitation, AppError> {
    Ok(NewInvitation {
        email: payload.email,
        role: Role::from_str(payload.role.trim())?,
        department: DepartmentId::new(&payload.department)?,
        roll_number: payload.roll_number,
        employee_id: payload.employee_id,
    })
}

/// Rows split into those the service can issue and those rejected while parsing.
struct ParsedBatch {
    valid: Vec<NewInvitation>,
    /// Original one-based row number of each entry in `valid`.
    positions: Vec<usize>,
    rejected: Vec<BulkInvitationFailure>,
}

impl ParsedBatch {
    fn from_rows(rows: Vec<CreateInvitationRequest>) -> Self {
        let mut batch = Self {
            valid: Vec::with_capacity(rows.len()),
            positions: Vec::with_capacity(rows.len()),
            rejected: Vec::new(),
        };

        for (index, row) in rows.into_iter().enumerate() {
            let email = row.email.clone();
            match new_invitation(row) {
                Ok(input) => {
                    batch.valid.push(input);
                    batch.positions.push(index + 1);
                }
                Err(error) => batch.rejected.push(BulkInvitationFailure {
                    row: index + 1,
                    email,
                    reason: parse_reason(error),
                }),
            }
        }

        batch
    }
}

fn parse_reason(error: AppError) -> String {
    match error {
        AppError::Validation(message) => message,
        other => other.to_string(),
    }
}

/// Maps service row numbers back onto the submitted batch and folds in parse failures.
fn merge_report(
    mut report: BulkInvitationReport,
    positions: &[usize],
    rejected: Vec<BulkInvitationFailure>,
) -> BulkInvitationReport {
    for failure in &mut report.failed {
        if let Some(original) = failure
            .row
            .checked_sub(1)
            .and_then(|index| positions.get(index))
        {
            failure.row = *original;
        }
    }

    report.failed.extend(rejected);
    report.failed.sort_by_key(|failure| failure.row);
    report
}
