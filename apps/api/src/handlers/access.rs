use axum::Json;
use axum::extract::{Extension, Query};
use feedesk_domain::{AccessContext, DepartmentId, EffectiveUser, can_access};

use crate::dto::{AccessCheckQuery, AccessCheckResponse};
use crate::error::ApiResult;

/// GET /api/access/check - Gate decision the SPA uses to pick between a view
/// and the access-denied state.
pub async fn access_check_handler(
    Extension(user): Extension<EffectiveUser>,
    Query(query): Query<AccessCheckQuery>,
) -> ApiResult<Json<AccessCheckResponse>> {
    let context = match query.department.as_deref().map(str::trim) {
        Some(department) if !department.is_empty() => {
            AccessContext::department(DepartmentId::new(department)?)
        }
        _ => AccessContext::unscoped(),
    };

    Ok(Json(AccessCheckResponse {
        allowed: can_access(&user, &query.capability, &context),
    }))
}
