use feedesk_domain::EffectiveUser;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Health response payload.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/health-response.ts"
)]
pub struct HealthResponse {
    pub status: &'static str,
    pub database: &'static str,
}

/// Generic message response.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/generic-message-response.ts"
)]
pub struct GenericMessageResponse {
    pub message: String,
}

/// One identity as seen by the gate.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/session-view-response.ts"
)]
pub struct SessionViewResponse {
    pub user_id: String,
    pub name: String,
    pub email: String,
    pub role: String,
    pub department_id: Option<String>,
    pub permissions: Vec<String>,
    /// Global assignment present.
    pub all_departments: bool,
    pub departments: Vec<String>,
    /// Permission data failed to load; only safe views are open.
    pub permissions_degraded: bool,
}

/// API representation of the signed-in session.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/session-user-response.ts"
)]
pub struct SessionUserResponse {
    #[serde(flatten)]
    pub user: SessionViewResponse,
    /// View the admin is currently impersonating.
    pub impersonating: Option<SessionViewResponse>,
}

/// Query for `GET /api/access/check`.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/access-check-query.ts"
)]
pub struct AccessCheckQuery {
    pub capability: String,
    pub department: Option<String>,
}

/// Gate decision for one capability.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/access-check-response.ts"
)]
pub struct AccessCheckResponse {
    pub allowed: bool,
}

impl From<&EffectiveUser> for SessionViewResponse {
    fn from(user: &EffectiveUser) -> Self {
        Self {
            user_id: user.user_id().to_string(),
            name: user.identity().display_name().to_owned(),
            email: user.identity().email().to_owned(),
            role: user.role().as_str().to_owned(),
            department_id: user.department_id().map(ToString::to_string),
            permissions: user
                .permissions()
                .iter()
                .map(|capability| capability.as_str().to_owned())
                .collect(),
            all_departments: user.department_grants().is_global(),
            departments: user
                .department_grants()
                .departments()
                .iter()
                .map(ToString::to_string)
                .collect(),
            permissions_degraded: user.permissions_degraded(),
        }
    }
}

impl From<&EffectiveUser> for SessionUserResponse {
    fn from(user: &EffectiveUser) -> Self {
        Self {
            user: SessionViewResponse::from(user),
            impersonating: user.impersonating().map(SessionViewResponse::from),
        }
    }
}
