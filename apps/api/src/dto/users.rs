use feedesk_application::{ProfileRecord, UserRoleRecord};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// API representation of a user profile.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/user-response.ts"
)]
pub struct UserResponse {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: String,
    pub department_id: Option<String>,
    pub roll_number: Option<String>,
    pub employee_id: Option<String>,
    pub is_active: bool,
    pub profile_completed: bool,
}

/// Incoming payload for changing a user's primary role.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/change-role-request.ts"
)]
pub struct ChangeRoleRequest {
    pub role: String,
}

/// Incoming payload for activating or deactivating a user.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/set-active-request.ts"
)]
pub struct SetActiveRequest {
    pub is_active: bool,
}

/// Incoming payload for a role assignment.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/assign-role-request.ts"
)]
pub struct AssignRoleRequest {
    pub user_id: String,
    pub role_id: String,
    /// Omit for a college-wide assignment.
    pub department_id: Option<String>,
}

/// API representation of a role assignment.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/role-assignment-response.ts"
)]
pub struct RoleAssignmentResponse {
    pub id: String,
    pub user_id: String,
    pub role_id: String,
    pub department_id: Option<String>,
    pub is_active: bool,
    pub assigned_by: Option<String>,
    pub assigned_at: String,
}

/// Whether a permission grant or revoke changed anything.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/permission-change-response.ts"
)]
pub struct PermissionChangeResponse {
    pub changed: bool,
}

impl From<ProfileRecord> for UserResponse {
    fn from(profile: ProfileRecord) -> Self {
        Self {
            id: profile.id.to_string(),
            name: profile.name,
            email: profile.email,
            role: profile.role.as_str().to_owned(),
            department_id: profile.department_id.map(String::from),
            roll_number: profile.roll_number,
            employee_id: profile.employee_id,
            is_active: profile.is_active,
            profile_completed: profile.profile_completed,
        }
    }
}

impl From<UserRoleRecord> for RoleAssignmentResponse {
    fn from(assignment: UserRoleRecord) -> Self {
        Self {
            id: assignment.id.to_string(),
            user_id: assignment.user_id.to_string(),
            role_id: assignment.role_id.to_string(),
            department_id: assignment.department_id.map(String::from),
            is_active: assignment.is_active,
            assigned_by: assignment.assigned_by.map(|user_id| user_id.to_string()),
            assigned_at: assignment.assigned_at.to_rfc3339(),
        }
    }
}
