use async_trait::async_trait;

use feedesk_core::AppResult;
use feedesk_domain::{DepartmentId, Role, UserId};

/// Profile row linked one-to-one with an identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileRecord {
    /// Same value as the identity id.
    pub id: UserId,
    /// Display name.
    pub name: String,
    /// Canonical email.
    pub email: String,
    /// Primary role.
    pub role: Role,
    /// Department, absent for college-wide staff.
    pub department_id: Option<DepartmentId>,
    /// Student roll number.
    pub roll_number: Option<String>,
    /// Staff employee id.
    pub employee_id: Option<String>,
    /// Inactive accounts cannot sign in.
    pub is_active: bool,
    /// Whether all role-required fields are present.
    pub profile_completed: bool,
}

/// Values written when a profile is created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProfile {
    /// Identity id the profile belongs to.
    pub id: UserId,
    /// Display name.
    pub name: String,
    /// Canonical email.
    pub email: String,
    /// Primary role.
    pub role: Role,
    /// Department.
    pub department_id: Option<DepartmentId>,
    /// Student roll number.
    pub roll_number: Option<String>,
    /// Staff employee id.
    pub employee_id: Option<String>,
}

/// Repository port for profiles.
#[async_trait]
pub trait ProfileRepository: Send + Sync {
    /// Creates a profile marked active and completed, together with the
    /// assignment of the role of the same name (department-scoped unless the
    /// role bypasses permission checks).
    async fn create_profile(&self, profile: NewProfile) -> AppResult<()>;

    /// Finds a profile by identity id.
    async fn find_profile(&self, user_id: UserId) -> AppResult<Option<ProfileRecord>>;

    /// Lists all profiles ordered by name.
    async fn list_profiles(&self) -> AppResult<Vec<ProfileRecord>>;

    /// Changes the primary role and moves the default assignment with it in
    /// one write. Active assignments of the previous role are deactivated and
    /// the new role is assigned with the same scoping as `create_profile`.
    async fn update_role(&self, user_id: UserId, role: Role, changed_by: UserId) -> AppResult<()>;

    /// Toggles activation.
    async fn set_active(&self, user_id: UserId, is_active: bool) -> AppResult<()>;

    /// Deletes a profile. Deleting a missing profile is not an error.
    async fn delete_profile(&self, user_id: UserId) -> AppResult<()>;

    /// Returns whether any active admin profile exists.
    async fn admin_exists(&self) -> AppResult<bool>;
}
