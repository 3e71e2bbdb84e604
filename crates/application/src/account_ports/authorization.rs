use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use feedesk_core::AppResult;
use feedesk_domain::{DepartmentId, UserId};

/// Assignment of a role to a user, optionally scoped to a department.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRoleRecord {
    /// Assignment identifier.
    pub id: Uuid,
    /// Assigned user.
    pub user_id: UserId,
    /// Assigned role.
    pub role_id: Uuid,
    /// `None` is a global grant.
    pub department_id: Option<DepartmentId>,
    /// Revoked assignments stay as history with `is_active = false`.
    pub is_active: bool,
    /// Assigning admin.
    pub assigned_by: Option<UserId>,
    /// Assignment instant.
    pub assigned_at: DateTime<Utc>,
}

/// Role definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleRecord {
    /// Role identifier.
    pub id: Uuid,
    /// Unique role name.
    pub name: String,
    /// Optional description.
    pub description: Option<String>,
    /// Inactive roles grant nothing.
    pub is_active: bool,
}

/// Junction row between roles and permissions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RolePermissionRecord {
    /// Role identifier.
    pub role_id: Uuid,
    /// Permission identifier.
    pub permission_id: Uuid,
}

/// Permission definition; `name` is a capability storage value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermissionRecord {
    /// Permission identifier.
    pub id: Uuid,
    /// Capability name.
    pub name: String,
    /// Resource family, e.g. `fees`.
    pub resource_type: String,
    /// Action on the resource, e.g. `update`.
    pub action_type: String,
    /// Optional description.
    pub description: Option<String>,
}

/// Repository port for the loads the permission resolver performs.
#[async_trait]
pub trait AuthorizationRepository: Send + Sync {
    /// Lists active role assignments of a user.
    async fn list_active_user_roles(&self, user_id: UserId) -> AppResult<Vec<UserRoleRecord>>;

    /// Loads roles by id.
    async fn find_roles(&self, role_ids: &[Uuid]) -> AppResult<Vec<RoleRecord>>;

    /// Loads junction rows for the given roles.
    async fn list_role_permissions(&self, role_ids: &[Uuid])
    -> AppResult<Vec<RolePermissionRecord>>;

    /// Loads permissions by id.
    async fn find_permissions(&self, permission_ids: &[Uuid]) -> AppResult<Vec<PermissionRecord>>;
}

/// Repository port for role assignment and role permission administration.
#[async_trait]
pub trait SecurityAdminRepository: Send + Sync {
    /// Finds a role by id.
    async fn find_role(&self, role_id: Uuid) -> AppResult<Option<RoleRecord>>;

    /// Finds a permission by id.
    async fn find_permission(&self, permission_id: Uuid) -> AppResult<Option<PermissionRecord>>;

    /// Finds an assignment by id.
    async fn find_assignment(&self, assignment_id: Uuid) -> AppResult<Option<UserRoleRecord>>;

    /// Creates an active assignment.
    async fn assign_role(
        &self,
        user_id: UserId,
        role_id: Uuid,
        department_id: Option<&DepartmentId>,
        assigned_by: UserId,
    ) -> AppResult<UserRoleRecord>;

    /// Deactivates one assignment. Returns whether a row changed.
    async fn deactivate_assignment(&self, assignment_id: Uuid) -> AppResult<bool>;

    /// Attaches a permission to a role. Returns whether the pair was new.
    async fn grant_permission(&self, role_id: Uuid, permission_id: Uuid) -> AppResult<bool>;

    /// Detaches a permission from a role. Returns whether the pair existed.
    async fn revoke_permission(&self, role_id: Uuid, permission_id: Uuid) -> AppResult<bool>;
}
