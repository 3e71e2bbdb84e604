//! Privileged account and role administration.
//!
//! Every mutation re-checks the gate against the actor's session view and
//! appends an audit event. Sessions of affected users pick the change up on
//! their next refresh.


use std::str::FromStr;
use std::sync::Arc;

use uuid::Uuid;

use feedesk_core::{AccountError, AppError, AppResult};
use feedesk_domain::{
    AccessContext, AuditAction, Capability, DepartmentId, EffectiveUser, Role, UserId,
};

use crate::scope::sees_department;
use crate::{
    AuditEvent, AuditRepository, IdentityRepository, ProfileRecord, ProfileRepository,
    SecurityAdminRepository, UserRoleRecord,
};

/// Application service for privileged user administration.
#[derive(Clone)]
pub struct UserAdminService {
    profile_repository: Arc<dyn ProfileRepository>,
    identity_repository: Arc<dyn IdentityRepository>,
    security_repository: Arc<dyn SecurityAdminRepository>,
    audit_repository: Arc<dyn AuditRepository>,
}

impl UserAdminService {
    /// Creates a new service from required dependencies.
    #[must_use]
    pub fn new(
        profile_repository: Arc<dyn ProfileRepository>,
        identity_repository: Arc<dyn IdentityRepository>,
        security_repository: Arc<dyn SecurityAdminRepository>,
        audit_repository: Arc<dyn AuditRepository>,
    ) -> Self {
        Self {
            profile_repository,
            identity_repository,
            security_repository,
            audit_repository,
        }
    }

    /// Lists the profiles the actor may manage.
    pub async fn list_users(&self, actor: &EffectiveUser) -> AppResult<Vec<ProfileRecord>> {
        actor.require(Capability::ManageUsers, &AccessContext::unscoped())?;

        let mut profiles = self.profile_repository.list_profiles().await?;
        profiles.retain(|profile| sees_department(actor, profile.department_id.as_ref()));
        Ok(profiles)
    }

    /// Changes a user's primary role.
    pub async fn change_role(
        &self,
        actor: &EffectiveUser,
        user_id: UserId,
        role: Role,
    ) -> AppResult<()> {
        let target = self
            .load_target(actor, user_id, Capability::EditRoles)
            .await?;
        require_elevation(actor, role)?;

        self.profile_repository
            .update_role(user_id, role, actor.user_id())
            .await?;

        self.append(
            actor,
            AuditAction::UserRoleChanged,
            "profile",
            user_id.to_string(),
            Some(format!("role changed from '{}' to '{role}'", target.role)),
        )
        .await
    }

    /// Activates or deactivates a user.
    pub async fn set_active(
        &self,
        actor: &EffectiveUser,
        user_id: UserId,
        is_active: bool,
    ) -> AppResult<()> {
        self.load_target(actor, user_id, Capability::ManageUsers)
            .await?;

        self.profile_repository
            .set_active(user_id, is_active)
            .await?;

        let action = if is_active {
            AuditAction::UserActivated
        } else {
            AuditAction::UserDeactivated
        };
        self.append(actor, action, "profile", user_id.to_string(), None)
            .await
    }

    /// Removes a user's identity. The profile and role assignments go with
    /// it in the same delete.
    pub async fn remove_user(&self, actor: &EffectiveUser, user_id: UserId) -> AppResult<()> {
        let target = self
            .load_target(actor, user_id, Capability::RemoveUsers)
            .await?;

        self.identity_repository.delete_identity(user_id).await?;

        tracing::info!(subject = %actor.user_id(), target = %user_id, "user removed");
        self.append(
            actor,
            AuditAction::UserRemoved,
            "profile",
            user_id.to_string(),
            Some(target.email),
        )
        .await
    }

    /// Assigns a role to a user, scoped to `department` or global.
    pub async fn assign_role(
        &self,
        actor: &EffectiveUser,
        user_id: UserId,
        role_id: Uuid,
        department: Option<DepartmentId>,
    ) -> AppResult<UserRoleRecord> {
        require_scope(actor, Capability::EditRoles, department.as_ref())?;

        self.profile_repository
            .find_profile(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("user '{user_id}' not found")))?;

        let role = self
            .security_repository
            .find_role(role_id)
            .await?
            .filter(|role| role.is_active)
            .ok_or_else(|| AppError::NotFound(format!("role '{role_id}' not found")))?;
        if let Ok(named) = Role::from_str(&role.name) {
            require_elevation(actor, named)?;
        }

        let assignment = self
            .security_repository
            .assign_role(user_id, role_id, department.as_ref(), actor.user_id())
            .await?;

        self.append(
            actor,
            AuditAction::RoleAssigned,
            "user_role",
            assignment.id.to_string(),
            Some(format!(
                "assigned role '{}' to '{user_id}' in {}",
                role.name,
                scope_label(department.as_ref())
            )),
        )
        .await?;

        Ok(assignment)
    }

    /// Deactivates a role assignment.
    pub async fn revoke_assignment(
        &self,
        actor: &EffectiveUser,
        assignment_id: Uuid,
    ) -> AppResult<()> {
        let assignment = self
            .security_repository
            .find_assignment(assignment_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("role assignment '{assignment_id}' not found"))
            })?;
        require_scope(
            actor,
            Capability::EditRoles,
            assignment.department_id.as_ref(),
        )?;

        if !self
            .security_repository
            .deactivate_assignment(assignment_id)
            .await?
        {
            return Err(AppError::Conflict(format!(
                "role assignment '{assignment_id}' is already inactive"
            )));
        }

        self.append(
            actor,
            AuditAction::RoleUnassigned,
            "user_role",
            assignment_id.to_string(),
            Some(format!("revoked from '{}'", assignment.user_id)),
        )
        .await
    }

    /// Attaches a permission to a role. Returns whether it was newly attached.
    pub async fn grant_permission(
        &self,
        actor: &EffectiveUser,
        role_id: Uuid,
        permission_id: Uuid,
    ) -> AppResult<bool> {
        let (role_name, permission_name) = self
            .load_role_permission(actor, role_id, permission_id)
            .await?;

        let changed = self
            .security_repository
            .grant_permission(role_id, permission_id)
            .await?;
        if changed {
            self.append(
                actor,
                AuditAction::PermissionGranted,
                "role_permission",
                format!("{role_id}:{permission_id}"),
                Some(format!("granted '{permission_name}' to role '{role_name}'")),
            )
            .await?;
        }

        Ok(changed)
    }

    /// Detaches a permission from a role. Returns whether it was attached.
    pub async fn revoke_permission(
        &self,
        actor: &EffectiveUser,
        role_id: Uuid,
        permission_id: Uuid,
    ) -> AppResult<bool> {
        let (role_name, permission_name) = self
            .load_role_permission(actor, role_id, permission_id)
            .await?;

        let changed = self
            .security_repository
            .revoke_permission(role_id, permission_id)
            .await?;
        if changed {
            self.append(
                actor,
                AuditAction::PermissionRevoked,
                "role_permission",
                format!("{role_id}:{permission_id}"),
                Some(format!(
                    "revoked '{permission_name}' from role '{role_name}'"
                )),
            )
            .await?;
        }

        Ok(changed)
    }

    /// Loads a target profile after the self, capability and elevation checks.
    async fn load_target(
        &self,
        actor: &EffectiveUser,
        user_id: UserId,
        capability: Capability,
    ) -> AppResult<ProfileRecord> {
        if user_id == actor.user_id() {
            return Err(AccountError::InvalidTarget(
                "you cannot change your own account".to_owned(),
            )
            .into());
        }

        let target = self
            .profile_repository
            .find_profile(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("user '{user_id}' not found")))?;

        let context = target
            .department_id
            .clone()
            .map_or_else(AccessContext::unscoped, AccessContext::department);
        actor.require(capability, &context)?;
        require_elevation(actor, target.role)?;

        if !sees_department(actor, target.department_id.as_ref()) {
            return Err(AccountError::PermissionDenied(format!(
                "user '{user_id}' is outside your departments"
            ))
            .into());
        }

        Ok(target)
    }

    async fn load_role_permission(
        &self,
        actor: &EffectiveUser,
        role_id: Uuid,
        permission_id: Uuid,
    ) -> AppResult<(String, String)> {
        actor.require(Capability::EditPermissions, &AccessContext::unscoped())?;

        let role = self
            .security_repository
            .find_role(role_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("role '{role_id}' not found")))?;
        let permission = self
            .security_repository
            .find_permission(permission_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("permission '{permission_id}' not found"))
            })?;

        Ok((role.name, permission.name))
    }

    async fn append(
        &self,
        actor: &EffectiveUser,
        action: AuditAction,
        resource_type: &str,
        resource_id: String,
        detail: Option<String>,
    ) -> AppResult<()> {
        self.audit_repository
            .append_event(AuditEvent {
                subject: actor.user_id().to_string(),
                action,
                resource_type: resource_type.to_owned(),
                resource_id,
                detail,
            })
            .await
    }
}

/// Only admins and principals may hand out or touch roles that bypass checks.
fn require_elevation(actor: &EffectiveUser, role: Role) -> AppResult<()> {
    if role.short_circuits_access() && !actor.acting_as().role().short_circuits_access() {
        return Err(AccountError::PermissionDenied(format!(
            "only an admin or principal can manage the '{role}' role"
        ))
        .into());
    }

    Ok(())
}

/// Checks `capability` in the department context; global scope needs a
/// college-wide actor.
fn require_scope(
    actor: &EffectiveUser,
    capability: Capability,
    department: Option<&DepartmentId>,
) -> AppResult<()> {
    match department {
        Some(department) => {
            actor.require(capability, &AccessContext::department(department.clone()))?;
        }
        None => {
            actor.require(capability, &AccessContext::unscoped())?;
            if !sees_department(actor, None) {
                return Err(AccountError::PermissionDenied(
                    "only college-wide staff can manage global role assignments".to_owned(),
                )
                .into());
            }
        }
    }

    Ok(())
}

fn scope_label(department: Option<&DepartmentId>) -> String {
    department.map_or_else(
        || "all departments".to_owned(),
        |department| format!("department {department}"),
    )
}
