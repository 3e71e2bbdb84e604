//! Effective permissions of a session and the access gate evaluated on them.

use std::collections::BTreeSet;
use std::str::FromStr;

use feedesk_core::{AccountError, UserIdentity};
use serde::{Deserialize, Serialize};

use crate::{Capability, DepartmentId, Role, UserId};

/// Departments an identity holds active role assignments in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepartmentGrants {
    global: bool,
    departments: BTreeSet<DepartmentId>,
}

impl DepartmentGrants {
    /// Builds grants from the department scope of each active assignment;
    /// `None` marks a global assignment.
    pub fn from_scopes<'a>(scopes: impl IntoIterator<Item = Option<&'a DepartmentId>>) -> Self {
        let mut grants = Self::default();
        for scope in scopes {
            match scope {
                Some(department) => {
                    grants.departments.insert(department.clone());
                }
                None => grants.global = true,
            }
        }

        grants
    }

    /// Returns whether at least one assignment is global.
    #[must_use]
    pub fn is_global(&self) -> bool {
        self.global
    }

    /// Returns the department-scoped assignments.
    #[must_use]
    pub fn departments(&self) -> &BTreeSet<DepartmentId> {
        &self.departments
    }

    /// Returns whether the grants reach the given department.
    #[must_use]
    pub fn covers(&self, department: &DepartmentId) -> bool {
        self.global || self.departments.contains(department)
    }
}

/// Optional scope of a capability check.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccessContext {
    /// Department the protected resource belongs to.
    pub department_id: Option<DepartmentId>,
}

impl AccessContext {
    /// A check without department scope.
    #[must_use]
    pub fn unscoped() -> Self {
        Self::default()
    }

    /// A check scoped to one department.
    #[must_use]
    pub fn department(department_id: DepartmentId) -> Self {
        Self {
            department_id: Some(department_id),
        }
    }
}

/// Resolved per-session view of an identity.
///
/// While `impersonating` is set, ordinary checks run against the impersonated
/// view and only `exit_impersonation` is answered for the outer identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectiveUser {
    user_id: UserId,
    identity: UserIdentity,
    role: Role,
    department_id: Option<DepartmentId>,
    permissions: BTreeSet<Capability>,
    department_grants: DepartmentGrants,
    permissions_degraded: bool,
    impersonating: Option<Box<EffectiveUser>>,
}

impl EffectiveUser {
    /// Creates the effective view of a single identity.
    #[must_use]
    pub fn new(
        user_id: UserId,
        identity: UserIdentity,
        role: Role,
        department_id: Option<DepartmentId>,
        permissions: BTreeSet<Capability>,
        department_grants: DepartmentGrants,
    ) -> Self {
        Self {
            user_id,
            identity,
            role,
            department_id,
            permissions,
            department_grants,
            permissions_degraded: false,
            impersonating: None,
        }
    }

    /// Creates a view whose permission data could not be loaded.
    #[must_use]
    pub fn degraded(
        user_id: UserId,
        identity: UserIdentity,
        role: Role,
        department_id: Option<DepartmentId>,
    ) -> Self {
        Self {
            permissions_degraded: true,
            ..Self::new(
                user_id,
                identity,
                role,
                department_id,
                BTreeSet::new(),
                DepartmentGrants::default(),
            )
        }
    }

    /// Returns the identity id.
    #[must_use]
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    /// Returns the session identity.
    #[must_use]
    pub fn identity(&self) -> &UserIdentity {
        &self.identity
    }

    /// Returns the primary role.
    #[must_use]
    pub fn role(&self) -> Role {
        self.role
    }

    /// Returns the profile department.
    #[must_use]
    pub fn department_id(&self) -> Option<&DepartmentId> {
        self.department_id.as_ref()
    }

    /// Returns the union of permissions over all active assignments.
    #[must_use]
    pub fn permissions(&self) -> &BTreeSet<Capability> {
        &self.permissions
    }

    /// Returns department reach of the active assignments.
    #[must_use]
    pub fn department_grants(&self) -> &DepartmentGrants {
        &self.department_grants
    }

    /// Returns whether permission data failed to load.
    #[must_use]
    pub fn permissions_degraded(&self) -> bool {
        self.permissions_degraded
    }

    /// Returns the impersonated view, if any.
    #[must_use]
    pub fn impersonating(&self) -> Option<&EffectiveUser> {
        self.impersonating.as_deref()
    }

    /// Returns the view ordinary checks are evaluated against.
    #[must_use]
    pub fn acting_as(&self) -> &EffectiveUser {
        self.impersonating.as_deref().unwrap_or(self)
    }

    pub(crate) fn set_impersonating(&mut self, target: Option<EffectiveUser>) {
        self.impersonating = target.map(Box::new);
    }

    /// Evaluates a typed capability.
    #[must_use]
    pub fn allows(&self, capability: Capability, context: &AccessContext) -> bool {
        if capability == Capability::ExitImpersonation {
            return self.impersonating.is_some();
        }

        self.acting_as().allows_directly(capability, context)
    }

    /// Like [`EffectiveUser::allows`], but reports a denial as `PermissionDenied`.
    pub fn require(
        &self,
        capability: Capability,
        context: &AccessContext,
    ) -> Result<(), AccountError> {
        if self.allows(capability, context) {
            return Ok(());
        }

        let scope = context
            .department_id
            .as_ref()
            .map(|department| format!(" in department '{department}'"))
            .unwrap_or_default();

        Err(AccountError::PermissionDenied(format!(
            "'{}' is missing capability '{capability}'{scope}",
            self.acting_as().identity().email()
        )))
    }

    /// Evaluates a capability against this view only, ignoring impersonation.
    pub(crate) fn allows_directly(&self, capability: Capability, context: &AccessContext) -> bool {
        if capability == Capability::ExitImpersonation {
            return false;
        }

        if self.permissions_degraded {
            return capability.is_safe_when_degraded();
        }

        if self.role.short_circuits_access() {
            return true;
        }

        if !self.permissions.contains(&capability) {
            return false;
        }

        context
            .department_id
            .as_ref()
            .is_none_or(|department| self.department_grants.covers(department))
    }
}

/// The access gate: decides whether `user` may use `capability`.
///
/// Unknown capability names are never granted.
#[must_use]
pub fn can_access(user: &EffectiveUser, capability: &str, context: &AccessContext) -> bool {
    Capability::from_str(capability)
        .map(|capability| user.allows(capability, context))
        .unwrap_or(false)
}
