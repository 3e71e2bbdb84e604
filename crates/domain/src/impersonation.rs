//! Impersonation state machine: `Normal` and `Impersonating(original, target)`.

use feedesk_core::AccountError;

use crate::{AccessContext, Capability, EffectiveUser};

/// Borrowed view of the impersonation state of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImpersonationState<'a> {
    /// The session acts as its own identity.
    Normal(&'a EffectiveUser),
    /// An admin views the application as `target`.
    Impersonating {
        /// The signed-in identity.
        original: &'a EffectiveUser,
        /// The identity being viewed as.
        target: &'a EffectiveUser,
    },
}

impl EffectiveUser {
    /// Returns the current impersonation state.
    #[must_use]
    pub fn impersonation_state(&self) -> ImpersonationState<'_> {
        match self.impersonating() {
            Some(target) => ImpersonationState::Impersonating {
                original: self,
                target,
            },
            None => ImpersonationState::Normal(self),
        }
    }

    /// Starts viewing the application as `target`.
    ///
    /// Requires `impersonate_users` on the signed-in identity. Nested and
    /// self impersonation are rejected.
    pub fn start_impersonation(mut self, target: EffectiveUser) -> Result<Self, AccountError> {
        if self.impersonating().is_some() {
            return Err(AccountError::AlreadyImpersonating);
        }

        if !self.allows_directly(Capability::ImpersonateUsers, &AccessContext::unscoped()) {
            return Err(AccountError::PermissionDenied(format!(
                "'{}' may not view the application as another user",
                self.identity().email()
            )));
        }

        if target.user_id() == self.user_id() {
            return Err(AccountError::InvalidTarget(
                "cannot impersonate your own account".to_owned(),
            ));
        }

        let mut target = target;
        target.set_impersonating(None);
        self.set_impersonating(Some(target));
        Ok(self)
    }

    /// Leaves an impersonated view. A session in `Normal` state is returned unchanged.
    #[must_use]
    pub fn end_impersonation(mut self) -> Self {
        self.set_impersonating(None);
        self
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use feedesk_core::{AccountError, UserIdentity};

    use super::ImpersonationState;
    use crate::{
        AccessContext, Capability, DepartmentGrants, EffectiveUser, Role, UserId, can_access,
    };

    fn user(role: Role, permissions: &[Capability]) -> EffectiveUser {
        let user_id = UserId::new();
        EffectiveUser::new(
            user_id,
            UserIdentity::new(user_id.to_string(), role.as_str(), format!("{role}@x.edu")),
            role,
            None,
            permissions.iter().copied().collect::<BTreeSet<_>>(),
            DepartmentGrants::from_scopes([None]),
        )
    }

    #[test]
    fn admin_can_enter_and_exit_impersonation() {
        let admin = user(Role::Admin, &[]);
        let student = user(Role::Student, &[Capability::ViewOwnProfile]);

        let session = admin
            .clone()
            .start_impersonation(student.clone())
            .unwrap_or_else(|_| panic!("expected impersonation"));

        assert!(matches!(
            session.impersonation_state(),
            ImpersonationState::Impersonating { target, .. }
                if target.user_id() == student.user_id()
        ));
        assert!(!can_access(&session, "manage_users", &AccessContext::unscoped()));
        assert!(can_access(&session, "view_own_profile", &AccessContext::unscoped()));

        let restored = session.end_impersonation();
        assert_eq!(restored, admin);
        assert!(can_access(&restored, "manage_users", &AccessContext::unscoped()));
    }

    #[test]
    fn exit_is_allowed_even_when_target_has_no_permissions() {
        let admin = user(Role::Admin, &[]);
        let target = EffectiveUser::degraded(
            UserId::new(),
            UserIdentity::new("target", "Target", "target@x.edu"),
            Role::Student,
            None,
        );

        let session = admin
            .start_impersonation(target)
            .unwrap_or_else(|_| panic!("expected impersonation"));
        assert!(can_access(&session, "exit_impersonation", &AccessContext::unscoped()));
    }

    #[test]
    fn non_admin_cannot_impersonate() {
        let faculty = user(Role::Faculty, &[Capability::ViewFeeRecords]);
        let student = user(Role::Student, &[]);

        let result = faculty.start_impersonation(student);
        assert!(matches!(result, Err(AccountError::PermissionDenied(_))));
    }

    #[test]
    fn faculty_with_explicit_grant_can_impersonate() {
        let faculty = user(Role::Faculty, &[Capability::ImpersonateUsers]);
        let student = user(Role::Student, &[]);

        assert!(faculty.start_impersonation(student).is_ok());
    }

    #[test]
    fn self_impersonation_is_rejected() {
        let admin = user(Role::Admin, &[]);
        let result = admin.clone().start_impersonation(admin);
        assert!(matches!(result, Err(AccountError::InvalidTarget(_))));
    }

    #[test]
    fn nested_impersonation_is_rejected() {
        let admin = user(Role::Admin, &[]);
        let session = admin
            .start_impersonation(user(Role::Principal, &[]))
            .unwrap_or_else(|_| panic!("expected impersonation"));

        let result = session.start_impersonation(user(Role::Student, &[]));
        assert_eq!(result.err(), Some(AccountError::AlreadyImpersonating));
    }

    #[test]
    fn ending_normal_session_is_a_no_op() {
        let admin = user(Role::Admin, &[]);
        assert_eq!(admin.clone().end_impersonation(), admin);
    }
}
