//! Role and permission resolution.
//!
//! Builds the [`EffectiveUser`] a session carries from the profile and the
//! four permission loads. A failing permission load degrades the result
//! instead of failing sign-in; the access gate then denies everything
//! outside the safe-when-degraded list.


use std::collections::BTreeSet;
use std::str::FromStr;
use std::sync::Arc;

use uuid::Uuid;

use feedesk_core::{AppError, AppResult, UserIdentity};
use feedesk_domain::{Capability, DepartmentGrants, EffectiveUser, UserId};

use crate::{AuthorizationRepository, ProfileRecord, ProfileRepository};

/// Application service resolving effective permissions.
#[derive(Clone)]
pub struct AuthorizationService {
    repository: Arc<dyn AuthorizationRepository>,
    profile_repository: Arc<dyn ProfileRepository>,
}

struct LoadFailure {
    step: &'static str,
    error: AppError,
}

impl AuthorizationService {
    /// Creates a new authorization service.
    #[must_use]
    pub fn new(
        repository: Arc<dyn AuthorizationRepository>,
        profile_repository: Arc<dyn ProfileRepository>,
    ) -> Self {
        Self {
            repository,
            profile_repository,
        }
    }

    /// Resolves the effective view of one identity.
    ///
    /// A missing profile is an error. Failures while loading assignments,
    /// roles or permissions yield a degraded view with no permissions.
    pub async fn resolve(&self, user_id: UserId) -> AppResult<EffectiveUser> {
        let profile = self
            .profile_repository
            .find_profile(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("profile for user '{user_id}' not found")))?;

        Ok(self.resolve_profile(profile).await)
    }

    /// Resolves the effective view of an already loaded profile.
    pub async fn resolve_profile(&self, profile: ProfileRecord) -> EffectiveUser {
        let identity = UserIdentity::new(profile.id.to_string(), profile.name, profile.email);

        match self.load_grants(profile.id).await {
            Ok((permissions, department_grants)) => EffectiveUser::new(
                profile.id,
                identity,
                profile.role,
                profile.department_id,
                permissions,
                department_grants,
            ),
            Err(LoadFailure { step, error }) => {
                tracing::warn!(
                    subject = %profile.id,
                    step,
                    %error,
                    "permission resolution degraded"
                );
                EffectiveUser::degraded(profile.id, identity, profile.role, profile.department_id)
            }
        }
    }

    async fn load_grants(
        &self,
        user_id: UserId,
    ) -> Result<(BTreeSet<Capability>, DepartmentGrants), LoadFailure> {
        let assignments = self
            .repository
            .list_active_user_roles(user_id)
            .await
            .map_err(|error| LoadFailure {
                step: "user_roles",
                error,
            })?;

        let role_ids = unique(assignments.iter().filter(|a| a.is_active).map(|a| a.role_id));
        if role_ids.is_empty() {
            return Ok((BTreeSet::new(), DepartmentGrants::default()));
        }

        let roles = self
            .repository
            .find_roles(&role_ids)
            .await
            .map_err(|error| LoadFailure {
                step: "roles",
                error,
            })?;
        let active_role_ids = unique(
            roles
                .iter()
                .filter(|role| role.is_active)
                .map(|role| role.id),
        );

        let department_grants = DepartmentGrants::from_scopes(
            assignments
                .iter()
                .filter(|assignment| {
                    assignment.is_active && active_role_ids.contains(&assignment.role_id)
                })
                .map(|assignment| assignment.department_id.as_ref()),
        );
        if active_role_ids.is_empty() {
            return Ok((BTreeSet::new(), department_grants));
        }

        let junction = self
            .repository
            .list_role_permissions(&active_role_ids)
            .await
            .map_err(|error| LoadFailure {
                step: "role_permissions",
                error,
            })?;
        let permission_ids = unique(
            junction
                .iter()
                .filter(|row| active_role_ids.contains(&row.role_id))
                .map(|row| row.permission_id),
        );
        if permission_ids.is_empty() {
            return Ok((BTreeSet::new(), department_grants));
        }

        let permissions = self
            .repository
            .find_permissions(&permission_ids)
            .await
            .map_err(|error| LoadFailure {
                step: "permissions",
                error,
            })?;

        let capabilities = permissions
            .iter()
            .filter_map(|permission| match Capability::from_str(&permission.name) {
                Ok(capability) => Some(capability),
                Err(_) => {
                    tracing::debug!(permission = %permission.name, "ignoring unknown permission");
                    None
                }
            })
            .collect();

        Ok((capabilities, department_grants))
    }
}

fn unique(ids: impl Iterator<Item = Uuid>) -> Vec<Uuid> {
    ids.collect::<BTreeSet<_>>().into_iter().collect()
}
