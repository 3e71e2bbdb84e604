//! Sign-in, session restore and the view-as-user state machine.


use std::sync::Arc;

use feedesk_core::{AccountError, AppError, AppResult};
use feedesk_domain::{AuditAction, EffectiveUser, UserId};

use crate::{
    AuditEvent, AuditRepository, AuthorizationService, IdentityRepository, PasswordHasher,
    ProfileRecord, ProfileRepository,
};

const INVALID_CREDENTIALS: &str = "invalid email or password";

/// Application service producing the per-session [`EffectiveUser`].
#[derive(Clone)]
pub struct SessionService {
    identity_repository: Arc<dyn IdentityRepository>,
    profile_repository: Arc<dyn ProfileRepository>,
    password_hasher: Arc<dyn PasswordHasher>,
    authorization_service: AuthorizationService,
    audit_repository: Arc<dyn AuditRepository>,
}

impl SessionService {
    /// Creates a new session service.
    #[must_use]
    pub fn new(
        identity_repository: Arc<dyn IdentityRepository>,
        profile_repository: Arc<dyn ProfileRepository>,
        password_hasher: Arc<dyn PasswordHasher>,
        authorization_service: AuthorizationService,
        audit_repository: Arc<dyn AuditRepository>,
    ) -> Self {
        Self {
            identity_repository,
            profile_repository,
            password_hasher,
            authorization_service,
            audit_repository,
        }
    }

    /// Authenticates with email and password.
    ///
    /// Every failure returns the same `Unauthorized` message so the response
    /// does not reveal whether the email is registered.
    pub async fn sign_in(&self, email: &str, password: &str) -> AppResult<EffectiveUser> {
        let normalized = email.trim().to_lowercase();
        let Some(identity) = self.identity_repository.find_by_email(&normalized).await? else {
            // Keep timing close to the known-email path.
            let _ = self.password_hasher.hash_password(password);
            return Err(AppError::Unauthorized(INVALID_CREDENTIALS.to_owned()));
        };

        if !self
            .password_hasher
            .verify_password(password, &identity.password_hash)?
        {
            tracing::info!(subject = %identity.id, "sign-in rejected: wrong password");
            return Err(AppError::Unauthorized(INVALID_CREDENTIALS.to_owned()));
        }

        let profile = self.active_profile(identity.id).await.map_err(|error| {
            tracing::info!(subject = %identity.id, %error, "sign-in rejected");
            AppError::Unauthorized(INVALID_CREDENTIALS.to_owned())
        })?;

        let user = self.authorization_service.resolve_profile(profile).await;
        tracing::info!(
            subject = %user.user_id(),
            role = %user.role(),
            degraded = user.permissions_degraded(),
            "signed in"
        );

        Ok(user)
    }

    /// Rebuilds the effective view of an identity from stored data.
    pub async fn restore(&self, user_id: UserId) -> AppResult<EffectiveUser> {
        let profile = self.active_profile(user_id).await?;
        Ok(self.authorization_service.resolve_profile(profile).await)
    }

    /// Rebuilds a session view, keeping an active impersonation when both
    /// sides still qualify.
    pub async fn refresh(&self, current: &EffectiveUser) -> AppResult<EffectiveUser> {
        let original = self.restore(current.user_id()).await?;
        let Some(previous_target) = current.impersonating() else {
            return Ok(original);
        };

        let target = match self.restore(previous_target.user_id()).await {
            Ok(target) => target,
            Err(error) => {
                tracing::info!(
                    subject = %original.user_id(),
                    target = %previous_target.user_id(),
                    %error,
                    "impersonation target no longer available, ending view"
                );
                return Ok(original);
            }
        };

        match original.clone().start_impersonation(target) {
            Ok(user) => Ok(user),
            Err(error) => {
                tracing::info!(
                    subject = %original.user_id(),
                    %error,
                    "impersonation no longer permitted, ending view"
                );
                Ok(original)
            }
        }
    }

    /// Starts viewing the application as another active user.
    pub async fn switch_to_user_view(
        &self,
        current: EffectiveUser,
        target_id: UserId,
    ) -> AppResult<EffectiveUser> {
        if current.impersonating().is_some() {
            return Err(AccountError::AlreadyImpersonating.into());
        }

        let target = match self.restore(target_id).await {
            Ok(target) => target,
            Err(AppError::NotFound(_) | AppError::Unauthorized(_)) => {
                return Err(AccountError::InvalidTarget(format!(
                    "user '{target_id}' does not exist or is inactive"
                ))
                .into());
            }
            Err(error) => return Err(error),
        };

        let user = current.start_impersonation(target)?;
        self.audit(&user, AuditAction::ImpersonationStarted, target_id)
            .await;
        tracing::info!(subject = %user.user_id(), target = %target_id, "impersonation started");

        Ok(user)
    }

    /// Leaves an impersonated view. A no-op when not impersonating.
    pub async fn exit_impersonation(&self, current: EffectiveUser) -> EffectiveUser {
        let Some(target_id) = current.impersonating().map(EffectiveUser::user_id) else {
            return current;
        };

        let user = current.end_impersonation();
        self.audit(&user, AuditAction::ImpersonationEnded, target_id)
            .await;
        tracing::info!(subject = %user.user_id(), target = %target_id, "impersonation ended");

        user
    }

    async fn active_profile(&self, user_id: UserId) -> AppResult<ProfileRecord> {
        let profile = self
            .profile_repository
            .find_profile(user_id)
            .await?
            .ok_or_else(|| AppError::Unauthorized("account has no profile".to_owned()))?;

        if !profile.is_active {
            return Err(AppError::Unauthorized(
                "account has been deactivated".to_owned(),
            ));
        }

        Ok(profile)
    }

    async fn audit(&self, actor: &EffectiveUser, action: AuditAction, target_id: UserId) {
        let event = AuditEvent {
            subject: actor.user_id().to_string(),
            action,
            resource_type: "user".to_owned(),
            resource_id: target_id.to_string(),
            detail: None,
        };

        if let Err(error) = self.audit_repository.append_event(event).await {
            tracing::warn!(%error, action = action.as_str(), "failed to append audit event");
        }
    }
}
