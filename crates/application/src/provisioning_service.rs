//! Account provisioning from a validated invitation.
//!
//! The commit section creates the identity, then the profile, then consumes
//! the invitation. It runs on its own task so a caller that goes away cannot
//! stop it half-way, and every failure after the identity exists is undone
//! by deleting what was written.

mod bootstrap;

pub use bootstrap::BootstrapAdminRequest;

#[cfg(test)]
mod tests;

use std::sync::Arc;

use chrono::Utc;

use feedesk_core::{AccountError, AppError, AppResult, NonEmptyString};
use feedesk_domain::{
    AuditAction, DepartmentId, EmailAddress, Invitation, InvitationSnapshot, ProfileIdentifiers,
    Role, UserId, resolve_profile_identifiers, validate_password,
};

use crate::{
    AuditEvent, AuditRepository, IdentityRepository, InvitationService, NewProfile,
    PasswordHasher, ProfileRepository,
};

/// Credentials submitted on the signup form.
#[derive(Clone)]
pub struct SignupCredentials {
    /// Must match the invited email.
    pub email: String,
    /// Plaintext password.
    pub password: String,
}

impl std::fmt::Debug for SignupCredentials {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("SignupCredentials")
            .field("email", &self.email)
            .field("password", &"***")
            .finish()
    }
}

/// Profile fields submitted on the signup form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SignupProfile {
    /// Display name.
    pub name: String,
    /// Roll number, when not pre-assigned.
    pub roll_number: Option<String>,
    /// Employee id, when not pre-assigned.
    pub employee_id: Option<String>,
}

/// Result of a successful provisioning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisionedAccount {
    /// New identity id.
    pub identity_id: UserId,
    /// Role written to the profile.
    pub role: Role,
    /// Department written to the profile; `None` for the bootstrap admin.
    pub department_id: Option<DepartmentId>,
}

/// Application service creating accounts.
#[derive(Clone)]
pub struct ProvisioningService {
    invitation_service: InvitationService,
    identity_repository: Arc<dyn IdentityRepository>,
    profile_repository: Arc<dyn ProfileRepository>,
    password_hasher: Arc<dyn PasswordHasher>,
    audit_repository: Arc<dyn AuditRepository>,
    bootstrap_token: Option<String>,
}

/// Everything the commit task needs, owned.
struct CommitPlan {
    invitation: Invitation,
    email: EmailAddress,
    password_hash: String,
    name: String,
    identifiers: ProfileIdentifiers,
}

impl ProvisioningService {
    /// Creates a new provisioning service.
    #[must_use]
    pub fn new(
        invitation_service: InvitationService,
        identity_repository: Arc<dyn IdentityRepository>,
        profile_repository: Arc<dyn ProfileRepository>,
        password_hasher: Arc<dyn PasswordHasher>,
        audit_repository: Arc<dyn AuditRepository>,
    ) -> Self {
        Self {
            invitation_service,
            identity_repository,
            profile_repository,
            password_hasher,
            audit_repository,
            bootstrap_token: None,
        }
    }

    /// Enables [`Self::bootstrap_admin`] with the given shared secret.
    #[must_use]
    pub fn with_bootstrap_token(mut self, token: impl Into<String>) -> Self {
        self.bootstrap_token = Some(token.into());
        self
    }

    /// Creates an account from a previously validated invitation.
    ///
    /// The invitation is read again by id right before the commit. Role,
    /// department and pre-assigned identifiers come from that fresh row.
    pub async fn provision(
        &self,
        snapshot: &InvitationSnapshot,
        credentials: SignupCredentials,
        profile: SignupProfile,
    ) -> AppResult<ProvisionedAccount> {
        let invitation = self
            .invitation_service
            .revalidate(snapshot.id, Utc::now())
            .await?;

        let email = EmailAddress::new(&credentials.email)?;
        if email != invitation.email {
            return Err(AppError::Validation(
                "email must match the address the invitation was sent to".to_owned(),
            ));
        }

        let name = NonEmptyString::new(profile.name)?;
        validate_password(&credentials.password)?;

        let identifiers = resolve_profile_identifiers(
            invitation.role,
            &ProfileIdentifiers {
                roll_number: invitation.roll_number.clone(),
                employee_id: invitation.employee_id.clone(),
            },
            &ProfileIdentifiers {
                roll_number: profile.roll_number,
                employee_id: profile.employee_id,
            },
        )?;

        if self
            .identity_repository
            .find_by_email(email.as_str())
            .await?
            .is_some()
        {
            return Err(AccountError::DuplicateAccount.into());
        }

        let password_hash = self.password_hasher.hash_password(&credentials.password)?;
        let plan = CommitPlan {
            invitation,
            email,
            password_hash,
            name: name.into(),
            identifiers,
        };

        let service = self.clone();
        tokio::spawn(async move { service.commit(plan).await })
            .await
            .map_err(|error| AppError::Internal(format!("provisioning task failed: {error}")))?
    }

    async fn commit(&self, plan: CommitPlan) -> AppResult<ProvisionedAccount> {
        let CommitPlan {
            invitation,
            email,
            password_hash,
            name,
            identifiers,
        } = plan;

        let identity_id = self
            .identity_repository
            .create_identity(email.as_str(), &password_hash)
            .await?;

        let new_profile = NewProfile {
            id: identity_id,
            name,
            email: email.as_str().to_owned(),
            role: invitation.role,
            department_id: Some(invitation.department.clone()),
            roll_number: identifiers.roll_number,
            employee_id: identifiers.employee_id,
        };

        if let Err(error) = self.profile_repository.create_profile(new_profile).await {
            tracing::warn!(
                subject = %identity_id,
                invitation_id = %invitation.id,
                %error,
                "profile write failed, removing identity"
            );
            self.roll_back(identity_id, false).await;
            return Err(AccountError::ProvisionPartialFailure(
                "your profile could not be saved".to_owned(),
            )
            .into());
        }

        match self
            .invitation_service
            .consume(invitation.id, Utc::now())
            .await
        {
            Ok(()) => {}
            Err(AppError::Account(AccountError::InvitationAlreadyUsed)) => {
                tracing::warn!(
                    subject = %identity_id,
                    invitation_id = %invitation.id,
                    "invitation consumed concurrently, removing account"
                );
                self.roll_back(identity_id, true).await;
                return Err(AccountError::InvitationAlreadyUsed.into());
            }
            Err(error) => {
                tracing::warn!(
                    subject = %identity_id,
                    invitation_id = %invitation.id,
                    %error,
                    "invitation consumption failed, removing account"
                );
                self.roll_back(identity_id, true).await;
                return Err(AccountError::ProvisionPartialFailure(
                    "the invitation could not be completed".to_owned(),
                )
                .into());
            }
        }

        self.audit(
            identity_id,
            AuditAction::AccountProvisioned,
            Some(format!("invitation {}", invitation.id)),
        )
        .await;
        tracing::info!(
            subject = %identity_id,
            invitation_id = %invitation.id,
            role = %invitation.role,
            department = %invitation.department,
            "account provisioned"
        );

        Ok(ProvisionedAccount {
            identity_id,
            role: invitation.role,
            department_id: Some(invitation.department),
        })
    }

    /// Deletes what a failed commit wrote. Failures are logged, not returned.
    async fn roll_back(&self, identity_id: UserId, profile_written: bool) {
        if profile_written
            && let Err(error) = self.profile_repository.delete_profile(identity_id).await
        {
            tracing::error!(subject = %identity_id, %error, "failed to roll back profile");
        }

        if let Err(error) = self.identity_repository.delete_identity(identity_id).await {
            tracing::error!(subject = %identity_id, %error, "failed to roll back identity");
        }
    }

    async fn audit(&self, subject: UserId, action: AuditAction, detail: Option<String>) {
        let event = AuditEvent {
            subject: subject.to_string(),
            action,
            resource_type: "profile".to_owned(),
            resource_id: subject.to_string(),
            detail,
        };

        if let Err(error) = self.audit_repository.append_event(event).await {
            tracing::warn!(%error, action = action.as_str(), "failed to append audit event");
        }
    }
}
