//! Invitation issuance and token validation.
//!
//! Raw tokens are 32 random bytes rendered as hex. Only their SHA-256 hash is
//! stored, so a database read never yields a usable link.

mod bulk;
mod issue;
pub(crate) mod token_crypto;


use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};

use feedesk_core::{AccountError, AppError, AppResult};
use feedesk_domain::{
    AccessContext, AuditAction, Capability, DepartmentId, EffectiveUser, Invitation,
    InvitationId, InvitationSnapshot, InvitationToken, Role,
};

use crate::scope::sees_department;
use crate::{AuditEvent, AuditRepository, EmailService, IdentityRepository, InvitationRepository};

pub use bulk::{BulkInvitationFailure, BulkInvitationReport};

use token_crypto::hash_token;

/// Admin input for one invitation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewInvitation {
    /// Address the invitation is sent to.
    pub email: String,
    /// Role the new account receives.
    pub role: Role,
    /// Department the new account belongs to.
    pub department: DepartmentId,
    /// Pre-assigned roll number.
    pub roll_number: Option<String>,
    /// Pre-assigned employee id.
    pub employee_id: Option<String>,
}

/// Outcome of a token check in the shape the signup page renders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvitationTokenStatus {
    /// Whether the token can be used for signup right now.
    pub is_valid: bool,
    /// One of `malformed`, `not found`, `expired`, `already used`.
    pub error_message: Option<&'static str>,
    /// Snapshot of the invitation when valid.
    pub invitation: Option<InvitationSnapshot>,
}

/// Tunables for invitation issuance.
#[derive(Debug, Clone)]
pub struct InvitationSettings {
    /// Base URL of the single-page app, used for signup links.
    pub frontend_url: String,
    /// Lifetime of a fresh invitation.
    pub ttl: chrono::Duration,
    /// Upper bound for processing one bulk row.
    pub bulk_row_timeout: Duration,
    /// Rows processed in parallel during bulk issuance.
    pub bulk_concurrency: usize,
}

impl InvitationSettings {
    /// Builds settings with the default week-long lifetime and bulk limits.
    #[must_use]
    pub fn new(frontend_url: impl Into<String>) -> Self {
        Self {
            frontend_url: frontend_url.into(),
            ttl: chrono::Duration::hours(168),
            bulk_row_timeout: Duration::from_secs(10),
            bulk_concurrency: 8,
        }
    }

    fn signup_link(&self, raw_token: &str) -> String {
        format!(
            "{}/signup?token={raw_token}",
            self.frontend_url.trim_end_matches('/')
        )
    }
}

/// Application service owning the invitation lifecycle.
#[derive(Clone)]
pub struct InvitationService {
    invitation_repository: Arc<dyn InvitationRepository>,
    identity_repository: Arc<dyn IdentityRepository>,
    email_service: Arc<dyn EmailService>,
    audit_repository: Arc<dyn AuditRepository>,
    settings: InvitationSettings,
}

impl InvitationService {
    /// Creates a new invitation service.
    #[must_use]
    pub fn new(
        invitation_repository: Arc<dyn InvitationRepository>,
        identity_repository: Arc<dyn IdentityRepository>,
        email_service: Arc<dyn EmailService>,
        audit_repository: Arc<dyn AuditRepository>,
        settings: InvitationSettings,
    ) -> Self {
        Self {
            invitation_repository,
            identity_repository,
            email_service,
            audit_repository,
            settings,
        }
    }

    /// Validates a raw signup token without consuming it.
    ///
    /// Failure order: malformed, not found, then the lifecycle checks of
    /// [`Invitation::check_usable`].
    pub async fn validate(&self, raw_token: &str) -> AppResult<InvitationSnapshot> {
        let token = InvitationToken::parse(raw_token)?;
        let invitation = self
            .invitation_repository
            .find_by_token_hash(&hash_token(token.as_str()))
            .await?
            .ok_or(AccountError::InvitationNotFound)?;

        let now = Utc::now();
        invitation.check_usable(now)?;

        Ok(invitation.snapshot(now))
    }

    /// Validates a raw token and folds invitation failures into a status.
    ///
    /// Storage failures are still returned as errors.
    pub async fn check_token(&self, raw_token: &str) -> AppResult<InvitationTokenStatus> {
        match self.validate(raw_token).await {
            Ok(snapshot) => Ok(InvitationTokenStatus {
                is_valid: true,
                error_message: None,
                invitation: Some(snapshot),
            }),
            Err(AppError::Account(error)) => match error.invitation_reason() {
                Some(reason) => Ok(InvitationTokenStatus {
                    is_valid: false,
                    error_message: Some(reason),
                    invitation: None,
                }),
                None => Err(AppError::Account(error)),
            },
            Err(error) => Err(error),
        }
    }

    /// Re-reads an invitation by id and re-applies the validity checks.
    pub async fn revalidate(
        &self,
        invitation_id: InvitationId,
        now: DateTime<Utc>,
    ) -> AppResult<Invitation> {
        let invitation = self
            .invitation_repository
            .find_by_id(invitation_id)
            .await?
            .ok_or(AccountError::InvitationNotFound)?;

        invitation.check_usable(now)?;
        Ok(invitation)
    }

    /// Marks an invitation used. Only the first caller succeeds.
    pub async fn consume(&self, invitation_id: InvitationId, at: DateTime<Utc>) -> AppResult<()> {
        if self.invitation_repository.mark_used(invitation_id, at).await? {
            Ok(())
        } else {
            Err(AccountError::InvitationAlreadyUsed.into())
        }
    }

    /// Soft-expires an unused invitation.
    pub async fn revoke(
        &self,
        actor: &EffectiveUser,
        invitation_id: InvitationId,
    ) -> AppResult<()> {
        let invitation = self
            .invitation_repository
            .find_by_id(invitation_id)
            .await?
            .ok_or(AccountError::InvitationNotFound)?;

        actor.require(
            Capability::InviteUsers,
            &AccessContext::department(invitation.department.clone()),
        )?;

        if invitation.used_at.is_some() {
            return Err(AccountError::InvitationAlreadyUsed.into());
        }

        if !self.invitation_repository.deactivate(invitation_id).await? {
            return Err(AppError::Conflict(format!(
                "invitation '{invitation_id}' is no longer active"
            )));
        }

        self.audit(
            actor,
            AuditAction::InvitationRevoked,
            invitation_id,
            Some(invitation.email.as_str().to_owned()),
        )
        .await;
        tracing::info!(
            invitation_id = %invitation_id,
            subject = %actor.user_id(),
            "invitation revoked"
        );

        Ok(())
    }

    /// Lists pending invitations visible to the actor.
    pub async fn list_pending(&self, actor: &EffectiveUser) -> AppResult<Vec<Invitation>> {
        actor.require(Capability::InviteUsers, &AccessContext::unscoped())?;

        let mut invitations = self.invitation_repository.list_pending(Utc::now()).await?;
        invitations.retain(|invitation| sees_department(actor, Some(&invitation.department)));

        Ok(invitations)
    }

    /// Appends an audit event, logging instead of failing the caller.
    async fn audit(
        &self,
        actor: &EffectiveUser,
        action: AuditAction,
        invitation_id: InvitationId,
        detail: Option<String>,
    ) {
        let event = AuditEvent {
            subject: actor.user_id().to_string(),
            action,
            resource_type: "user_invitation".to_owned(),
            resource_id: invitation_id.to_string(),
            detail,
        };

        if let Err(error) = self.audit_repository.append_event(event).await {
            tracing::warn!(%error, action = action.as_str(), "failed to append audit event");
        }
    }
}
