use feedesk_domain::EmailAddress;

use crate::NewInvitationRecord;

use super::token_crypto::generate_token;
use super::*;

impl InvitationService {
    /// Issues one invitation and emails the signup link.
    ///
    /// A previous pending invitation for the same email is retired in the
    /// same write. Only admins and principals may invite accounts that
    /// would themselves bypass permission checks.
    pub async fn issue(
        &self,
        actor: &EffectiveUser,
        input: NewInvitation,
    ) -> AppResult<Invitation> {
        let (invitation, raw_token) = self.create_pending(actor, input).await?;
        self.deliver(actor, invitation, &raw_token).await
    }

    /// Validates and stores an invitation without sending it.
    ///
    /// Returns the stored invitation with the raw token that only the
    /// signup email ever carries.
    pub(super) async fn create_pending(
        &self,
        actor: &EffectiveUser,
        input: NewInvitation,
    ) -> AppResult<(Invitation, String)> {
        actor.require(
            Capability::InviteUsers,
            &AccessContext::department(input.department.clone()),
        )?;

        if input.role.short_circuits_access() && !actor.acting_as().role().short_circuits_access() {
            return Err(AccountError::PermissionDenied(format!(
                "only an admin or principal can invite a '{}'",
                input.role
            ))
            .into());
        }

        let email = EmailAddress::new(&input.email)?;
        if self
            .identity_repository
            .find_by_email(email.as_str())
            .await?
            .is_some()
        {
            return Err(AccountError::DuplicateAccount.into());
        }

        let (raw_token, token_hash) = generate_token()?;
        let invitation = self
            .invitation_repository
            .create_invitation(NewInvitationRecord {
                email,
                role: input.role,
                department: input.department,
                roll_number: normalize_identifier(input.roll_number),
                employee_id: normalize_identifier(input.employee_id),
                invited_by: Some(actor.user_id()),
                token_hash,
                expires_at: Utc::now() + self.settings.ttl,
            })
            .await?;

        Ok((invitation, raw_token))
    }

    /// Emails a stored invitation and records the issue.
    pub(super) async fn deliver(
        &self,
        actor: &EffectiveUser,
        invitation: Invitation,
        raw_token: &str,
    ) -> AppResult<Invitation> {
        if let Err(error) = self.send_invitation_email(&invitation, raw_token).await {
            self.retire_undelivered(invitation.id).await;
            return Err(error);
        }

        self.audit(
            actor,
            AuditAction::InvitationIssued,
            invitation.id,
            Some(format!(
                "{} as {} in {}",
                invitation.email, invitation.role, invitation.department
            )),
        )
        .await;
        tracing::info!(
            invitation_id = %invitation.id,
            subject = %actor.user_id(),
            role = %invitation.role,
            department = %invitation.department,
            "invitation issued"
        );

        Ok(invitation)
    }

    /// Deactivates an invitation whose email never went out, so it neither
    /// shows as pending nor blocks the next attempt.
    pub(super) async fn retire_undelivered(&self, invitation_id: InvitationId) {
        if let Err(error) = self.invitation_repository.deactivate(invitation_id).await {
            tracing::error!(
                invitation_id = %invitation_id,
                error = %error,
                "failed to retire undelivered invitation"
            );
        }
    }

    async fn send_invitation_email(
        &self,
        invitation: &Invitation,
        raw_token: &str,
    ) -> AppResult<()> {
        let link = self.settings.signup_link(raw_token);
        let expires = invitation.expires_at.format("%Y-%m-%d %H:%M UTC");
        let text_body = format!(
            "You have been invited to join the fee management portal as {role} \
             in department {department}.\n\n\
             Create your account here: {link}\n\n\
             This link expires on {expires} and can only be used once.",
            role = invitation.role,
            department = invitation.department,
        );
        let html_body = format!(
            "<p>You have been invited to join the fee management portal as \
             <strong>{role}</strong> in department <strong>{department}</strong>.</p>\
             <p><a href=\"{link}\">Create your account</a></p>\
             <p>This link expires on {expires} and can only be used once.</p>",
            role = invitation.role,
            department = invitation.department,
        );

        self.email_service
            .send_email(
                invitation.email.as_str(),
                "Your fee portal invitation",
                &text_body,
                Some(&html_body),
            )
            .await
    }
}

fn normalize_identifier(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_uppercase())
        .filter(|value| !value.is_empty())
}
