use thiserror::Error;

/// Failures of the invitation, provisioning and access workflow.
///
/// Each variant maps to a distinct remediation for the user (resend the
/// invitation, log in instead, re-check the link, ask an admin), so callers
/// must surface them as-is rather than collapsing them into a generic error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AccountError {
    /// The token is empty or not in the expected format.
    #[error("this invitation link is malformed, check that you copied the whole link")]
    TokenMalformed,

    /// No invitation matches the token.
    #[error("this invitation was not found, re-check the link or ask an admin for a new one")]
    InvitationNotFound,

    /// The invitation expired or was withdrawn.
    #[error("this invitation has expired, ask an admin to resend it")]
    InvitationExpired,

    /// The invitation was already consumed.
    #[error("this invitation has already been used, log in with your account instead")]
    InvitationAlreadyUsed,

    /// An account already exists for the invited email.
    #[error("an account already exists for this email, log in instead")]
    DuplicateAccount,

    /// A role-dependent profile field is missing.
    #[error("profile is incomplete: {0}")]
    ProfileIncomplete(String),

    /// Identity creation succeeded but a later step failed and was rolled back.
    #[error("account setup did not complete, please retry: {0}")]
    ProvisionPartialFailure(String),

    /// The gate denied the requested capability.
    #[error("access denied: {0}")]
    PermissionDenied(String),

    /// The target of an administrative action is not acceptable.
    #[error("invalid target: {0}")]
    InvalidTarget(String),

    /// An impersonation session is already active.
    #[error("already viewing as another user, exit the current view first")]
    AlreadyImpersonating,
}

impl AccountError {
    /// Returns a stable machine-readable code for transport layers.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::TokenMalformed => "token_malformed",
            Self::InvitationNotFound => "invitation_not_found",
            Self::InvitationExpired => "invitation_expired",
            Self::InvitationAlreadyUsed => "invitation_already_used",
            Self::DuplicateAccount => "duplicate_account",
            Self::ProfileIncomplete(_) => "profile_incomplete",
            Self::ProvisionPartialFailure(_) => "provision_partial_failure",
            Self::PermissionDenied(_) => "permission_denied",
            Self::InvalidTarget(_) => "invalid_target",
            Self::AlreadyImpersonating => "already_impersonating",
        }
    }

    /// Returns the short invalidity reason reported by token checks, if this
    /// is an invitation failure.
    #[must_use]
    pub fn invitation_reason(&self) -> Option<&'static str> {
        match self {
            Self::TokenMalformed => Some("malformed"),
            Self::InvitationNotFound => Some("not found"),
            Self::InvitationExpired => Some("expired"),
            Self::InvitationAlreadyUsed => Some("already used"),
            _ => None,
        }
    }
}
