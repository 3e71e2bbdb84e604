//! Invitation records and the validity predicates applied to them.

use std::fmt::{Display, Formatter};

use chrono::{DateTime, Utc};
use feedesk_core::{AccountError, AppError, AppResult};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{DepartmentId, EmailAddress, Role, UserId};

/// Unique identifier for an invitation row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InvitationId(Uuid);

impl InvitationId {
    /// Creates a new random invitation identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates an invitation identifier from an existing UUID value.
    #[must_use]
    pub fn from_uuid(value: Uuid) -> Self {
        Self(value)
    }

    /// Parses an invitation identifier from its hyphenated string form.
    pub fn parse(value: &str) -> AppResult<Self> {
        Uuid::parse_str(value.trim()).map(Self).map_err(|error| {
            AppError::Validation(format!("invalid invitation id '{value}': {error}"))
        })
    }

    /// Returns the underlying UUID value.
    #[must_use]
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for InvitationId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for InvitationId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// A raw invitation token as it appears in an invitation link.
///
/// Tokens are 32 random bytes rendered as 64 hex characters.
#[derive(Clone, PartialEq, Eq)]
pub struct InvitationToken(String);

impl InvitationToken {
    /// Length of a well-formed token in characters.
    pub const LENGTH: usize = 64;

    /// Parses a token, rejecting empty or non-hex input.
    pub fn parse(raw: &str) -> Result<Self, AccountError> {
        let trimmed = raw.trim();
        if trimmed.len() != Self::LENGTH
            || !trimmed.chars().all(|character| character.is_ascii_hexdigit())
        {
            return Err(AccountError::TokenMalformed);
        }

        Ok(Self(trimmed.to_ascii_lowercase()))
    }

    /// Returns the canonical lower-case token.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl std::fmt::Debug for InvitationToken {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str("InvitationToken(***)")
    }
}

/// Persisted invitation row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invitation {
    /// Invitation identifier.
    pub id: InvitationId,
    /// Invited email; unique among active invitations.
    pub email: EmailAddress,
    /// Role the new account receives.
    pub role: Role,
    /// Department the new account belongs to.
    pub department: DepartmentId,
    /// Pre-assigned roll number for students.
    pub roll_number: Option<String>,
    /// Pre-assigned employee id for staff.
    pub employee_id: Option<String>,
    /// Admin that issued the invitation.
    pub invited_by: Option<UserId>,
    /// Cleared when the invitation is withdrawn or superseded.
    pub is_active: bool,
    /// Expiry instant.
    pub expires_at: DateTime<Utc>,
    /// Set once, when an account was provisioned from this invitation.
    pub used_at: Option<DateTime<Utc>>,
    /// Creation instant.
    pub created_at: DateTime<Utc>,
}

impl Invitation {
    /// Checks that the invitation can still be consumed at `now`.
    ///
    /// A consumed invitation reports `InvitationAlreadyUsed` even after it
    /// expires.
    pub fn check_usable(&self, now: DateTime<Utc>) -> Result<(), AccountError> {
        if self.used_at.is_some() {
            return Err(AccountError::InvitationAlreadyUsed);
        }

        if !self.is_active || now > self.expires_at {
            return Err(AccountError::InvitationExpired);
        }

        Ok(())
    }

    /// Returns whether the invitation is active, unused and unexpired.
    #[must_use]
    pub fn is_pending(&self, now: DateTime<Utc>) -> bool {
        self.check_usable(now).is_ok()
    }

    /// Builds the immutable view handed to the provisioner.
    #[must_use]
    pub fn snapshot(&self, validated_at: DateTime<Utc>) -> InvitationSnapshot {
        InvitationSnapshot {
            id: self.id,
            email: self.email.clone(),
            role: self.role,
            department: self.department.clone(),
            roll_number: self.roll_number.clone(),
            employee_id: self.employee_id.clone(),
            validated_at,
        }
    }
}

/// Immutable result of a successful token validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvitationSnapshot {
    /// Invitation identifier.
    pub id: InvitationId,
    /// Invited email.
    pub email: EmailAddress,
    /// Role the new account receives.
    pub role: Role,
    /// Department the new account belongs to.
    pub department: DepartmentId,
    /// Pre-assigned roll number.
    pub roll_number: Option<String>,
    /// Pre-assigned employee id.
    pub employee_id: Option<String>,
    /// When the snapshot was taken.
    pub validated_at: DateTime<Utc>,
}
