use async_trait::async_trait;
use chrono::{DateTime, Utc};

use feedesk_core::AppResult;
use feedesk_domain::{DepartmentId, EmailAddress, Invitation, InvitationId, Role, UserId};

/// Values persisted when an invitation is issued.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewInvitationRecord {
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
    /// Issuing admin.
    pub invited_by: Option<UserId>,
    /// SHA-256 hash of the raw token.
    pub token_hash: String,
    /// Expiry instant.
    pub expires_at: DateTime<Utc>,
}

/// Repository port for invitation persistence.
#[async_trait]
pub trait InvitationRepository: Send + Sync {
    /// Stores a new invitation.
    ///
    /// Any other active, unused invitation for the same email is deactivated
    /// in the same transaction so at most one can be consumed.
    async fn create_invitation(&self, record: NewInvitationRecord) -> AppResult<Invitation>;

    /// Finds an invitation by token hash regardless of its state.
    async fn find_by_token_hash(&self, token_hash: &str) -> AppResult<Option<Invitation>>;

    /// Finds an invitation by id regardless of its state.
    async fn find_by_id(&self, invitation_id: InvitationId) -> AppResult<Option<Invitation>>;

    /// Sets `used_at` only if it is still unset. Returns whether this call
    /// consumed the invitation.
    async fn mark_used(&self, invitation_id: InvitationId, used_at: DateTime<Utc>)
    -> AppResult<bool>;

    /// Clears `is_active`. Returns whether a row changed.
    async fn deactivate(&self, invitation_id: InvitationId) -> AppResult<bool>;

    /// Lists active, unused, unexpired invitations, newest first.
    async fn list_pending(&self, now: DateTime<Utc>) -> AppResult<Vec<Invitation>>;
}
