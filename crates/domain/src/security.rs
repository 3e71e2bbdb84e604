use serde::{Deserialize, Serialize};

/// Stable audit actions emitted by account and access use-cases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    /// Emitted when an invitation is issued.
    InvitationIssued,
    /// Emitted when an invitation is withdrawn.
    InvitationRevoked,
    /// Emitted when an account is created from an invitation.
    AccountProvisioned,
    /// Emitted when the first admin account is bootstrapped.
    AccountBootstrapped,
    /// Emitted when a primary role changes.
    UserRoleChanged,
    /// Emitted when an account is activated.
    UserActivated,
    /// Emitted when an account is deactivated.
    UserDeactivated,
    /// Emitted when an account is removed.
    UserRemoved,
    /// Emitted when a role is assigned to a user.
    RoleAssigned,
    /// Emitted when a role assignment is revoked.
    RoleUnassigned,
    /// Emitted when a permission is attached to a role.
    PermissionGranted,
    /// Emitted when a permission is detached from a role.
    PermissionRevoked,
    /// Emitted when an admin starts viewing as another user.
    ImpersonationStarted,
    /// Emitted when an admin leaves an impersonated view.
    ImpersonationEnded,
}

impl AuditAction {
    /// Returns a stable storage value for this action.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvitationIssued => "invitation.issued",
            Self::InvitationRevoked => "invitation.revoked",
            Self::AccountProvisioned => "account.provisioned",
            Self::AccountBootstrapped => "account.bootstrapped",
            Self::UserRoleChanged => "user.role_changed",
            Self::UserActivated => "user.activated",
            Self::UserDeactivated => "user.deactivated",
            Self::UserRemoved => "user.removed",
            Self::RoleAssigned => "security.role.assigned",
            Self::RoleUnassigned => "security.role.unassigned",
            Self::PermissionGranted => "security.permission.granted",
            Self::PermissionRevoked => "security.permission.revoked",
            Self::ImpersonationStarted => "security.impersonation.started",
            Self::ImpersonationEnded => "security.impersonation.ended",
        }
    }
}
