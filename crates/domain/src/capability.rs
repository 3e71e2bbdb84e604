use std::fmt::{Display, Formatter};
use std::str::FromStr;

use feedesk_core::AppError;
use serde::{Deserialize, Serialize};

/// Capabilities checked by the access gate before protected views and
/// privileged mutations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    /// Open the administration panel.
    AccessAdminPanel,
    /// List users and toggle account activation.
    ManageUsers,
    /// Send single invitations.
    InviteUsers,
    /// Send invitations in bulk.
    BulkInviteUsers,
    /// Remove user accounts.
    RemoveUsers,
    /// Change primary roles and role assignments.
    EditRoles,
    /// Change which permissions a role carries.
    EditPermissions,
    /// View the application as another user.
    ImpersonateUsers,
    /// Leave an impersonated view. Always evaluated against the original identity.
    ExitImpersonation,
    /// Assign fee structures to students.
    AssignFees,
    /// Edit an individual fee record.
    EditFeeRecord,
    /// Read fee records.
    ViewFeeRecords,
    /// Record fee payments.
    CollectPayments,
    /// Create and award scholarships.
    ManageScholarships,
    /// Read analytics reports.
    ViewReports,
    /// Open the role dashboard.
    ViewDashboard,
    /// Read one's own profile.
    ViewOwnProfile,
}

/// Capabilities still granted while permission data is degraded.
///
/// Everything else fails closed until permissions load again.
pub const SAFE_WHEN_DEGRADED: &[Capability] =
    &[Capability::ViewDashboard, Capability::ViewOwnProfile];

impl Capability {
    /// Returns a stable storage value for this capability.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AccessAdminPanel => "access_admin_panel",
            Self::ManageUsers => "manage_users",
            Self::InviteUsers => "invite_users",
            Self::BulkInviteUsers => "bulk_invite_users",
            Self::RemoveUsers => "remove_users",
            Self::EditRoles => "edit_roles",
            Self::EditPermissions => "edit_permissions",
            Self::ImpersonateUsers => "impersonate_users",
            Self::ExitImpersonation => "exit_impersonation",
            Self::AssignFees => "assign_fees",
            Self::EditFeeRecord => "edit_fee_record",
            Self::ViewFeeRecords => "view_fee_records",
            Self::CollectPayments => "collect_payments",
            Self::ManageScholarships => "manage_scholarships",
            Self::ViewReports => "view_reports",
            Self::ViewDashboard => "view_dashboard",
            Self::ViewOwnProfile => "view_own_profile",
        }
    }

    /// Returns all known capabilities.
    #[must_use]
    pub fn all() -> &'static [Self] {
        const ALL: &[Capability] = &[
            Capability::AccessAdminPanel,
            Capability::ManageUsers,
            Capability::InviteUsers,
            Capability::BulkInviteUsers,
            Capability::RemoveUsers,
            Capability::EditRoles,
            Capability::EditPermissions,
            Capability::ImpersonateUsers,
            Capability::ExitImpersonation,
            Capability::AssignFees,
            Capability::EditFeeRecord,
            Capability::ViewFeeRecords,
            Capability::CollectPayments,
            Capability::ManageScholarships,
            Capability::ViewReports,
            Capability::ViewDashboard,
            Capability::ViewOwnProfile,
        ];

        ALL
    }

    /// Returns whether the capability stays available with degraded permissions.
    #[must_use]
    pub fn is_safe_when_degraded(&self) -> bool {
        SAFE_WHEN_DEGRADED.contains(self)
    }
}

impl Display for Capability {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl FromStr for Capability {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::all()
            .iter()
            .copied()
            .find(|capability| capability.as_str() == value)
            .ok_or_else(|| AppError::Validation(format!("unknown capability '{value}'")))
    }
}
