use std::fmt::{Display, Formatter};
use std::str::FromStr;

use feedesk_core::AppError;
use serde::{Deserialize, Serialize};

/// Primary role carried by a profile and an invitation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Enrolled student; identified by a roll number.
    Student,
    /// Teaching staff member.
    Faculty,
    /// Head of a department.
    Hod,
    /// College principal.
    Principal,
    /// System administrator.
    Admin,
}

/// Roles whose holders pass every access check without explicit grants.
///
/// This is the only place role names influence authorization decisions.
pub const ROLE_SHORT_CIRCUITS: &[Role] = &[Role::Admin, Role::Principal];

impl Role {
    /// Returns a stable storage value for this role.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Student => "student",
            Self::Faculty => "faculty",
            Self::Hod => "hod",
            Self::Principal => "principal",
            Self::Admin => "admin",
        }
    }

    /// Returns all known roles.
    #[must_use]
    pub fn all() -> &'static [Self] {
        const ALL: &[Role] = &[
            Role::Student,
            Role::Faculty,
            Role::Hod,
            Role::Principal,
            Role::Admin,
        ];

        ALL
    }

    /// Returns whether this role bypasses explicit permission checks.
    #[must_use]
    pub fn short_circuits_access(&self) -> bool {
        ROLE_SHORT_CIRCUITS.contains(self)
    }

    /// Returns whether the profile identifier for this role is a roll number
    /// rather than an employee id.
    #[must_use]
    pub fn requires_roll_number(&self) -> bool {
        matches!(self, Self::Student)
    }
}

impl Display for Role {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "student" => Ok(Self::Student),
            "faculty" => Ok(Self::Faculty),
            "hod" => Ok(Self::Hod),
            "principal" => Ok(Self::Principal),
            "admin" => Ok(Self::Admin),
            _ => Err(AppError::Validation(format!("unknown role '{value}'"))),
        }
    }
}
