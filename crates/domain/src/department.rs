use std::fmt::{Display, Formatter};

use feedesk_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};

/// Department code such as `CSE` or `MECH`, stored upper-cased.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DepartmentId(String);

impl DepartmentId {
    /// Maximum department code length.
    pub const MAX_LENGTH: usize = 32;

    /// Creates a validated department code.
    pub fn new(value: impl AsRef<str>) -> AppResult<Self> {
        let code = value.as_ref().trim().to_ascii_uppercase();

        if code.is_empty() {
            return Err(AppError::Validation(
                "department code must not be empty".to_owned(),
            ));
        }

        if code.len() > Self::MAX_LENGTH {
            return Err(AppError::Validation(format!(
                "department code must not exceed {} characters",
                Self::MAX_LENGTH
            )));
        }

        if !code.chars().all(|character| {
            character.is_ascii_alphanumeric() || character == '-' || character == '_'
        }) {
            return Err(AppError::Validation(format!(
                "department code '{code}' may only contain letters, digits, '-' and '_'"
            )));
        }

        Ok(Self(code))
    }

    /// Returns the canonical code.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Display for DepartmentId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.0.as_str())
    }
}

impl TryFrom<String> for DepartmentId {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<DepartmentId> for String {
    fn from(value: DepartmentId) -> Self {
        value.0
    }
}
