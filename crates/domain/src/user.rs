//! Account identity types and credential rules.

use feedesk_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier of an authentication identity; profiles share the same value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(Uuid);

impl UserId {
    /// Creates a new random user identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a user identifier from an existing UUID value.
    #[must_use]
    pub fn from_uuid(value: Uuid) -> Self {
        Self(value)
    }

    /// Parses a user identifier from its hyphenated string form.
    pub fn parse(value: &str) -> AppResult<Self> {
        Uuid::parse_str(value.trim())
            .map(Self)
            .map_err(|error| AppError::Validation(format!("invalid user id '{value}': {error}")))
    }

    /// Returns the underlying UUID value.
    #[must_use]
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// Lower-cased email address with a plausible `local@domain.tld` shape.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EmailAddress(String);

impl EmailAddress {
    /// Longest address accepted, per RFC 5321.
    pub const MAX_LENGTH: usize = 254;

    /// Canonicalises and validates an address.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        let canonical = value.into().trim().to_lowercase();

        if canonical.is_empty() {
            return Err(AppError::Validation("email is required".to_owned()));
        }
        if canonical.len() > Self::MAX_LENGTH {
            return Err(AppError::Validation(format!(
                "email is longer than {} characters",
                Self::MAX_LENGTH
            )));
        }
        if canonical.chars().any(char::is_whitespace) {
            return Err(AppError::Validation(format!(
                "email '{canonical}' contains whitespace"
            )));
        }

        let valid_shape = canonical
            .split_once('@')
            .is_some_and(|(local, domain)| {
                !local.is_empty()
                    && !domain.contains('@')
                    && domain
                        .rsplit_once('.')
                        .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty())
            });
        if !valid_shape {
            return Err(AppError::Validation(format!(
                "'{canonical}' is not a valid email address"
            )));
        }

        Ok(Self(canonical))
    }

    /// Returns the canonical address.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for EmailAddress {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(&self.0)
    }
}

impl From<EmailAddress> for String {
    fn from(value: EmailAddress) -> Self {
        value.0
    }
}

/// Accepted password length range, in characters.
pub const PASSWORD_LENGTH: std::ops::RangeInclusive<usize> = 10..=128;

/// Checks a password chosen at signup: length bounds and a short deny-list of
/// passwords seen in breaches and campus phishing kits.
pub fn validate_password(password: &str) -> AppResult<()> {
    let length = password.chars().count();
    if !PASSWORD_LENGTH.contains(&length) {
        return Err(AppError::Validation(format!(
            "password must be between {} and {} characters",
            PASSWORD_LENGTH.start(),
            PASSWORD_LENGTH.end()
        )));
    }

    let lowered = password.to_lowercase();
    if DENIED_PASSWORDS.contains(&lowered.as_str()) {
        return Err(AppError::Validation(
            "password is too easy to guess, choose another".to_owned(),
        ));
    }

    Ok(())
}

static DENIED_PASSWORDS: &[&str] = &[
    "1234567890",
    "0987654321",
    "1111111111",
    "qwertyuiop",
    "password12",
    "password123",
    "password1234",
    "passw0rd123",
    "iloveyou123",
    "letmein123",
    "welcome123",
    "welcome@123",
    "admin12345",
    "admin@1234",
    "student123",
    "student@123",
    "college123",
    "college@123",
    "faculty123",
    "teacher123",
    "principal1",
    "changeme123",
    "qwerty12345",
    "abcdef1234",
    "football123",
    "sunshine12",
];
