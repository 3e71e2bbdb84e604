//! Roll numbers and employee ids chosen for a profile at signup.

use feedesk_core::{AccountError, AppError, AppResult};
use serde::{Deserialize, Serialize};

use crate::Role;

/// Role-dependent identifiers stored on a profile.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileIdentifiers {
    /// Student roll number.
    pub roll_number: Option<String>,
    /// Staff employee id.
    pub employee_id: Option<String>,
}

/// Resolves the identifiers a new profile is created with.
///
/// Students need a roll number, every other role an employee id. The value
/// may come from the invitation or the signup form; when both carry one they
/// must agree, because the invitation is the admin-approved source.
pub fn resolve_profile_identifiers(
    role: Role,
    invited: &ProfileIdentifiers,
    submitted: &ProfileIdentifiers,
) -> AppResult<ProfileIdentifiers> {
    if role.requires_roll_number() {
        let roll_number = pick_identifier(
            "roll number",
            invited.roll_number.as_deref(),
            submitted.roll_number.as_deref(),
        )?
        .ok_or_else(|| {
            AccountError::ProfileIncomplete("a roll number is required for students".to_owned())
        })?;

        return Ok(ProfileIdentifiers {
            roll_number: Some(roll_number),
            employee_id: None,
        });
    }

    let employee_id = pick_identifier(
        "employee id",
        invited.employee_id.as_deref(),
        submitted.employee_id.as_deref(),
    )?
    .ok_or_else(|| {
        AccountError::ProfileIncomplete(format!("an employee id is required for role '{role}'"))
    })?;

    Ok(ProfileIdentifiers {
        roll_number: None,
        employee_id: Some(employee_id),
    })
}

fn pick_identifier(
    label: &str,
    invited: Option<&str>,
    submitted: Option<&str>,
) -> AppResult<Option<String>> {
    let invited = normalise(invited);
    let submitted = normalise(submitted);

    match (invited, submitted) {
        (Some(invited), Some(submitted)) if !invited.eq_ignore_ascii_case(&submitted) => {
            Err(AppError::Validation(format!(
                "{label} '{submitted}' does not match the invitation"
            )))
        }
        (Some(invited), _) => Ok(Some(invited)),
        (None, submitted) => Ok(submitted),
    }
}

fn normalise(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_ascii_uppercase)
}
