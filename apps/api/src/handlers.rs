use feedesk_core::AppError;
use uuid::Uuid;

pub mod access;
pub mod health;
pub mod invitations;
pub mod users;

fn parse_uuid(value: &str, label: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(value.trim())
        .map_err(|error| AppError::Validation(format!("invalid {label} '{value}': {error}")))
}
