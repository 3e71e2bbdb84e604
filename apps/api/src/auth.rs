mod bootstrap;
mod impersonation;
mod session;
mod session_helpers;
mod signup;

pub use bootstrap::bootstrap_handler;
pub use impersonation::{exit_impersonation_handler, start_impersonation_handler};
pub use session::{login_handler, logout_handler, me_handler, refresh_session_handler};
pub use signup::{signup_handler, validate_invitation_handler};

/// Session key holding the serialized `EffectiveUser`.
pub const SESSION_USER_KEY: &str = "effective_user";
/// Absolute session creation timestamp, checked on every protected request.
pub const SESSION_CREATED_AT_KEY: &str = "session_created_at";
pub const SESSION_ABSOLUTE_TIMEOUT_SECONDS: i64 = 12 * 60 * 60;
