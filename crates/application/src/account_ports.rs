//! Ports implemented by the persistence and delivery adapters.

mod audit;
mod authorization;
mod email;
mod identity;
mod invitations;
mod profiles;

pub use audit::{AuditEvent, AuditRepository};
pub use authorization::{
    AuthorizationRepository, PermissionRecord, RolePermissionRecord, RoleRecord,
    SecurityAdminRepository, UserRoleRecord,
};
pub use email::EmailService;
pub use identity::{IdentityRecord, IdentityRepository, PasswordHasher};
pub use invitations::{InvitationRepository, NewInvitationRecord};
pub use profiles::{NewProfile, ProfileRecord, ProfileRepository};
