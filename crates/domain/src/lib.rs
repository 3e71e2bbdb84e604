//! Domain entities and invariants.

#![forbid(unsafe_code)]

mod access;
mod capability;
mod department;
mod impersonation;
mod invitation;
mod profile;
mod role;
mod security;
mod user;

pub use access::{AccessContext, DepartmentGrants, EffectiveUser, can_access};
pub use capability::{Capability, SAFE_WHEN_DEGRADED};
pub use department::DepartmentId;
pub use impersonation::ImpersonationState;
pub use invitation::{Invitation, InvitationId, InvitationSnapshot, InvitationToken};
pub use profile::{ProfileIdentifiers, resolve_profile_identifiers};
pub use role::{ROLE_SHORT_CIRCUITS, Role};
pub use security::AuditAction;
pub use user::{EmailAddress, PASSWORD_LENGTH, UserId, validate_password};
