//! Application services and ports.

#![forbid(unsafe_code)]

mod account_ports;
mod authorization_service;
mod invitation_service;
mod provisioning_service;
mod rate_limit_service;
mod scope;
mod session_service;
mod user_admin_service;

#[cfg(test)]
mod test_support;

pub use account_ports::{
    AuditEvent, AuditRepository, AuthorizationRepository, EmailService, IdentityRecord,
    IdentityRepository, InvitationRepository, NewInvitationRecord, NewProfile, PasswordHasher,
    PermissionRecord, ProfileRecord, ProfileRepository, RolePermissionRecord, RoleRecord,
    SecurityAdminRepository, UserRoleRecord,
};
pub use authorization_service::AuthorizationService;
pub use invitation_service::{
    BulkInvitationFailure, BulkInvitationReport, InvitationService, InvitationSettings,
    InvitationTokenStatus, NewInvitation,
};
pub use provisioning_service::{
    BootstrapAdminRequest, ProvisionedAccount, ProvisioningService, SignupCredentials,
    SignupProfile,
};
pub use rate_limit_service::{AttemptInfo, RateLimitRepository, RateLimitRule, RateLimitService};
pub use session_service::SessionService;
pub use user_admin_service::UserAdminService;
