//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod argon2_password_hasher;
mod console_email_service;
mod database_error;
mod postgres_audit_repository;
mod postgres_authorization_repository;
mod postgres_identity_repository;
mod postgres_invitation_repository;
mod postgres_profile_repository;
mod postgres_rate_limit_repository;
mod postgres_security_admin_repository;
mod smtp_email_service;

pub use argon2_password_hasher::Argon2PasswordHasher;
pub use console_email_service::ConsoleEmailService;
pub use postgres_audit_repository::PostgresAuditRepository;
pub use postgres_authorization_repository::PostgresAuthorizationRepository;
pub use postgres_identity_repository::PostgresIdentityRepository;
pub use postgres_invitation_repository::PostgresInvitationRepository;
pub use postgres_profile_repository::PostgresProfileRepository;
pub use postgres_rate_limit_repository::PostgresRateLimitRepository;
pub use postgres_security_admin_repository::PostgresSecurityAdminRepository;
pub use smtp_email_service::{SmtpEmailConfig, SmtpEmailService};
