use std::sync::Arc;
use std::time::Duration;

use feedesk_application::{
    AuthorizationService, InvitationService, InvitationSettings, ProvisioningService,
    RateLimitService, SessionService, UserAdminService,
};
use feedesk_core::AppError;
use feedesk_infrastructure::{
    Argon2PasswordHasher, PostgresAuditRepository, PostgresAuthorizationRepository,
    PostgresIdentityRepository, PostgresInvitationRepository, PostgresProfileRepository,
    PostgresRateLimitRepository, PostgresSecurityAdminRepository,
};
use sqlx::PgPool;
use tracing::{debug, warn};

use crate::api_config::ApiConfig;
use crate::state::AppState;

use super::email::build_email_service;

pub fn build_app_state(pool: PgPool, config: &ApiConfig) -> Result<AppState, AppError> {
    let identity_repository = Arc::new(PostgresIdentityRepository::new(pool.clone()));
    let profile_repository = Arc::new(PostgresProfileRepository::new(pool.clone()));
    let invitation_repository = Arc::new(PostgresInvitationRepository::new(pool.clone()));
    let authorization_repository = Arc::new(PostgresAuthorizationRepository::new(pool.clone()));
    let security_admin_repository = Arc::new(PostgresSecurityAdminRepository::new(pool.clone()));
    let audit_repository = Arc::new(PostgresAuditRepository::new(pool.clone()));
    let rate_limit_repository = Arc::new(PostgresRateLimitRepository::new(pool.clone()));
    let password_hasher = Arc::new(Argon2PasswordHasher::new());
    let email_service = build_email_service(config)?;

    let settings = InvitationSettings {
        ttl: config.invitation_ttl,
        bulk_row_timeout: config.bulk_row_timeout,
        bulk_concurrency: config.bulk_concurrency,
        ..InvitationSettings::new(config.frontend_url.clone())
    };
    let invitation_service = InvitationService::new(
        invitation_repository,
        identity_repository.clone(),
        email_service,
        audit_repository.clone(),
        settings,
    );

    let authorization_service =
        AuthorizationService::new(authorization_repository, profile_repository.clone());

    let provisioning_service = ProvisioningService::new(
        invitation_service.clone(),
        identity_repository.clone(),
        profile_repository.clone(),
        password_hasher.clone(),
        audit_repository.clone(),
    )
    .with_bootstrap_token(config.bootstrap_token.clone());

    let session_service = SessionService::new(
        identity_repository.clone(),
        profile_repository.clone(),
        password_hasher,
        authorization_service,
        audit_repository.clone(),
    );

    let user_admin_service = UserAdminService::new(
        profile_repository,
        identity_repository,
        security_admin_repository,
        audit_repository,
    );

    Ok(AppState {
        invitation_service,
        provisioning_service,
        session_service,
        user_admin_service,
        rate_limit_service: RateLimitService::new(rate_limit_repository),
        frontend_url: config.frontend_url.clone(),
        api_public_key: config.api_public_key.clone(),
        postgres_pool: pool,
    })
}

/// Drops stale rate limit windows once an hour.
pub fn spawn_rate_limit_cleanup(rate_limit_service: RateLimitService) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(60 * 60));
        loop {
            interval.tick().await;
            match rate_limit_service.cleanup().await {
                Ok(removed) => debug!(removed, "removed expired rate limit windows"),
                Err(error) => warn!(%error, "rate limit cleanup failed"),
            }
        }
    });
}
