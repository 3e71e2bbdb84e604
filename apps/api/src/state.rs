use feedesk_application::{
    InvitationService, ProvisioningService, RateLimitService, SessionService, UserAdminService,
};
use sqlx::PgPool;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub invitation_service: InvitationService,
    pub provisioning_service: ProvisioningService,
    pub session_service: SessionService,
    pub user_admin_service: UserAdminService,
    pub rate_limit_service: RateLimitService,
    pub frontend_url: String,
    pub api_public_key: String,
    pub postgres_pool: PgPool,
}
