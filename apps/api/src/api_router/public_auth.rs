use axum::Router;
use axum::middleware::from_fn_with_state;
use axum::routing::post;
use feedesk_application::RateLimitRule;

use crate::state::AppState;
use crate::{auth, middleware};

pub(super) fn build_sign_in_routes(app_state: AppState) -> Router<AppState> {
    Router::new()
        .route("/auth/login", post(auth::login_handler))
        .route_layer(from_fn_with_state(app_state, middleware::rate_limit))
        .layer(axum::Extension(RateLimitRule::sign_in()))
}

pub(super) fn build_invitation_validation_routes(app_state: AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/auth/invitations/validate",
            post(auth::validate_invitation_handler),
        )
        .route_layer(from_fn_with_state(app_state, middleware::rate_limit))
        .layer(axum::Extension(RateLimitRule::invitation_validation()))
}

pub(super) fn build_signup_routes(app_state: AppState) -> Router<AppState> {
    Router::new()
        .route("/auth/signup", post(auth::signup_handler))
        .route("/auth/bootstrap", post(auth::bootstrap_handler))
        .route_layer(from_fn_with_state(app_state, middleware::rate_limit))
        .layer(axum::Extension(RateLimitRule::signup()))
}
