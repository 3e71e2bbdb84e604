mod cors;
mod public_auth;

use axum::Router;
use axum::middleware::{from_fn, from_fn_with_state};
use axum::routing::{delete, get, post, put};
use feedesk_core::AppError;
use tower_http::trace::TraceLayer;
use tower_sessions::SessionManagerLayer;
use tower_sessions_sqlx_store::PostgresStore;

use crate::state::AppState;
use crate::{auth, handlers, middleware};

use self::cors::build_cors_layer;
use self::public_auth::{
    build_invitation_validation_routes, build_sign_in_routes, build_signup_routes,
};

pub fn build_router(
    app_state: AppState,
    frontend_url: &str,
    session_layer: SessionManagerLayer<PostgresStore>,
) -> Result<Router, AppError> {
    let protected_routes = Router::new()
        .route("/auth/me", get(auth::me_handler))
        .route("/auth/session/refresh", post(auth::refresh_session_handler))
        .route(
            "/auth/impersonation",
            post(auth::start_impersonation_handler).delete(auth::exit_impersonation_handler),
        )
        .route(
            "/api/access/check",
            get(handlers::access::access_check_handler),
        )
        .route(
            "/api/invitations",
            get(handlers::invitations::list_invitations_handler)
                .post(handlers::invitations::create_invitation_handler),
        )
        .route(
            "/api/invitations/bulk",
            post(handlers::invitations::bulk_invitations_handler),
        )
        .route(
            "/api/invitations/{invitation_id}/revoke",
            post(handlers::invitations::revoke_invitation_handler),
        )
        .route("/api/users", get(handlers::users::list_users_handler))
        .route(
            "/api/users/{user_id}",
            delete(handlers::users::remove_user_handler),
        )
        .route(
            "/api/users/{user_id}/role",
            put(handlers::users::change_role_handler),
        )
        .route(
            "/api/users/{user_id}/active",
            put(handlers::users::set_active_handler),
        )
        .route(
            "/api/role-assignments",
            post(handlers::users::assign_role_handler),
        )
        .route(
            "/api/role-assignments/{assignment_id}",
            delete(handlers::users::revoke_assignment_handler),
        )
        .route(
            "/api/roles/{role_id}/permissions/{permission_id}",
            post(handlers::users::grant_permission_handler)
                .delete(handlers::users::revoke_permission_handler),
        )
        .route_layer(from_fn(middleware::require_auth));

    let public_routes = Router::new()
        .route("/health", get(handlers::health::health_handler))
        .route("/auth/logout", post(auth::logout_handler));

    Ok(Router::new()
        .merge(build_sign_in_routes(app_state.clone()))
        .merge(build_invitation_validation_routes(app_state.clone()))
        .merge(build_signup_routes(app_state.clone()))
        .merge(public_routes)
        .merge(protected_routes)
        .layer(from_fn_with_state(
            app_state.clone(),
            middleware::require_same_origin_for_mutations,
        ))
        .layer(from_fn_with_state(
            app_state.clone(),
            middleware::require_api_key,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(build_cors_layer(frontend_url)?)
        .layer(session_layer)
        .with_state(app_state))
}
