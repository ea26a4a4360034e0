use crate::api::{admin, rate_limit, session};
use crate::{AppState, health};

use axum::{
    Router,
    middleware::from_fn_with_state,
    routing::{get, post},
};
use tower_http::cors::{Any, CorsLayer};

/// Build the application router with all endpoints
pub fn build_router(state: AppState) -> Router {
    // Identity hand-off
    let session_routes: Router<AppState> = Router::new()
        .route("/api/v1/session", post(session::issue))
        .route_layer(from_fn_with_state(state.clone(), rate_limit::limit_session));

    // Rotation gets its own, tighter bucket
    let refresh_routes: Router<AppState> = Router::new()
        .route("/api/v1/session/refresh", post(session::refresh))
        .route_layer(from_fn_with_state(state.clone(), rate_limit::limit_refresh));

    let api_routes: Router<AppState> = Router::new()
        .route("/api/v1/session/me", get(session::me))
        .route("/api/v1/session/logout", post(session::logout))
        .route(
            "/api/v1/admin/users/{user_id}/revoke",
            post(admin::revoke_user),
        )
        .route_layer(from_fn_with_state(state.clone(), rate_limit::limit_api));

    Router::new()
        .merge(session_routes)
        .merge(refresh_routes)
        .merge(api_routes)
        // Health check endpoints
        .route("/health", get(health::health))
        .route("/live", get(health::liveness))
        .route("/ready", get(health::readiness))
        .with_state(state)
        // Cookies are SameSite=Lax, so cross-origin callers use the bearer header
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
}
