//! Admission control middleware
//!
//! One limit per route group. The bucket key is `<group>:<client>` so a
//! client hammering `/api/v1/session/refresh` does not exhaust its API quota.

use crate::api::error::ApiError;
use crate::{AppState, client_key};

use axum::{
    extract::{Request, State},
    http::HeaderValue,
    middleware::Next,
    response::Response,
};
use tg_config::RouteLimit;

const LIMIT_HEADER: &str = "x-ratelimit-limit";
const REMAINING_HEADER: &str = "x-ratelimit-remaining";

/// Guards `POST /api/v1/session`.
pub async fn limit_session(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let limit = state.settings.rate_limit.session;
    enforce(&state, "session", limit, request, next).await
}

/// Guards `POST /api/v1/session/refresh`.
pub async fn limit_refresh(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let limit = state.settings.rate_limit.refresh;
    enforce(&state, "refresh", limit, request, next).await
}

/// Guards the remaining `/api/v1` routes.
pub async fn limit_api(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let limit = state.settings.rate_limit.api;
    enforce(&state, "api", limit, request, next).await
}

async fn enforce(
    state: &AppState,
    group: &str,
    limit: RouteLimit,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if !state.settings.rate_limit.enabled {
        return Ok(next.run(request).await);
    }

    let client = client_key(
        request.headers(),
        request.extensions(),
        state.settings.rate_limit.trust_forwarded_for,
    );
    let key = format!("{group}:{client}");

    // A limiter that cannot reach its store refuses rather than admits
    let decision = state
        .limiter
        .check(&key, limit.max_requests, limit.window())
        .await
        .map_err(ApiError::from)?;

    if let Err(denied) = decision.admit(limit.window()) {
        log::info!("Rate limited {} ({} per {}s)", key, limit.max_requests, limit.window_secs);
        return Err(ApiError::from(denied));
    }

    let mut response = next.run(request).await;
    let headers = response.headers_mut();
    headers.insert(LIMIT_HEADER, HeaderValue::from(decision.limit));
    headers.insert(REMAINING_HEADER, HeaderValue::from(decision.remaining));

    Ok(response)
}
