//! Session lifecycle handlers
//!
//! - `POST /api/v1/session`: identity hand-off, opens a lineage
//! - `POST /api/v1/session/refresh`: rotate a refresh token
//! - `POST /api/v1/session/logout`: revoke the lineage, drop the cookie
//! - `GET /api/v1/session/me`: who the access token says you are

use crate::api::cookies::{access_cookie, clear_access_cookie};
use crate::{ApiError, ApiResult, AppState, AuthenticatedUser};

use axum::{
    Json,
    body::Bytes,
    extract::{State, rejection::JsonRejection},
    http::HeaderMap,
};
use axum_extra::extract::CookieJar;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tg_auth::{RevokeTarget, TokenPair};
use tg_core::IdentityClaims;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogoutRequest {
    #[serde(default)]
    pub refresh_token: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LogoutResponse {
    /// Lineages this call revoked; 0 when already revoked or best-effort failed
    pub revoked: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionInfo {
    pub user: IdentityClaims,
    pub session_id: Uuid,
    pub expires_at: DateTime<Utc>,
}

/// POST /api/v1/session
pub async fn issue(
    State(state): State<AppState>,
    jar: CookieJar,
    headers: HeaderMap,
    payload: Result<Json<IdentityClaims>, JsonRejection>,
) -> ApiResult<(CookieJar, Json<TokenPair>)> {
    if !state.handoff.verify(&headers) {
        log::warn!("Rejected session hand-off without a valid handoff secret");
        return Err(ApiError::unauthenticated("identity hand-off not verified"));
    }

    let Json(identity) = payload.map_err(|e| ApiError::bad_request(e.body_text()))?;
    let pair = state.authority.issue(identity).await?;

    Ok((set_session_cookie(jar, &state, &pair), Json(pair)))
}

/// POST /api/v1/session/refresh
///
/// Never retried here: a second attempt would present a rotated token.
pub async fn refresh(
    State(state): State<AppState>,
    jar: CookieJar,
    payload: Result<Json<RefreshRequest>, JsonRejection>,
) -> ApiResult<(CookieJar, Json<TokenPair>)> {
    let Json(request) = payload.map_err(|e| ApiError::bad_request(e.body_text()))?;
    let pair = state.authority.rotate(&request.refresh_token).await?;

    Ok((set_session_cookie(jar, &state, &pair), Json(pair)))
}

/// POST /api/v1/session/logout
///
/// Revokes the lineage named by the body's refresh token, or else the one
/// behind the access token. The cookie is cleared even if there is nothing to
/// revoke or revocation fails.
pub async fn logout(
    State(state): State<AppState>,
    user: Option<AuthenticatedUser>,
    jar: CookieJar,
    body: Bytes,
) -> ApiResult<(CookieJar, Json<LogoutResponse>)> {
    let request: LogoutRequest = if body.is_empty() {
        LogoutRequest::default()
    } else {
        serde_json::from_slice(&body).map_err(|e| ApiError::bad_request(e.to_string()))?
    };

    let target = match (request.refresh_token.filter(|t| !t.trim().is_empty()), user) {
        (Some(token), _) => Some(RevokeTarget::RefreshToken(token)),
        (None, Some(AuthenticatedUser(grant))) => Some(RevokeTarget::Lineage(grant.lineage_id)),
        (None, None) => None,
    };

    let revoked = match target {
        Some(target) => {
            match state
                .authority
                .revoke_with_retry(target, &state.settings.revocation_retry)
                .await
            {
                Ok(revoked) => revoked,
                Err(e) => {
                    log::warn!("Logout could not revoke session: {}", e);
                    0
                }
            }
        }
        None => 0,
    };

    let cookie = clear_access_cookie(&state.settings.cookie_name, state.settings.secure_cookies);
    Ok((jar.add(cookie), Json(LogoutResponse { revoked })))
}

/// GET /api/v1/session/me
pub async fn me(AuthenticatedUser(grant): AuthenticatedUser) -> Json<SessionInfo> {
    Json(SessionInfo {
        user: grant.claims,
        session_id: grant.lineage_id,
        expires_at: grant.expires_at,
    })
}

fn set_session_cookie(jar: CookieJar, state: &AppState, pair: &TokenPair) -> CookieJar {
    jar.add(access_cookie(
        &state.settings.cookie_name,
        &pair.access_token,
        state.settings.access_ttl,
        state.settings.secure_cookies,
    ))
}
