//! Axum extractor for session authentication

use crate::{ApiError, AppState};

use std::future::Future;

use axum::{
    extract::{FromRequestParts, OptionalFromRequestParts},
    http::{HeaderMap, header, request::Parts},
};
use axum_extra::extract::CookieJar;
use tg_auth::{AccessGrant, CredentialSource, DEFAULT_CREDENTIAL_SOURCES};

/// The caller behind a valid access token.
///
/// Looks for the session cookie first, then `Authorization: Bearer`. Every
/// failure is the same 401; the reason only reaches the debug log.
pub struct AuthenticatedUser(pub AccessGrant);

impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = ApiError;

    #[allow(clippy::manual_async_fn)]
    fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> impl Future<Output = Result<Self, Self::Rejection>> + Send {
        async move {
            match authenticate(parts, state) {
                Some(grant) => Ok(AuthenticatedUser(grant)),
                None => Err(ApiError::unauthenticated("no valid access token presented")),
            }
        }
    }
}

/// `Option<AuthenticatedUser>` never rejects; an invalid credential is `None`.
impl OptionalFromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = ApiError;

    #[allow(clippy::manual_async_fn)]
    fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> impl Future<Output = Result<Option<Self>, Self::Rejection>> + Send {
        async move { Ok(authenticate(parts, state).map(AuthenticatedUser)) }
    }
}

fn authenticate(parts: &Parts, state: &AppState) -> Option<AccessGrant> {
    let jar = CookieJar::from_headers(&parts.headers);
    let cookie_name = state.settings.cookie_name.as_str();

    state
        .authority
        .validate_source(&DEFAULT_CREDENTIAL_SOURCES, |source| match source {
            CredentialSource::Cookie => jar.get(cookie_name).map(|c| c.value()),
            CredentialSource::BearerHeader => bearer_token(&parts.headers),
        })
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;

    scheme.eq_ignore_ascii_case("bearer").then_some(token.trim())
}
