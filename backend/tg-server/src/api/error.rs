//! REST API error types
//!
//! Every failure leaves the service as the same JSON envelope. Credential
//! failures collapse into one 401 message so clients cannot tell an expired
//! token from a revoked, reused or forged one.

use std::panic::Location;

use axum::{
    Json,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use error_location::ErrorLocation;
use serde::Serialize;
use tg_auth::{AuthError, AuthErrorKind};
use thiserror::Error;

pub const UNAUTHENTICATED_MESSAGE: &str = "invalid or expired session";

/// JSON error response body
#[derive(Debug, Serialize)]
pub struct ApiErrorResponse {
    pub error: ApiErrorBody,
}

#[derive(Debug, Serialize)]
pub struct ApiErrorBody {
    /// Machine-readable error code (e.g., "UNAUTHENTICATED", "RATE_LIMITED")
    pub code: String,
    /// Human-readable error message
    pub message: String,
    /// Seconds until a retry may succeed
    #[serde(rename = "retryAfter", skip_serializing_if = "Option::is_none")]
    pub retry_after: Option<u64>,
}

/// API errors with associated HTTP status codes
#[derive(Debug, Error)]
pub enum ApiError {
    /// Missing, invalid, expired or revoked credential (401)
    #[error("Unauthenticated: {reason} {location}")]
    Unauthenticated {
        /// Logged, never sent
        reason: String,
        location: ErrorLocation,
    },

    /// Valid credential, insufficient role (403)
    #[error("Forbidden: {reason} {location}")]
    Forbidden {
        reason: String,
        location: ErrorLocation,
    },

    /// Admission quota exhausted (429)
    #[error("Rate limited: {limit} per window, retry in {retry_after_secs}s {location}")]
    RateLimited {
        limit: u32,
        retry_after_secs: u64,
        location: ErrorLocation,
    },

    /// The credential store could not be reached; the request was not decided (503)
    #[error("Store unavailable: {reason} {location}")]
    StoreUnavailable {
        reason: String,
        location: ErrorLocation,
    },

    /// Bad request (400)
    #[error("Bad request: {message} {location}")]
    BadRequest {
        message: String,
        location: ErrorLocation,
    },

    /// Internal server error (500)
    #[error("Internal error: {message} {location}")]
    Internal {
        message: String,
        location: ErrorLocation,
    },
}

impl ApiError {
    #[track_caller]
    pub fn unauthenticated<S: Into<String>>(reason: S) -> Self {
        ApiError::Unauthenticated {
            reason: reason.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn bad_request<S: Into<String>>(message: S) -> Self {
        ApiError::BadRequest {
            message: message.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Unauthenticated { .. } => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden { .. } => StatusCode::FORBIDDEN,
            ApiError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            ApiError::StoreUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            ApiError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            log::error!("{}", self);
        } else {
            log::debug!("{}", self);
        }

        let (body, retry_after, limit) = match self {
            ApiError::Unauthenticated { .. } => (
                body("UNAUTHENTICATED", UNAUTHENTICATED_MESSAGE, None),
                None,
                None,
            ),
            ApiError::Forbidden { .. } => (
                body("FORBIDDEN", "insufficient permissions", None),
                None,
                None,
            ),
            ApiError::RateLimited {
                limit,
                retry_after_secs,
                ..
            } => (
                body(
                    "RATE_LIMITED",
                    "too many requests",
                    Some(retry_after_secs),
                ),
                Some(retry_after_secs),
                Some(limit),
            ),
            ApiError::StoreUnavailable { .. } => (
                body(
                    "STORE_UNAVAILABLE",
                    "service temporarily unavailable, retry shortly",
                    Some(1),
                ),
                Some(1),
                None,
            ),
            ApiError::BadRequest { message, .. } => {
                (body("BAD_REQUEST", &message, None), None, None)
            }
            ApiError::Internal { .. } => (
                body("INTERNAL_ERROR", "internal server error", None),
                None,
                None,
            ),
        };

        let mut response = (status, Json(ApiErrorResponse { error: body })).into_response();
        let headers = response.headers_mut();
        if let Some(secs) = retry_after {
            headers.insert(header::RETRY_AFTER, HeaderValue::from(secs));
        }
        if let Some(limit) = limit {
            headers.insert("x-ratelimit-limit", HeaderValue::from(limit));
            headers.insert("x-ratelimit-remaining", HeaderValue::from(0u32));
        }
        if status == StatusCode::UNAUTHORIZED {
            headers.insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }

        response
    }
}

fn body(code: &str, message: &str, retry_after: Option<u64>) -> ApiErrorBody {
    ApiErrorBody {
        code: code.into(),
        message: message.into(),
        retry_after,
    }
}

/// Collapse the authority's outcomes onto HTTP statuses.
impl From<AuthError> for ApiError {
    #[track_caller]
    fn from(e: AuthError) -> Self {
        let location = ErrorLocation::from(Location::caller());

        // Claims come from the trusted identity hand-off, so a bad payload is the caller's bug
        if let AuthError::InvalidClaims { message, .. } = &e {
            return ApiError::BadRequest {
                message: message.clone(),
                location,
            };
        }

        match e.kind() {
            AuthErrorKind::Unauthenticated | AuthErrorKind::TokenReused => {
                ApiError::Unauthenticated {
                    reason: e.to_string(),
                    location,
                }
            }
            AuthErrorKind::Forbidden => ApiError::Forbidden {
                reason: e.to_string(),
                location,
            },
            AuthErrorKind::RateLimited => {
                let limit = match &e {
                    AuthError::RateLimitExceeded { limit, .. } => *limit,
                    _ => 0,
                };
                ApiError::RateLimited {
                    limit,
                    retry_after_secs: e.retry_after_secs(chrono::Utc::now()).unwrap_or(1),
                    location,
                }
            }
            AuthErrorKind::StoreUnavailable => ApiError::StoreUnavailable {
                reason: e.to_string(),
                location,
            },
            AuthErrorKind::Configuration | AuthErrorKind::Internal => ApiError::Internal {
                message: e.to_string(),
                location,
            },
        }
    }
}

pub type Result<T> = std::result::Result<T, ApiError>;
