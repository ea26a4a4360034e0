use std::panic::Location;

use chrono::{DateTime, Utc};
use error_location::ErrorLocation;
use thiserror::Error;
use tg_core::{CoreError, Role};
use tg_store::StoreError;
use uuid::Uuid;

/// The closed set of outcomes the boundary maps onto HTTP statuses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthErrorKind {
    Unauthenticated,
    Forbidden,
    TokenReused,
    RateLimited,
    StoreUnavailable,
    Configuration,
    Internal,
}

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Configuration error: {message} {location}")]
    Configuration {
        message: String,
        location: ErrorLocation,
    },

    #[error("Invalid identity claims: {message} {location}")]
    InvalidClaims {
        message: String,
        location: ErrorLocation,
    },

    #[error("Access token signature is invalid {location}")]
    InvalidSignature { location: ErrorLocation },

    #[error("Token expired {location}")]
    TokenExpired { location: ErrorLocation },

    #[error("Malformed token: {message} {location}")]
    MalformedToken {
        message: String,
        location: ErrorLocation,
    },

    #[error("Refresh token not found {location}")]
    RefreshNotFound { location: ErrorLocation },

    #[error("Refresh token is not active {location}")]
    RefreshNotActive { location: ErrorLocation },

    #[error("Refresh token expired {location}")]
    RefreshExpired { location: ErrorLocation },

    #[error("Refresh token reuse detected, lineage {lineage_id} revoked {location}")]
    TokenReused {
        lineage_id: Uuid,
        location: ErrorLocation,
    },

    #[error("Role {actual} lacks permission, requires {required} {location}")]
    Forbidden {
        required: Role,
        actual: Role,
        location: ErrorLocation,
    },

    #[error("Rate limit exceeded: {limit} requests per {window_secs}s, resets at {reset_at} {location}")]
    RateLimitExceeded {
        limit: u32,
        window_secs: u64,
        reset_at: DateTime<Utc>,
        location: ErrorLocation,
    },

    #[error("Credential store unavailable: {source} {location}")]
    StoreUnavailable {
        #[source]
        source: StoreError,
        location: ErrorLocation,
    },

    #[error("Gave up on '{key}' after {attempts} conflicting writes {location}")]
    StoreContention {
        key: String,
        attempts: u32,
        location: ErrorLocation,
    },

    #[error("Internal error: {message} {location}")]
    Internal {
        message: String,
        location: ErrorLocation,
    },
}

impl AuthError {
    pub fn kind(&self) -> AuthErrorKind {
        match self {
            Self::Configuration { .. } => AuthErrorKind::Configuration,
            Self::InvalidClaims { .. }
            | Self::InvalidSignature { .. }
            | Self::TokenExpired { .. }
            | Self::MalformedToken { .. }
            | Self::RefreshNotFound { .. }
            | Self::RefreshNotActive { .. }
            | Self::RefreshExpired { .. } => AuthErrorKind::Unauthenticated,
            Self::TokenReused { .. } => AuthErrorKind::TokenReused,
            Self::Forbidden { .. } => AuthErrorKind::Forbidden,
            Self::RateLimitExceeded { .. } => AuthErrorKind::RateLimited,
            Self::StoreUnavailable { .. } | Self::StoreContention { .. } => {
                AuthErrorKind::StoreUnavailable
            }
            Self::Internal { .. } => AuthErrorKind::Internal,
        }
    }

    pub fn is_retryable(&self) -> bool {
        match self {
            Self::StoreUnavailable { source, .. } => source.is_retryable(),
            Self::StoreContention { .. } => true,
            _ => false,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Configuration { .. } => "CONFIGURATION_ERROR",
            Self::InvalidClaims { .. } => "INVALID_CLAIMS",
            Self::InvalidSignature { .. } => "INVALID_SIGNATURE",
            Self::TokenExpired { .. } => "TOKEN_EXPIRED",
            Self::MalformedToken { .. } => "MALFORMED_TOKEN",
            Self::RefreshNotFound { .. } => "REFRESH_NOT_FOUND",
            Self::RefreshNotActive { .. } => "REFRESH_NOT_ACTIVE",
            Self::RefreshExpired { .. } => "REFRESH_EXPIRED",
            Self::TokenReused { .. } => "TOKEN_REUSED",
            Self::Forbidden { .. } => "FORBIDDEN",
            Self::RateLimitExceeded { .. } => "RATE_LIMIT_EXCEEDED",
            Self::StoreUnavailable { .. } => "STORE_UNAVAILABLE",
            Self::StoreContention { .. } => "STORE_CONTENTION",
            Self::Internal { .. } => "INTERNAL_ERROR",
        }
    }

    /// Seconds a rate-limited caller should wait; `None` for every other error.
    pub fn retry_after_secs(&self, now: DateTime<Utc>) -> Option<u64> {
        match self {
            Self::RateLimitExceeded { reset_at, .. } => {
                Some(crate::rate_decision::seconds_until(*reset_at, now))
            }
            _ => None,
        }
    }

    #[track_caller]
    pub fn configuration<S: Into<String>>(message: S) -> Self {
        Self::Configuration {
            message: message.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal {
            message: message.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

impl From<StoreError> for AuthError {
    #[track_caller]
    fn from(source: StoreError) -> Self {
        Self::StoreUnavailable {
            source,
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

impl From<CoreError> for AuthError {
    #[track_caller]
    fn from(e: CoreError) -> Self {
        Self::InvalidClaims {
            message: e.to_string(),
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

pub type Result<T> = std::result::Result<T, AuthError>;
