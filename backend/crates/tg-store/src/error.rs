use std::panic::Location;

use error_location::ErrorLocation;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("SQLx error: {source} {location}")]
    Sqlx {
        source: sqlx::Error,
        location: ErrorLocation,
    },

    #[error("Migration error: {message} {location}")]
    Migration {
        message: String,
        location: ErrorLocation,
    },

    #[error("Store operation '{operation}' timed out after {timeout_ms}ms {location}")]
    Timeout {
        operation: &'static str,
        timeout_ms: u64,
        location: ErrorLocation,
    },

    #[error("Failed to (de)serialize entry '{key}': {source} {location}")]
    Serialization {
        key: String,
        #[source]
        source: serde_json::Error,
        location: ErrorLocation,
    },

    #[error("Store unavailable: {message} {location}")]
    Unavailable {
        message: String,
        location: ErrorLocation,
    },
}

impl StoreError {
    #[track_caller]
    pub fn unavailable<S: Into<String>>(message: S) -> Self {
        Self::Unavailable {
            message: message.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    /// Whether the failure is transient infrastructure trouble rather than bad data.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Sqlx { source, .. } => !matches!(
                source,
                sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) | sqlx::Error::TypeNotFound { .. }
            ),
            Self::Timeout { .. } | Self::Unavailable { .. } => true,
            Self::Migration { .. } | Self::Serialization { .. } => false,
        }
    }
}

impl From<sqlx::Error> for StoreError {
    #[track_caller]
    fn from(source: sqlx::Error) -> Self {
        Self::Sqlx {
            source,
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for StoreError {
    #[track_caller]
    fn from(e: sqlx::migrate::MigrateError) -> Self {
        Self::Migration {
            message: e.to_string(),
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;
