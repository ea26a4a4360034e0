//! JSON-typed access on top of the string-valued store contract.

use crate::{CasOutcome, CredentialStore, Result as StoreResult, StoreError};

use std::future::Future;
use std::panic::Location;

use chrono::{DateTime, Utc};
use error_location::ErrorLocation;
use serde::Serialize;
use serde::de::DeserializeOwned;

#[derive(Debug, Clone, PartialEq)]
pub struct Versioned<T> {
    pub value: T,
    pub version: u64,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Read and decode `key`. Decode failures point at the caller.
#[track_caller]
pub fn get_json<T: DeserializeOwned>(
    store: &dyn CredentialStore,
    key: &str,
) -> impl Future<Output = StoreResult<Option<Versioned<T>>>> {
    let location = ErrorLocation::from(Location::caller());

    async move {
        let Some(entry) = store.get(key).await? else {
            return Ok(None);
        };

        let value =
            serde_json::from_str(&entry.value).map_err(|source| StoreError::Serialization {
                key: key.to_string(),
                source,
                location,
            })?;

        Ok(Some(Versioned {
            value,
            version: entry.version,
            expires_at: entry.expires_at,
        }))
    }
}

/// Encode `value` and compare-and-swap it under `key`.
#[track_caller]
pub fn cas_json<T: Serialize + Sync>(
    store: &dyn CredentialStore,
    key: &str,
    expected_version: Option<u64>,
    value: &T,
    expires_at: Option<DateTime<Utc>>,
) -> impl Future<Output = StoreResult<CasOutcome>> {
    let location = ErrorLocation::from(Location::caller());

    async move {
        let encoded = serde_json::to_string(value).map_err(|source| StoreError::Serialization {
            key: key.to_string(),
            source,
            location,
        })?;

        store
            .compare_and_swap(key, expected_version, encoded, expires_at)
            .await
    }
}
