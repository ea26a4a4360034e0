use crate::{Result as StoreResult, StoreError};

use std::future::Future;
use std::panic::Location;
use std::time::Duration;

use error_location::ErrorLocation;

/// Bound a store call by `timeout`. A call that misses the deadline becomes a
/// retryable `StoreError::Timeout`; the underlying store operation is still
/// atomic, so an abandoned call never leaves a half-written entry behind.
///
/// The error carries the location of the `with_timeout` call, not of this module.
#[track_caller]
pub fn with_timeout<T, F>(
    timeout: Duration,
    operation: &'static str,
    future: F,
) -> impl Future<Output = StoreResult<T>>
where
    F: Future<Output = StoreResult<T>>,
{
    let location = ErrorLocation::from(Location::caller());

    async move {
        match tokio::time::timeout(timeout, future).await {
            Ok(result) => result,
            Err(_) => {
                log::warn!("Store operation '{operation}' exceeded {timeout:?} {location}");
                Err(StoreError::Timeout {
                    operation,
                    timeout_ms: timeout.as_millis() as u64,
                    location,
                })
            }
        }
    }
}
