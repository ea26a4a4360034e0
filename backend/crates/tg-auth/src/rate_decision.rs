use crate::{AuthError, Result as AuthErrorResult};

use std::panic::Location;
use std::time::Duration;

use chrono::{DateTime, Utc};
use error_location::ErrorLocation;
use serde::Serialize;

/// Outcome of one admission check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RateDecision {
    pub allowed: bool,
    pub limit: u32,
    pub remaining: u32,
    pub reset_at: DateTime<Utc>,
}

impl RateDecision {
    /// Whole seconds until `reset_at`, never less than one.
    pub fn retry_after_secs(&self, now: DateTime<Utc>) -> u64 {
        seconds_until(self.reset_at, now)
    }

    /// `Ok` when admitted, otherwise `RateLimitExceeded` for the caller to surface.
    #[track_caller]
    pub fn admit(&self, window: Duration) -> AuthErrorResult<()> {
        if self.allowed {
            return Ok(());
        }

        Err(AuthError::RateLimitExceeded {
            limit: self.limit,
            window_secs: window.as_secs(),
            reset_at: self.reset_at,
            location: ErrorLocation::from(Location::caller()),
        })
    }
}

pub(crate) fn seconds_until(reset_at: DateTime<Utc>, now: DateTime<Utc>) -> u64 {
    let millis = (reset_at - now).num_milliseconds().max(0) as u64;
    millis.div_ceil(1000).max(1)
}
