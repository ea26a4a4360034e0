use crate::{AuthError, Result as AuthErrorResult};

use std::time::Duration;

use chrono::TimeDelta;

const DEFAULT_ACCESS_TTL_SECS: u64 = 15 * 60;
const DEFAULT_REFRESH_TTL_SECS: u64 = 7 * 24 * 60 * 60;
const DEFAULT_STORE_TIMEOUT_MS: u64 = 3_000;
const DEFAULT_MAX_CAS_ATTEMPTS: u32 = 8;
const MAX_TTL: Duration = Duration::from_secs(366 * 24 * 60 * 60);

/// Runtime settings for the session authority and rate limiter.
#[derive(Debug, Clone)]
pub struct AuthorityConfig {
    /// Lifetime of access tokens
    pub access_ttl: Duration,
    /// Lifetime of each refresh token in a lineage
    pub refresh_ttl: Duration,
    /// Deadline applied to every credential-store call
    pub store_timeout: Duration,
    /// Optimistic write attempts before giving up on a contended entry
    pub max_cas_attempts: u32,
}

impl Default for AuthorityConfig {
    fn default() -> Self {
        Self {
            access_ttl: Duration::from_secs(DEFAULT_ACCESS_TTL_SECS),
            refresh_ttl: Duration::from_secs(DEFAULT_REFRESH_TTL_SECS),
            store_timeout: Duration::from_millis(DEFAULT_STORE_TIMEOUT_MS),
            max_cas_attempts: DEFAULT_MAX_CAS_ATTEMPTS,
        }
    }
}

impl AuthorityConfig {
    #[track_caller]
    pub fn validate(&self) -> AuthErrorResult<()> {
        if self.access_ttl.is_zero() || self.access_ttl > MAX_TTL {
            return Err(AuthError::configuration(format!(
                "access_ttl must be between 1s and {}s",
                MAX_TTL.as_secs()
            )));
        }
        if self.refresh_ttl.is_zero() || self.refresh_ttl > MAX_TTL {
            return Err(AuthError::configuration(format!(
                "refresh_ttl must be between 1s and {}s",
                MAX_TTL.as_secs()
            )));
        }
        if self.store_timeout.is_zero() {
            return Err(AuthError::configuration("store_timeout must be positive"));
        }
        if self.max_cas_attempts == 0 {
            return Err(AuthError::configuration("max_cas_attempts must be at least 1"));
        }

        Ok(())
    }

    pub(crate) fn access_delta(&self) -> TimeDelta {
        to_delta(self.access_ttl)
    }

    pub(crate) fn refresh_delta(&self) -> TimeDelta {
        to_delta(self.refresh_ttl)
    }
}

// Bounded by `validate`.
fn to_delta(duration: Duration) -> TimeDelta {
    TimeDelta::from_std(duration.min(MAX_TTL)).unwrap_or(TimeDelta::zero())
}
