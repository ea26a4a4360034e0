use crate::{ConfigError, ConfigErrorResult};

use std::time::Duration;

use serde::Deserialize;

pub const DEFAULT_REVOCATION_ATTEMPTS: u32 = 3;
pub const MAX_REVOCATION_ATTEMPTS: u32 = 6;

pub const DEFAULT_FIRST_BACKOFF_MS: u64 = 100;
pub const MAX_FIRST_BACKOFF_MS: u64 = 2_000;

pub const DEFAULT_BACKOFF_CAP_MS: u64 = 2_000;

pub const DEFAULT_BACKOFF_GROWTH: f64 = 2.0;
pub const MAX_BACKOFF_GROWTH: f64 = 4.0;

/// Logout and admin revocation wait inline for this long at most.
pub const MAX_REVOCATION_WAIT: Duration = Duration::from_secs(10);

/// Jitter draws from 50% to 150% of each backoff.
const JITTER_CEILING_PERCENT: u64 = 150;

/// `[revocation_retry]`: how logout and admin revocation ride out a store
/// outage. Rotation is never retried and has no setting here.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RevocationRetryConfig {
    /// Total tries, the first one included
    pub attempts: u32,
    pub first_backoff_ms: u64,
    /// No single backoff grows past this
    pub backoff_cap_ms: u64,
    /// Factor applied to the backoff after each failed try
    pub growth: f64,
    pub jitter: bool,
}

impl Default for RevocationRetryConfig {
    fn default() -> Self {
        Self {
            attempts: DEFAULT_REVOCATION_ATTEMPTS,
            first_backoff_ms: DEFAULT_FIRST_BACKOFF_MS,
            backoff_cap_ms: DEFAULT_BACKOFF_CAP_MS,
            growth: DEFAULT_BACKOFF_GROWTH,
            jitter: true,
        }
    }
}

impl RevocationRetryConfig {
    pub fn first_backoff(&self) -> Duration {
        Duration::from_millis(self.first_backoff_ms)
    }

    pub fn backoff_cap(&self) -> Duration {
        Duration::from_millis(self.backoff_cap_ms)
    }

    /// Longest a request can spend sleeping between tries, jitter included.
    pub fn worst_case_wait(&self) -> Duration {
        let mut backoff = self.first_backoff_ms as f64;
        let mut total_ms = 0;
        for _ in 1..self.attempts {
            total_ms += backoff.min(self.backoff_cap_ms as f64).round() as u64;
            backoff *= self.growth;
        }
        if self.jitter {
            total_ms = total_ms * JITTER_CEILING_PERCENT / 100;
        }
        Duration::from_millis(total_ms)
    }

    pub fn validate(&self) -> ConfigErrorResult<()> {
        if self.attempts == 0 || self.attempts > MAX_REVOCATION_ATTEMPTS {
            return Err(ConfigError::config(format!(
                "revocation_retry.attempts must be 1-{}, got {}",
                MAX_REVOCATION_ATTEMPTS, self.attempts
            )));
        }

        if self.first_backoff_ms == 0 || self.first_backoff_ms > MAX_FIRST_BACKOFF_MS {
            return Err(ConfigError::config(format!(
                "revocation_retry.first_backoff_ms must be 1-{}, got {}",
                MAX_FIRST_BACKOFF_MS, self.first_backoff_ms
            )));
        }

        if self.backoff_cap_ms < self.first_backoff_ms {
            return Err(ConfigError::config(format!(
                "revocation_retry.backoff_cap_ms ({}) is below first_backoff_ms ({})",
                self.backoff_cap_ms, self.first_backoff_ms
            )));
        }

        if !(1.0..=MAX_BACKOFF_GROWTH).contains(&self.growth) {
            return Err(ConfigError::config(format!(
                "revocation_retry.growth must be 1.0-{}, got {}",
                MAX_BACKOFF_GROWTH, self.growth
            )));
        }

        let wait = self.worst_case_wait();
        if wait > MAX_REVOCATION_WAIT {
            return Err(ConfigError::config(format!(
                "revocation_retry could hold a logout for {:?}, limit is {:?}",
                wait, MAX_REVOCATION_WAIT
            )));
        }

        Ok(())
    }
}
