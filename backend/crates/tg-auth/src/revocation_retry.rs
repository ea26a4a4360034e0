use crate::{AuthError, AuthErrorKind, Result as AuthErrorResult};

use std::future::Future;
use std::time::Duration;

use tg_config::RevocationRetryConfig;
use tokio::time::sleep;

/// How revocation rides out a store outage.
///
/// Revocation is idempotent, so a try that failed on an unreachable store can
/// be repeated. Only `StoreUnavailable` outcomes are retried; anything about
/// the credential itself comes back on the first try. Rotation has no retry
/// path: a repeated rotation would present an already-rotated token and trip
/// reuse detection.
#[derive(Debug, Clone, PartialEq)]
pub struct RevocationRetry {
    /// Total tries, the first one included
    pub attempts: u32,
    pub first_backoff: Duration,
    pub backoff_cap: Duration,
    pub growth: f64,
    /// Spread each backoff over 50%..150% so clients recovering together do
    /// not hit the store in lockstep
    pub jitter: bool,
}

impl Default for RevocationRetry {
    fn default() -> Self {
        Self::from(&RevocationRetryConfig::default())
    }
}

impl From<&RevocationRetryConfig> for RevocationRetry {
    fn from(config: &RevocationRetryConfig) -> Self {
        Self {
            attempts: config.attempts.max(1),
            first_backoff: config.first_backoff(),
            backoff_cap: config.backoff_cap(),
            growth: config.growth,
            jitter: config.jitter,
        }
    }
}

impl RevocationRetry {
    /// A single try, for callers that must not wait.
    pub fn once() -> Self {
        Self {
            attempts: 1,
            ..Self::default()
        }
    }

    /// Backoff before retry number `retry` (1-based), before jitter.
    pub fn backoff(&self, retry: u32) -> Duration {
        let exponent = retry.saturating_sub(1).min(i32::MAX as u32) as i32;
        let grown = self.first_backoff.as_secs_f64() * self.growth.powi(exponent);
        Duration::try_from_secs_f64(grown).map_or(self.backoff_cap, |d| d.min(self.backoff_cap))
    }

    fn jittered(&self, backoff: Duration) -> Duration {
        if !self.jitter {
            return backoff;
        }
        backoff.mul_f64(0.5 + rand::random::<f64>())
    }

    pub fn should_retry(error: &AuthError) -> bool {
        error.kind() == AuthErrorKind::StoreUnavailable && error.is_retryable()
    }

    /// Run `attempt` until it succeeds, fails for a reason other than the
    /// store, or the tries run out.
    pub(crate) async fn run<T, F, Fut>(&self, what: &str, mut attempt: F) -> AuthErrorResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = AuthErrorResult<T>>,
    {
        let mut tries = 0;

        loop {
            tries += 1;

            let error = match attempt().await {
                Ok(value) => {
                    if tries > 1 {
                        log::info!("{what} went through on try {tries} after a store outage");
                    }
                    return Ok(value);
                }
                Err(error) => error,
            };

            if !Self::should_retry(&error) {
                return Err(error);
            }
            if tries >= self.attempts {
                log::warn!("{what} gave up after {tries} tries: {error}");
                return Err(error);
            }

            let wait = self.jittered(self.backoff(tries));
            log::debug!("{what} try {tries} hit the store outage ({error}), next in {wait:?}");
            sleep(wait).await;
        }
    }
}
