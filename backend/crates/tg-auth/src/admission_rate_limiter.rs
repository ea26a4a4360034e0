use crate::session_authority::contention;
use crate::{AuthError, AuthMetrics, RateDecision, Result as AuthErrorResult, store_keys};

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use tg_core::RateWindow;
use tg_store::{CasOutcome, CredentialStore, cas_json, get_json, with_timeout};

const DEFAULT_MAX_ATTEMPTS: u32 = 8;

/// Sliding-log admission control over the credential store.
///
/// Each key owns one `RateWindow` entry. A check reads the window, prunes it,
/// and writes back the new hit with a compare-and-swap; a lost race re-reads
/// and tries again, so two concurrent checks can never both take the last
/// slot. Denials write nothing. Entries expire once their newest hit has left
/// the window, which keeps memory bounded by the number of active keys.
pub struct AdmissionRateLimiter {
    store: Arc<dyn CredentialStore>,
    store_timeout: Duration,
    max_attempts: u32,
    metrics: AuthMetrics,
}

impl AdmissionRateLimiter {
    pub fn new(store: Arc<dyn CredentialStore>, store_timeout: Duration) -> Self {
        Self {
            store,
            store_timeout,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            metrics: AuthMetrics::new(),
        }
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    pub async fn check(
        &self,
        key: &str,
        limit: u32,
        window: Duration,
    ) -> AuthErrorResult<RateDecision> {
        self.check_at(key, limit, window, Utc::now()).await
    }

    pub(crate) async fn check_at(
        &self,
        key: &str,
        limit: u32,
        window: Duration,
        now: DateTime<Utc>,
    ) -> AuthErrorResult<RateDecision> {
        if limit == 0 {
            return Err(AuthError::configuration(format!(
                "rate limit for '{key}' must be at least 1"
            )));
        }

        let store_key = store_keys::rate(key);
        let window_ms = i64::try_from(window.as_millis())
            .unwrap_or(i64::MAX)
            .max(1);
        let now_ms = now.timestamp_millis();
        let mut attempts = 0;

        loop {
            attempts += 1;

            let current = with_timeout(
                self.store_timeout,
                "rate.load_window",
                get_json::<RateWindow>(self.store.as_ref(), &store_key),
            )
            .await
            .inspect_err(|_| self.metrics.store_error("rate.load_window"))?;

            let (mut rate_window, version) = match current {
                // Limit or window changed since the entry was written: start over.
                Some(found) if found.value.limit == limit && found.value.window_ms == window_ms => {
                    (found.value, Some(found.version))
                }
                Some(found) => (RateWindow::new(key, limit, window_ms), Some(found.version)),
                None => (RateWindow::new(key, limit, window_ms), None),
            };

            if !rate_window.try_admit(now_ms) {
                self.metrics.request_limited();
                log::debug!("Rate limit reached for '{}' ({} per {:?})", key, limit, window);
                return Ok(RateDecision {
                    allowed: false,
                    limit,
                    remaining: 0,
                    reset_at: millis_to_datetime(rate_window.reset_at_ms(now_ms)),
                });
            }

            let expires_at = rate_window.idle_after_ms().map(millis_to_datetime);

            let outcome = with_timeout(
                self.store_timeout,
                "rate.record_hit",
                cas_json(self.store.as_ref(), &store_key, version, &rate_window, expires_at),
            )
            .await
            .inspect_err(|_| self.metrics.store_error("rate.record_hit"))?;

            match outcome {
                CasOutcome::Swapped { .. } => {
                    self.metrics.request_admitted();
                    return Ok(RateDecision {
                        allowed: true,
                        limit,
                        remaining: rate_window.remaining(),
                        reset_at: millis_to_datetime(rate_window.reset_at_ms(now_ms)),
                    });
                }
                CasOutcome::Conflict if attempts >= self.max_attempts => {
                    log::warn!("Rate window '{}' contended for {} attempts", key, attempts);
                    return Err(contention(&store_key, attempts));
                }
                CasOutcome::Conflict => continue,
            }
        }
    }
}

fn millis_to_datetime(millis: i64) -> DateTime<Utc> {
    Utc.timestamp_millis_opt(millis)
        .single()
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}
