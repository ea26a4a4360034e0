use crate::api::identity_handoff::{IdentityHandoff, SharedSecretHandoff};
use crate::error::Result as ServerErrorResult;

use std::sync::Arc;
use std::time::Duration;

use tg_auth::{
    AdmissionRateLimiter, AuthorityConfig, RevocationRetry, SessionAuthority, TokenCodec,
};
use tg_config::{Config, RateLimitConfig};
use tg_store::CredentialStore;

/// Boundary-level knobs the handlers and middleware read on every request.
#[derive(Debug, Clone)]
pub struct BoundarySettings {
    pub cookie_name: String,
    /// `Secure` attribute on the session cookie
    pub secure_cookies: bool,
    pub access_ttl: Duration,
    pub rate_limit: RateLimitConfig,
    /// Logout and admin revocation
    pub revocation_retry: RevocationRetry,
    pub store_timeout: Duration,
}

impl BoundarySettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            cookie_name: config.auth.cookie_name.clone(),
            secure_cookies: config.server.environment.is_production(),
            access_ttl: config.auth.access_ttl(),
            rate_limit: config.rate_limit.clone(),
            revocation_retry: RevocationRetry::from(&config.revocation_retry),
            store_timeout: config.store.timeout(),
        }
    }
}

/// Shared state for every route.
#[derive(Clone)]
pub struct AppState {
    pub authority: Arc<SessionAuthority>,
    pub limiter: Arc<AdmissionRateLimiter>,
    pub store: Arc<dyn CredentialStore>,
    pub handoff: Arc<dyn IdentityHandoff>,
    pub settings: Arc<BoundarySettings>,
}

impl AppState {
    /// Wire the authority, limiter and identity hand-off over one store.
    pub fn from_config(config: &Config, store: Arc<dyn CredentialStore>) -> ServerErrorResult<Self> {
        config.ensure_production_secrets()?;

        let codec = TokenCodec::new(config.auth.jwt_secret.as_bytes(), config.auth.leeway_secs)?;
        let authority_config = AuthorityConfig {
            access_ttl: config.auth.access_ttl(),
            refresh_ttl: config.auth.refresh_ttl(),
            store_timeout: config.store.timeout(),
            max_cas_attempts: config.store.max_cas_attempts,
        };
        let authority = SessionAuthority::new(store.clone(), codec, authority_config)?;
        let limiter = AdmissionRateLimiter::new(store.clone(), config.store.timeout())
            .with_max_attempts(config.store.max_cas_attempts);

        Ok(Self {
            authority: Arc::new(authority),
            limiter: Arc::new(limiter),
            store,
            handoff: Arc::new(SharedSecretHandoff::new(&config.auth.handoff_secret)),
            settings: Arc::new(BoundarySettings::from_config(config)),
        })
    }
}
