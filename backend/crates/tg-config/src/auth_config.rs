use crate::{
    ConfigError, ConfigErrorResult, DEFAULT_COOKIE_NAME, DEFAULT_HANDOFF_SECRET,
    DEFAULT_JWT_SECRET, MIN_SECRET_LENGTH,
};

use std::time::Duration;

use serde::Deserialize;

pub const MIN_ACCESS_TTL_SECS: u64 = 1;
pub const MAX_ACCESS_TTL_SECS: u64 = 24 * 60 * 60;
pub const DEFAULT_ACCESS_TTL_SECS: u64 = 15 * 60;

pub const MAX_REFRESH_TTL_SECS: u64 = 365 * 24 * 60 * 60;
pub const DEFAULT_REFRESH_TTL_SECS: u64 = 7 * 24 * 60 * 60;

pub const MAX_LEEWAY_SECS: u64 = 300;
pub const DEFAULT_LEEWAY_SECS: u64 = 0;

/// Credential issuance settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// HS256 signing secret for access tokens
    pub jwt_secret: String,
    /// Shared with the identity provider for the session hand-off
    pub handoff_secret: String,
    pub access_ttl_secs: u64,
    pub refresh_ttl_secs: u64,
    /// Clock-skew tolerance on access-token expiry
    pub leeway_secs: u64,
    /// Name of the HTTP-only cookie carrying the access token
    pub cookie_name: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: String::from(DEFAULT_JWT_SECRET),
            handoff_secret: String::from(DEFAULT_HANDOFF_SECRET),
            access_ttl_secs: DEFAULT_ACCESS_TTL_SECS,
            refresh_ttl_secs: DEFAULT_REFRESH_TTL_SECS,
            leeway_secs: DEFAULT_LEEWAY_SECS,
            cookie_name: String::from(DEFAULT_COOKIE_NAME),
        }
    }
}

impl AuthConfig {
    pub fn validate(&self) -> ConfigErrorResult<()> {
        Self::validate_secret("auth.jwt_secret", &self.jwt_secret)?;
        Self::validate_secret("auth.handoff_secret", &self.handoff_secret)?;

        if self.jwt_secret == self.handoff_secret {
            return Err(ConfigError::auth(
                "auth.jwt_secret and auth.handoff_secret must differ",
            ));
        }

        if self.access_ttl_secs < MIN_ACCESS_TTL_SECS || self.access_ttl_secs > MAX_ACCESS_TTL_SECS
        {
            return Err(ConfigError::auth(format!(
                "auth.access_ttl_secs must be {}-{}, got {}",
                MIN_ACCESS_TTL_SECS, MAX_ACCESS_TTL_SECS, self.access_ttl_secs
            )));
        }

        if self.refresh_ttl_secs <= self.access_ttl_secs
            || self.refresh_ttl_secs > MAX_REFRESH_TTL_SECS
        {
            return Err(ConfigError::auth(format!(
                "auth.refresh_ttl_secs must be greater than access_ttl_secs ({}) and at most {}, got {}",
                self.access_ttl_secs, MAX_REFRESH_TTL_SECS, self.refresh_ttl_secs
            )));
        }

        if self.leeway_secs > MAX_LEEWAY_SECS {
            return Err(ConfigError::auth(format!(
                "auth.leeway_secs must be at most {}, got {}",
                MAX_LEEWAY_SECS, self.leeway_secs
            )));
        }

        if self.cookie_name.is_empty()
            || !self
                .cookie_name
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-')
        {
            return Err(ConfigError::auth(format!(
                "auth.cookie_name must be non-empty and contain only [A-Za-z0-9_-], got '{}'",
                self.cookie_name
            )));
        }

        Ok(())
    }

    fn validate_secret(name: &str, secret: &str) -> ConfigErrorResult<()> {
        if secret.trim().is_empty() {
            return Err(ConfigError::auth(format!("{name} cannot be empty")));
        }

        if secret.len() < MIN_SECRET_LENGTH {
            return Err(ConfigError::auth(format!(
                "{name} must be at least {MIN_SECRET_LENGTH} characters"
            )));
        }

        Ok(())
    }

    pub fn uses_default_jwt_secret(&self) -> bool {
        self.jwt_secret == DEFAULT_JWT_SECRET
    }

    pub fn uses_default_handoff_secret(&self) -> bool {
        self.handoff_secret == DEFAULT_HANDOFF_SECRET
    }

    pub fn access_ttl(&self) -> Duration {
        Duration::from_secs(self.access_ttl_secs)
    }

    pub fn refresh_ttl(&self) -> Duration {
        Duration::from_secs(self.refresh_ttl_secs)
    }
}
