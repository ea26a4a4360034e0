use crate::{ConfigError, ConfigErrorResult};

use std::time::Duration;

use serde::Deserialize;

// Rate limit constraints
pub const MIN_RATE_LIMIT_REQUESTS: u32 = 1;
pub const MAX_RATE_LIMIT_REQUESTS: u32 = 10_000;

pub const MIN_RATE_LIMIT_WINDOW_SECS: u64 = 1;
pub const MAX_RATE_LIMIT_WINDOW_SECS: u64 = 3_600;

/// A limit/window pair for one class of routes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct RouteLimit {
    /// Maximum requests per window
    pub max_requests: u32,
    /// Window duration in seconds
    pub window_secs: u64,
}

impl RouteLimit {
    pub const fn new(max_requests: u32, window_secs: u64) -> Self {
        Self {
            max_requests,
            window_secs,
        }
    }

    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }

    fn validate(&self, name: &str) -> ConfigErrorResult<()> {
        if self.max_requests < MIN_RATE_LIMIT_REQUESTS
            || self.max_requests > MAX_RATE_LIMIT_REQUESTS
        {
            return Err(ConfigError::rate_limit(format!(
                "rate_limit.{}.max_requests must be {}-{}, got {}",
                name, MIN_RATE_LIMIT_REQUESTS, MAX_RATE_LIMIT_REQUESTS, self.max_requests
            )));
        }

        if self.window_secs < MIN_RATE_LIMIT_WINDOW_SECS
            || self.window_secs > MAX_RATE_LIMIT_WINDOW_SECS
        {
            return Err(ConfigError::rate_limit(format!(
                "rate_limit.{}.window_secs must be {}-{}, got {}",
                name, MIN_RATE_LIMIT_WINDOW_SECS, MAX_RATE_LIMIT_WINDOW_SECS, self.window_secs
            )));
        }

        Ok(())
    }
}

/// Per-route-class admission limits, keyed by client address.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    pub enabled: bool,
    /// Key clients by the first `X-Forwarded-For` hop. Only safe behind a
    /// proxy that overwrites the header.
    pub trust_forwarded_for: bool,
    /// Session issuance (login hand-off)
    pub session: RouteLimit,
    /// Refresh-token rotation
    pub refresh: RouteLimit,
    /// Every other API route
    pub api: RouteLimit,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            trust_forwarded_for: false,
            session: RouteLimit::new(10, 60),
            refresh: RouteLimit::new(30, 60),
            api: RouteLimit::new(300, 60),
        }
    }
}

impl RateLimitConfig {
    pub fn validate(&self) -> ConfigErrorResult<()> {
        self.session.validate("session")?;
        self.refresh.validate("refresh")?;
        self.api.validate("api")?;

        Ok(())
    }
}
