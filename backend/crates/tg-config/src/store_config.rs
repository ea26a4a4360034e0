use crate::{ConfigError, ConfigErrorResult, DEFAULT_STORE_PATH};

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;

// Store call deadline constraints
pub const MIN_STORE_TIMEOUT_MS: u64 = 10;
pub const MAX_STORE_TIMEOUT_MS: u64 = 9_000;
pub const DEFAULT_STORE_TIMEOUT_MS: u64 = 3_000;

// Sweep interval (0 disables the sweeper)
pub const MIN_SWEEP_INTERVAL_SECS: u64 = 10;
pub const MAX_SWEEP_INTERVAL_SECS: u64 = 86_400;
pub const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 300;

pub const MIN_CAS_ATTEMPTS: u32 = 1;
pub const MAX_CAS_ATTEMPTS: u32 = 64;
pub const DEFAULT_CAS_ATTEMPTS: u32 = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// Process-local; state is lost on restart
    #[default]
    Memory,
    /// SQLite file shared by every process pointed at it
    Sqlite,
}

impl fmt::Display for StoreBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Memory => f.write_str("memory"),
            Self::Sqlite => f.write_str("sqlite"),
        }
    }
}

impl FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "memory" => Ok(Self::Memory),
            "sqlite" => Ok(Self::Sqlite),
            other => Err(format!("unknown store backend '{other}'")),
        }
    }
}

/// Credential store settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    /// SQLite file, relative to the config directory
    pub path: String,
    /// Deadline for every individual store call
    pub timeout_ms: u64,
    /// How often expired entries are purged
    pub sweep_interval_secs: u64,
    /// Optimistic write attempts on a contended entry
    pub max_cas_attempts: u32,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::default(),
            path: String::from(DEFAULT_STORE_PATH),
            timeout_ms: DEFAULT_STORE_TIMEOUT_MS,
            sweep_interval_secs: DEFAULT_SWEEP_INTERVAL_SECS,
            max_cas_attempts: DEFAULT_CAS_ATTEMPTS,
        }
    }
}

impl StoreConfig {
    pub fn validate(&self) -> ConfigErrorResult<()> {
        if self.timeout_ms < MIN_STORE_TIMEOUT_MS || self.timeout_ms > MAX_STORE_TIMEOUT_MS {
            return Err(ConfigError::store(format!(
                "store.timeout_ms must be {}-{}, got {}",
                MIN_STORE_TIMEOUT_MS, MAX_STORE_TIMEOUT_MS, self.timeout_ms
            )));
        }

        if self.sweep_interval_secs != 0
            && (self.sweep_interval_secs < MIN_SWEEP_INTERVAL_SECS
                || self.sweep_interval_secs > MAX_SWEEP_INTERVAL_SECS)
        {
            return Err(ConfigError::store(format!(
                "store.sweep_interval_secs must be 0 (disabled) or {}-{}, got {}",
                MIN_SWEEP_INTERVAL_SECS, MAX_SWEEP_INTERVAL_SECS, self.sweep_interval_secs
            )));
        }

        if self.max_cas_attempts < MIN_CAS_ATTEMPTS || self.max_cas_attempts > MAX_CAS_ATTEMPTS {
            return Err(ConfigError::store(format!(
                "store.max_cas_attempts must be {}-{}, got {}",
                MIN_CAS_ATTEMPTS, MAX_CAS_ATTEMPTS, self.max_cas_attempts
            )));
        }

        // The database lives inside the config dir
        let path = std::path::Path::new(&self.path);
        if self.path.is_empty() || path.is_absolute() || self.path.contains("..") {
            return Err(ConfigError::store(
                "store.path must be relative and cannot contain '..'",
            ));
        }

        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn sweep_interval(&self) -> Option<Duration> {
        (self.sweep_interval_secs > 0).then(|| Duration::from_secs(self.sweep_interval_secs))
    }
}
