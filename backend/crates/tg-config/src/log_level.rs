use crate::DEFAULT_LOG_LEVEL;

use std::fmt;
use std::str::FromStr;

use log::LevelFilter;
use serde::Deserialize;

/// Service verbosity.
///
/// Accepts any `log` level name in any case, plus `warning` and `none`.
/// An unknown name in `config.toml` is a parse error; an unknown
/// `TG_LOG_LEVEL` is ignored with a warning like every other override.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub struct LogLevel(LevelFilter);

impl LogLevel {
    pub const fn new(filter: LevelFilter) -> Self {
        Self(filter)
    }

    pub const fn filter(self) -> LevelFilter {
        self.0
    }

    /// Ceiling for chatty dependency targets (sqlx, hyper, tower_http):
    /// never more verbose than `warn`, and never more verbose than ours.
    pub fn dependency_filter(self) -> LevelFilter {
        self.0.min(LevelFilter::Warn)
    }
}

impl Default for LogLevel {
    fn default() -> Self {
        Self(DEFAULT_LOG_LEVEL)
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_ascii_lowercase();
        let filter = match name.as_str() {
            "warning" => LevelFilter::Warn,
            "none" => LevelFilter::Off,
            other => LevelFilter::from_str(other)
                .map_err(|_| format!("unknown log level '{}'", s.trim()))?,
        };
        Ok(Self(filter))
    }
}

impl TryFrom<String> for LogLevel {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        level.0
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.as_str().to_ascii_lowercase())
    }
}
