mod auth_config;
mod config;
mod environment;
mod error;
mod log_level;
mod logging_config;
mod rate_limit_config;
mod revocation_retry_config;
mod server_config;
mod store_config;

pub use auth_config::AuthConfig;
pub use config::Config;
pub use environment::Environment;
pub use error::{ConfigError, ConfigErrorResult};
pub use log_level::LogLevel;
pub use logging_config::LoggingConfig;
pub use rate_limit_config::{RateLimitConfig, RouteLimit};
pub use revocation_retry_config::{MAX_REVOCATION_WAIT, RevocationRetryConfig};
pub use server_config::ServerConfig;
pub use store_config::{StoreBackend, StoreConfig};

const CONFIG_DIR_ENV: &str = "TG_CONFIG_DIR";
const DEFAULT_CONFIG_DIR: &str = ".tg";
const CONFIG_FILENAME: &str = "config.toml";

const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 8000;
const MIN_PORT: u16 = 1024;

// Development-only secrets. Non-empty so a fresh checkout runs; staging warns
// about them and production refuses to start with them.
const DEFAULT_JWT_SECRET: &str = "tollgate-dev-signing-secret-do-not-deploy";
const DEFAULT_HANDOFF_SECRET: &str = "tollgate-dev-handoff-secret-do-not-deploy";
const MIN_SECRET_LENGTH: usize = 32;

const DEFAULT_COOKIE_NAME: &str = "tg_session";

const DEFAULT_STORE_PATH: &str = "credentials.db";

const DEFAULT_LOG_LEVEL: log::LevelFilter = log::LevelFilter::Info;
const DEFAULT_LOG_DIRECTORY: &str = "log";
const DEFAULT_LOG_COLORED: bool = true;

#[cfg(test)]
mod tests;
