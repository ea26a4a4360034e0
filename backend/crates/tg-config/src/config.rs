use crate::{
    AuthConfig, CONFIG_DIR_ENV, CONFIG_FILENAME, ConfigError, ConfigErrorResult,
    DEFAULT_CONFIG_DIR, LoggingConfig, RateLimitConfig, RevocationRetryConfig, ServerConfig,
    StoreConfig,
};

use std::path::{Path, PathBuf};

use log::{info, warn};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub auth: AuthConfig,
    pub store: StoreConfig,
    pub rate_limit: RateLimitConfig,
    pub revocation_retry: RevocationRetryConfig,
    pub logging: LoggingConfig,
}

impl Config {
    /// Load config.
    ///
    /// Loading order:
    /// 1. `TG_CONFIG_DIR` env var, else `./.tg/`
    /// 2. Auto-create the config directory if it doesn't exist
    /// 3. Load `config.toml` if it exists, else use defaults
    /// 4. Apply `TG_*` environment variable overrides
    ///
    /// Does NOT validate - call validate() after load().
    pub fn load() -> ConfigErrorResult<Self> {
        let config_dir = Self::config_dir()?;

        if !config_dir.exists() {
            std::fs::create_dir_all(&config_dir).map_err(|e| ConfigError::Io {
                path: config_dir.clone(),
                source: e,
            })?;
        }

        let config_path = config_dir.join(CONFIG_FILENAME);

        let mut config = if config_path.exists() {
            Self::load_toml(&config_path)?
        } else {
            Config::default()
        };

        config.apply_env_overrides();

        Ok(config)
    }

    fn load_toml(path: &Path) -> ConfigErrorResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&contents).map_err(|e| ConfigError::Toml {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Priority: TG_CONFIG_DIR env var > ./.tg/ (relative to cwd)
    pub fn config_dir() -> ConfigErrorResult<PathBuf> {
        if let Ok(dir) = std::env::var(CONFIG_DIR_ENV) {
            return Ok(PathBuf::from(dir));
        }

        let cwd = std::env::current_dir()
            .map_err(|_| ConfigError::config("Cannot determine current working directory"))?;
        Ok(cwd.join(DEFAULT_CONFIG_DIR))
    }

    /// Validate all configuration. Any error here is fatal at startup.
    pub fn validate(&self) -> ConfigErrorResult<()> {
        self.server.validate()?;
        self.auth.validate()?;
        self.store.validate()?;
        self.rate_limit.validate()?;
        self.revocation_retry.validate()?;
        self.ensure_production_secrets()?;

        Ok(())
    }

    /// Production refuses to start on the built-in development secrets.
    /// Staging only warns, see [`Config::warn_insecure_defaults`].
    pub fn ensure_production_secrets(&self) -> ConfigErrorResult<()> {
        if !self.server.environment.is_production() {
            return Ok(());
        }

        let insecure = self.insecure_defaults();
        if !insecure.is_empty() {
            return Err(ConfigError::auth(format!(
                "{} still set to the built-in development value in production",
                insecure.join(", ")
            )));
        }

        Ok(())
    }

    /// Absolute path of the SQLite credential store.
    pub fn store_path(&self) -> ConfigErrorResult<PathBuf> {
        Ok(Self::config_dir()?.join(&self.store.path))
    }

    /// Absolute path of the log file, if file logging is on.
    pub fn log_file_path(&self) -> ConfigErrorResult<Option<PathBuf>> {
        let Some(file) = &self.logging.file else {
            return Ok(None);
        };

        Ok(Some(Self::config_dir()?.join(&self.logging.dir).join(file)))
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Names of the development secrets still in use outside development.
    pub fn insecure_defaults(&self) -> Vec<&'static str> {
        if self.server.environment.is_development() {
            return Vec::new();
        }

        let mut found = Vec::new();
        if self.auth.uses_default_jwt_secret() {
            found.push("auth.jwt_secret");
        }
        if self.auth.uses_default_handoff_secret() {
            found.push("auth.handoff_secret");
        }
        found
    }

    pub fn warn_insecure_defaults(&self) {
        for setting in self.insecure_defaults() {
            warn!("**************************************************************");
            warn!(
                "  {} is the built-in development value in environment '{}'",
                setting, self.server.environment
            );
            warn!("  Anyone who has read the source can forge sessions. Set a real secret.");
            warn!("**************************************************************");
        }
    }

    /// Log configuration summary (NEVER logs secrets).
    pub fn log_summary(&self) {
        info!("Configuration loaded:");
        info!(
            "  server: {}:{} ({})",
            self.server.host, self.server.port, self.server.environment
        );
        info!(
            "  auth: access_ttl={}s, refresh_ttl={}s, leeway={}s, cookie={}",
            self.auth.access_ttl_secs,
            self.auth.refresh_ttl_secs,
            self.auth.leeway_secs,
            self.auth.cookie_name
        );
        info!(
            "  store: {} (timeout={}ms, sweep={}s, cas_attempts={})",
            self.store.backend,
            self.store.timeout_ms,
            self.store.sweep_interval_secs,
            self.store.max_cas_attempts
        );
        if self.rate_limit.enabled {
            info!(
                "  rate_limit: session={}/{}s, refresh={}/{}s, api={}/{}s (forwarded-for: {})",
                self.rate_limit.session.max_requests,
                self.rate_limit.session.window_secs,
                self.rate_limit.refresh.max_requests,
                self.rate_limit.refresh.window_secs,
                self.rate_limit.api.max_requests,
                self.rate_limit.api.window_secs,
                self.rate_limit.trust_forwarded_for
            );
        } else {
            info!("  rate_limit: disabled");
        }
        info!(
            "  revocation_retry: attempts={}, backoff={}ms..{}ms x{}, worst wait={:?}",
            self.revocation_retry.attempts,
            self.revocation_retry.first_backoff_ms,
            self.revocation_retry.backoff_cap_ms,
            self.revocation_retry.growth,
            self.revocation_retry.worst_case_wait()
        );
        info!(
            "  logging: {} (colored: {})",
            self.logging.level, self.logging.colored
        );
    }

    fn apply_env_overrides(&mut self) {
        // Server
        Self::apply_env_string("TG_SERVER_HOST", &mut self.server.host);
        Self::apply_env_parse("TG_SERVER_PORT", &mut self.server.port);
        Self::apply_env_parse("TG_ENVIRONMENT", &mut self.server.environment);

        // Auth
        Self::apply_env_string("TG_AUTH_JWT_SECRET", &mut self.auth.jwt_secret);
        Self::apply_env_string("TG_AUTH_HANDOFF_SECRET", &mut self.auth.handoff_secret);
        Self::apply_env_parse("TG_AUTH_ACCESS_TTL_SECS", &mut self.auth.access_ttl_secs);
        Self::apply_env_parse("TG_AUTH_REFRESH_TTL_SECS", &mut self.auth.refresh_ttl_secs);
        Self::apply_env_parse("TG_AUTH_LEEWAY_SECS", &mut self.auth.leeway_secs);
        Self::apply_env_string("TG_AUTH_COOKIE_NAME", &mut self.auth.cookie_name);

        // Store
        Self::apply_env_parse("TG_STORE_BACKEND", &mut self.store.backend);
        Self::apply_env_string("TG_STORE_PATH", &mut self.store.path);
        Self::apply_env_parse("TG_STORE_TIMEOUT_MS", &mut self.store.timeout_ms);
        Self::apply_env_parse(
            "TG_STORE_SWEEP_INTERVAL_SECS",
            &mut self.store.sweep_interval_secs,
        );
        Self::apply_env_parse(
            "TG_STORE_MAX_CAS_ATTEMPTS",
            &mut self.store.max_cas_attempts,
        );

        // Rate limit
        Self::apply_env_bool("TG_RATE_LIMIT_ENABLED", &mut self.rate_limit.enabled);
        Self::apply_env_bool(
            "TG_RATE_LIMIT_TRUST_FORWARDED_FOR",
            &mut self.rate_limit.trust_forwarded_for,
        );
        Self::apply_env_parse(
            "TG_RATE_LIMIT_SESSION_MAX_REQUESTS",
            &mut self.rate_limit.session.max_requests,
        );
        Self::apply_env_parse(
            "TG_RATE_LIMIT_SESSION_WINDOW_SECS",
            &mut self.rate_limit.session.window_secs,
        );
        Self::apply_env_parse(
            "TG_RATE_LIMIT_REFRESH_MAX_REQUESTS",
            &mut self.rate_limit.refresh.max_requests,
        );
        Self::apply_env_parse(
            "TG_RATE_LIMIT_REFRESH_WINDOW_SECS",
            &mut self.rate_limit.refresh.window_secs,
        );
        Self::apply_env_parse(
            "TG_RATE_LIMIT_API_MAX_REQUESTS",
            &mut self.rate_limit.api.max_requests,
        );
        Self::apply_env_parse(
            "TG_RATE_LIMIT_API_WINDOW_SECS",
            &mut self.rate_limit.api.window_secs,
        );

        // Revocation retry
        Self::apply_env_parse(
            "TG_REVOCATION_RETRY_ATTEMPTS",
            &mut self.revocation_retry.attempts,
        );
        Self::apply_env_parse(
            "TG_REVOCATION_RETRY_FIRST_BACKOFF_MS",
            &mut self.revocation_retry.first_backoff_ms,
        );
        Self::apply_env_parse(
            "TG_REVOCATION_RETRY_BACKOFF_CAP_MS",
            &mut self.revocation_retry.backoff_cap_ms,
        );
        Self::apply_env_parse("TG_REVOCATION_RETRY_GROWTH", &mut self.revocation_retry.growth);
        Self::apply_env_bool("TG_REVOCATION_RETRY_JITTER", &mut self.revocation_retry.jitter);

        // Logging
        Self::apply_env_parse("TG_LOG_LEVEL", &mut self.logging.level);
        Self::apply_env_bool("TG_LOG_COLORED", &mut self.logging.colored);
        Self::apply_env_option_string("TG_LOG_FILE", &mut self.logging.file);
        Self::apply_env_string("TG_LOG_DIR", &mut self.logging.dir);
    }

    fn apply_env_string(var_name: &str, target: &mut String) {
        if let Ok(val) = std::env::var(var_name) {
            *target = val;
        }
    }

    /// Accepts "true"/"1"
    fn apply_env_bool(var_name: &str, target: &mut bool) {
        if let Ok(val) = std::env::var(var_name) {
            *target = val == "true" || val == "1";
        }
    }

    /// Unparseable values are ignored with a warning and the previous value kept.
    fn apply_env_parse<T: std::str::FromStr>(var_name: &str, target: &mut T) {
        if let Ok(val) = std::env::var(var_name) {
            match val.parse() {
                Ok(parsed) => *target = parsed,
                Err(_) => warn!("Ignoring {}: cannot parse '{}'", var_name, val),
            }
        }
    }

    fn apply_env_option_string(var_name: &str, target: &mut Option<String>) {
        if let Ok(val) = std::env::var(var_name) {
            *target = (!val.is_empty()).then_some(val);
        }
    }
}
