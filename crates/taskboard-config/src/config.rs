//! Configuration management for the client.

use crate::{CoreError, CoreResult, Paths};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use url::Url;

/// Default backend API URL (can be overridden at compile time via TASKBOARD_API_URL env var).
pub const DEFAULT_API_BASE_URL: &str = match option_env!("TASKBOARD_API_URL") {
    Some(url) => url,
    None => "http://localhost:5000/api",
};

/// Default login entry point that session invalidation sends the user to.
pub const DEFAULT_LOGIN_ROUTE: &str = match option_env!("TASKBOARD_LOGIN_ROUTE") {
    Some(route) => route,
    None => "/login",
};

/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Main client configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Config {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Base URL of the REST backend, e.g. `http://localhost:5000/api`.
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    /// Route the host navigates to when the session is invalidated.
    #[serde(default = "default_login_route")]
    pub login_route: String,
    /// Per-request timeout. `None` keeps the transport default.
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

fn default_api_base_url() -> String {
    DEFAULT_API_BASE_URL.to_string()
}

fn default_login_route() -> String {
    DEFAULT_LOGIN_ROUTE.to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            api_base_url: default_api_base_url(),
            login_route: default_login_route(),
            request_timeout_secs: None,
        }
    }
}

impl Config {
    /// Load configuration from the config file, falling back to defaults.
    /// Environment variables are applied last.
    pub fn load(paths: &Paths) -> CoreResult<Self> {
        let config_path = paths.config_file();

        let mut config = if config_path.exists() {
            Self::load_from_file(&config_path)?
        } else {
            Self::default()
        };

        config.load_from_env();
        config.validate()?;

        Ok(config)
    }

    /// Load configuration from a specific file.
    pub fn load_from_file(path: &Path) -> CoreResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to a file.
    pub fn save(&self, paths: &Paths) -> CoreResult<()> {
        paths.ensure_dirs()?;
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(paths.config_file(), content)?;
        Ok(())
    }

    fn load_from_env(&mut self) {
        self.apply_overrides(|name| std::env::var(name).ok());
    }

    /// Apply overrides from a variable lookup (the process environment in production).
    fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        if let Some(level) = non_empty("TASKBOARD_LOG_LEVEL") {
            self.log_level = level;
        }
        if let Some(url) = non_empty("TASKBOARD_API_URL") {
            self.api_base_url = url;
        }
        if let Some(route) = non_empty("TASKBOARD_LOGIN_ROUTE") {
            self.login_route = route;
        }
        if let Some(secs) = non_empty("TASKBOARD_REQUEST_TIMEOUT_SECS") {
            match secs.trim().parse::<u64>() {
                Ok(secs) => self.request_timeout_secs = Some(secs),
                Err(_) => tracing::warn!(value = %secs, "Ignoring invalid TASKBOARD_REQUEST_TIMEOUT_SECS"),
            }
        }
    }

    /// Check that the configured values are usable.
    pub fn validate(&self) -> CoreResult<()> {
        self.api_base_url()?;
        if !self.login_route.starts_with('/') {
            return Err(CoreError::Config(format!(
                "login_route must start with '/': {}",
                self.login_route
            )));
        }
        if self.request_timeout_secs == Some(0) {
            return Err(CoreError::Config(
                "request_timeout_secs must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Get the API base URL as a parsed URL.
    pub fn api_base_url(&self) -> CoreResult<Url> {
        let url = Url::parse(&self.api_base_url)?;
        match url.scheme() {
            "http" | "https" => Ok(url),
            other => Err(CoreError::Config(format!(
                "api_base_url must be http or https, got {}",
                other
            ))),
        }
    }

    /// Request timeout, if one is configured.
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }
}
