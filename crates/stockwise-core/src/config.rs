//! Application configuration management.
//!
//! This module handles loading and saving the application configuration:
//! which backend to talk to, how long to wait for it, where the login and
//! dashboard routes live, and where the session token is kept.
//!
//! Configuration is stored at `~/.config/stockwise/config.json`.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Application name used for config/cache directory paths
const APP_NAME: &str = "stockwise";

/// Config file name
const CONFIG_FILE: &str = "config.json";

pub const DEFAULT_API_ORIGIN: &str = "http://127.0.0.1:5000";

/// Requests that take longer than this are reported as network failures.
pub const DEFAULT_TIMEOUT_SECS: u64 = 20;

pub const DEFAULT_LOGIN_ROUTE: &str = "/security/login";

pub const DEFAULT_DASHBOARD_ROUTE: &str = "/dashboard";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenStorage {
    #[default]
    File,
    Keyring,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_origin: String,
    pub request_timeout_secs: u64,
    pub login_route: String,
    pub dashboard_route: String,
    pub token_storage: TokenStorage,
    pub last_username: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_origin: DEFAULT_API_ORIGIN.to_string(),
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
            login_route: DEFAULT_LOGIN_ROUTE.to_string(),
            dashboard_route: DEFAULT_DASHBOARD_ROUTE.to_string(),
            token_storage: TokenStorage::default(),
            last_username: None,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
            serde_json::from_str(&contents).context("Failed to parse config file")
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    pub fn cache_dir(&self) -> Result<PathBuf> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME))
    }

    /// Apply a `STOCKWISE_*` style override, ignoring unparsable timeouts.
    pub fn apply_overrides(&mut self, api_origin: Option<String>, timeout_secs: Option<String>) {
        if let Some(origin) = api_origin.filter(|o| !o.trim().is_empty()) {
            self.api_origin = origin.trim().to_string();
        }
        if let Some(secs) = timeout_secs.and_then(|s| s.trim().parse::<u64>().ok()) {
            if secs > 0 {
                self.request_timeout_secs = secs;
            }
        }
    }

    pub fn api_config(&self) -> ApiConfig {
        ApiConfig {
            origin: self.api_origin.trim_end_matches('/').to_string(),
            timeout: Duration::from_secs(self.request_timeout_secs.max(1)),
            login_route: self.login_route.clone(),
        }
    }
}

/// The part of the configuration the API client needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    pub origin: String,
    pub timeout: Duration,
    pub login_route: String,
}

impl ApiConfig {
    pub fn new(origin: impl Into<String>) -> Self {
        Self {
            origin: origin.into().trim_end_matches('/').to_string(),
            ..Self::default()
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_login_route(mut self, route: impl Into<String>) -> Self {
        self.login_route = route.into();
        self
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Config::default().api_config()
    }
}
