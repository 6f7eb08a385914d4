// ============================================================
// APP CONFIG
// ============================================================

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::domain::error::{AppError, Result};

/// Runtime configuration. Defaults are overridden by `eventcache.toml`
/// when present, then by `EVENTCACHE_*` environment variables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    /// Directory holding uploads and the event cache.
    pub data_dir: PathBuf,
    /// Deployment environment name, e.g. "local" or "production".
    pub environment: String,
    /// Upload PIN. When unset, every upload is rejected.
    pub pin: Option<String>,
    /// Allow skipping the PIN check outside production environments.
    pub pin_bypass: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8088,
            data_dir: PathBuf::from("./data"),
            environment: "production".to_string(),
            pin: None,
            pin_bypass: false,
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        Figment::from(Serialized::defaults(AppConfig::default()))
            .merge(Toml::file("eventcache.toml"))
            .merge(Env::prefixed("EVENTCACHE_"))
            .extract()
            .map_err(|e| AppError::ConfigError(e.to_string()))
    }

    /// Environments in which the PIN bypass flag is honored at all.
    pub fn is_development(&self) -> bool {
        matches!(self.environment.as_str(), "local" | "development")
    }
}
