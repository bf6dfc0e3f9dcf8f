use crate::constants::{
    DEFAULT_BUSY_TIMEOUT_MS, DEFAULT_DATABASE_PATH, DEFAULT_EXPORT_URL, DEFAULT_HTTP_TIMEOUT_SECS,
    DEFAULT_SERVER_PORT,
};
use crate::error::{CatalogError, Result};
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::Path;
use tracing::debug;

pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub export: ExportConfig,
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub metrics: MetricsConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    pub url: String,
    pub timeout_seconds: u64,
    pub user_agent: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_EXPORT_URL.to_string(),
            timeout_seconds: DEFAULT_HTTP_TIMEOUT_SECS,
            user_agent: concat!("radio_catalog/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: String,
    pub busy_timeout_ms: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: DEFAULT_DATABASE_PATH.to_string(),
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_SERVER_PORT,
        }
    }
}

/// Prometheus exporter is only installed when a port is set
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    pub port: Option<u16>,
}

impl Config {
    /// Load the given file if it exists, then apply environment overrides.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let mut config = if path.exists() {
            let content = fs::read_to_string(path).map_err(|e| {
                CatalogError::Config(format!(
                    "Failed to read config file '{}': {}",
                    path.display(),
                    e
                ))
            })?;
            Self::from_toml_str(&content)?
        } else {
            debug!("No config file at {}, using defaults", path.display());
            Self::default()
        };
        config.apply_env_overrides()?;
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        Ok(config)
    }

    fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(url) = env::var("RADIO_CATALOG_EXPORT_URL") {
            self.export.url = url;
        }
        if let Ok(db) = env::var("RADIO_CATALOG_DB") {
            self.database.path = db;
        }
        if let Ok(port) = env::var("RADIO_CATALOG_PORT") {
            self.server.port = port.parse().map_err(|_| {
                CatalogError::Config(format!("RADIO_CATALOG_PORT is not a valid port: {port}"))
            })?;
        }
        Ok(())
    }
}
