//! Configuration loading and path resolution
//!
//! Bootstrap configuration comes from an optional TOML file. Individual
//! settings are resolved in priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default (fallback)

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "CATALOG_CONFIG";

/// Environment variable naming the response cache directory
pub const CACHE_DIR_ENV_VAR: &str = "CATALOG_CACHE_DIR";

/// Pointer file whose content is the cache directory path
pub const CACHE_DIR_POINTER_FILE: &str = ".cache_dir";

/// Default number of courses processed concurrently
pub const DEFAULT_WORKERS: usize = 16;

/// Bootstrap configuration loaded from TOML file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TomlConfig {
    /// Directory for cached service responses (optional, no caching if unset)
    #[serde(default)]
    pub cache_dir: Option<PathBuf>,

    /// Number of courses processed concurrently
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Logging configuration (optional)
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Catalog service connection settings (optional)
    #[serde(default)]
    pub gateway: GatewayConfig,
}

impl Default for TomlConfig {
    fn default() -> Self {
        Self {
            cache_dir: None,
            workers: DEFAULT_WORKERS,
            logging: LoggingConfig::default(),
            gateway: GatewayConfig::default(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log file path (optional, logs to stderr if not specified)
    #[serde(default)]
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

/// Catalog service connection settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// OData `$batch` endpoint
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// `sap-client` number sent with every query
    #[serde(default = "default_client")]
    pub client: String,

    /// Per-request timeout
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// First retry delay
    #[serde(default = "default_initial_backoff_secs")]
    pub initial_backoff_secs: u64,

    /// Retry delay cap
    #[serde(default = "default_max_backoff_secs")]
    pub max_backoff_secs: u64,

    /// Give up after this many attempts (retries forever if unset)
    #[serde(default)]
    pub max_attempts: Option<u32>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            client: default_client(),
            timeout_secs: default_timeout_secs(),
            initial_backoff_secs: default_initial_backoff_secs(),
            max_backoff_secs: default_max_backoff_secs(),
            max_attempts: None,
        }
    }
}

fn default_workers() -> usize {
    DEFAULT_WORKERS
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_endpoint() -> String {
    "https://portalex.technion.ac.il/sap/opu/odata/sap/Z_CM_EV_CDIR_DATA_SRV/$batch?sap-client=700"
        .to_string()
}

fn default_client() -> String {
    "700".to_string()
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_initial_backoff_secs() -> u64 {
    5
}

fn default_max_backoff_secs() -> u64 {
    300
}

/// Locate the config file: CLI argument, then environment, then platform default
///
/// Returns `None` when no candidate exists on disk.
pub fn resolve_config_path(cli_arg: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = cli_arg {
        return Some(path.to_path_buf());
    }

    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        if !path.trim().is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    default_config_path().filter(|p| p.exists())
}

/// `<platform config dir>/course-catalog/config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("course-catalog").join("config.toml"))
}

/// Load TOML configuration
///
/// A missing file is not fatal: defaults are used and a warning is logged.
/// A file that exists but cannot be parsed is a configuration error.
pub fn load_toml_config(path: Option<&Path>) -> Result<TomlConfig> {
    let Some(path) = path else {
        debug!("No config file found, using built-in defaults");
        return Ok(TomlConfig::default());
    };

    if !path.exists() {
        warn!("Config file {} not found, using built-in defaults", path.display());
        return Ok(TomlConfig::default());
    }

    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;

    let config: TomlConfig = toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))?;

    if config.workers == 0 {
        return Err(Error::Config("workers must be at least 1".to_string()));
    }

    Ok(config)
}

/// Write TOML configuration atomically (temp file + rename)
pub fn write_toml_config(config: &TomlConfig, path: &Path) -> Result<()> {
    let content = toml::to_string_pretty(config)
        .map_err(|e| Error::Config(format!("Serialize TOML failed: {}", e)))?;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let tmp_path = path.with_extension("toml.tmp");
    std::fs::write(&tmp_path, content)?;
    std::fs::rename(&tmp_path, path)?;

    Ok(())
}

/// Write `base` to `path` with the effective run settings applied
pub fn save_run_settings(
    base: &TomlConfig,
    path: &Path,
    workers: usize,
    cache_dir: Option<&Path>,
) -> Result<()> {
    let mut saved = base.clone();
    saved.workers = workers;
    if let Some(dir) = cache_dir {
        saved.cache_dir = Some(dir.to_path_buf());
    }
    write_toml_config(&saved, path)
}

/// Resolve the response cache directory
///
/// Priority: CLI argument, `CATALOG_CACHE_DIR`, TOML `cache_dir`, then the
/// content of a `.cache_dir` pointer file in `pointer_dir`. `None` disables
/// caching.
pub fn resolve_cache_dir(
    cli_arg: Option<&Path>,
    toml_config: &TomlConfig,
    pointer_dir: &Path,
) -> Option<PathBuf> {
    if let Some(path) = cli_arg {
        return Some(path.to_path_buf());
    }

    if let Ok(path) = std::env::var(CACHE_DIR_ENV_VAR) {
        if !path.trim().is_empty() {
            return Some(PathBuf::from(path.trim()));
        }
    }

    if let Some(path) = &toml_config.cache_dir {
        return Some(path.clone());
    }

    let pointer = pointer_dir.join(CACHE_DIR_POINTER_FILE);
    match std::fs::read_to_string(&pointer) {
        Ok(content) if !content.trim().is_empty() => Some(PathBuf::from(content.trim())),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = TomlConfig::default();
        assert_eq!(config.workers, 16);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.gateway.initial_backoff_secs, 5);
        assert_eq!(config.gateway.max_backoff_secs, 300);
        assert!(config.gateway.max_attempts.is_none());
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: TomlConfig = toml::from_str(
            r#"
            workers = 4

            [gateway]
            max_attempts = 3
            "#,
        )
        .unwrap();

        assert_eq!(config.workers, 4);
        assert_eq!(config.gateway.max_attempts, Some(3));
        assert_eq!(config.gateway.client, "700");
        assert!(config.cache_dir.is_none());
    }
}
