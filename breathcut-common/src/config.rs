//! Configuration loading and config file resolution
//!
//! Config file path resolution priority:
//! 1. Command-line argument (highest priority)
//! 2. `BREATHCUT_CONFIG` environment variable
//! 3. Platform config directory (`<config dir>/breathcut/config.toml`)
//! 4. Built-in defaults (no file)
//!
//! A missing file is not an error; a file that exists but cannot be parsed is.

use crate::params::{AnalysisSettings, DetectionParameters, RemovalParameters};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "BREATHCUT_CONFIG";

/// Configuration loaded from TOML file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TomlConfig {
    /// Logging configuration (optional)
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Default breath detection parameters
    #[serde(default)]
    pub detection: DetectionParameters,

    /// Default breath removal parameters
    #[serde(default)]
    pub removal: RemovalParameters,

    /// Energy analysis settings
    #[serde(default)]
    pub analysis: AnalysisSettings,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl TomlConfig {
    /// Validate every parameter section
    pub fn validate(&self) -> Result<()> {
        self.detection.validate()?;
        self.removal.validate()?;
        self.analysis.validate()?;
        Ok(())
    }
}

/// Resolve the config file path following the priority order above
///
/// Returns `None` when neither an explicit path nor a platform default file exists.
pub fn resolve_config_path(cli_arg: Option<&Path>) -> Option<PathBuf> {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return Some(path.to_path_buf());
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        if !path.trim().is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    // Priority 3: Platform config directory
    default_config_path().filter(|path| path.exists())
}

/// Platform default config file location
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("breathcut").join("config.toml"))
}

/// Load configuration, falling back to built-in defaults when no file is found
pub fn load_config(cli_arg: Option<&Path>) -> Result<TomlConfig> {
    let Some(path) = resolve_config_path(cli_arg) else {
        debug!("No config file found, using built-in defaults");
        return Ok(TomlConfig::default());
    };

    if !path.exists() {
        // An explicitly named file that is missing degrades to defaults
        warn!("Config file not found: {}, using built-in defaults", path.display());
        return Ok(TomlConfig::default());
    }

    let config = load_config_file(&path)?;
    info!("Configuration loaded from {}", path.display());
    Ok(config)
}

/// Read and parse a specific config file
pub fn load_config_file(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
    let config: TomlConfig = toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))?;
    config.validate()?;
    Ok(config)
}

/// Write configuration to a TOML file atomically
///
/// Writes to a sibling temp file then renames it over the target.
pub fn write_toml_config(config: &TomlConfig, path: &Path) -> Result<()> {
    let content = toml::to_string_pretty(config)
        .map_err(|e| Error::Config(format!("Serialize config failed: {}", e)))?;

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
