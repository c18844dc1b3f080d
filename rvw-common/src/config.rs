//! Bootstrap configuration loading and config file discovery
//!
//! Config file resolution follows this priority order:
//! 1. Command-line argument (highest priority)
//! 2. `RVW_CONFIG` environment variable
//! 3. `<config_dir>/rvw/config.toml` if it exists
//! 4. Compiled defaults (no file)
//!
//! A missing file is never fatal: the caller gets defaults and can log a
//! warning once logging is up. A file that exists but does not parse is a
//! configuration error.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "RVW_CONFIG";

/// Bootstrap configuration loaded from TOML file
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct TomlConfig {
    /// Logging configuration (optional)
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Analyzer settings (optional, every field may be overridden)
    #[serde(default)]
    pub analyzer: AnalyzerToml,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Log level or filter directive (trace, debug, info, warn, error)
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

fn default_log_level() -> String {
    "info".to_string()
}

/// `[analyzer]` section of the TOML file
///
/// All fields are optional; unset fields fall through to environment
/// variables or compiled defaults during resolution in `rvw-ai`.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AnalyzerToml {
    /// Backend model identifier (e.g. "gemma3:1b")
    #[serde(default)]
    pub model: Option<String>,

    /// Sampling temperature
    #[serde(default)]
    pub temperature: Option<f32>,

    /// Base URL of the Ollama server
    #[serde(default)]
    pub ollama_url: Option<String>,

    /// Records per service call
    #[serde(default)]
    pub batch_size: Option<usize>,

    /// Cap on comments kept per identifier
    #[serde(default)]
    pub max_comments: Option<usize>,

    /// Per-request timeout in seconds (no timeout when unset)
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
}

/// Where the bootstrap configuration came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// Parsed from this file
    File(PathBuf),
    /// A file was requested but does not exist; defaults used
    Missing(PathBuf),
    /// No file requested or discovered; defaults used
    Defaults,
}

/// Resolve the config file path following the priority order above
///
/// Returns `None` when neither an explicit path nor a discoverable default
/// file exists.
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
    default_config_file().filter(|path| path.exists())
}

/// Platform default config file path (`~/.config/rvw/config.toml` on Linux)
pub fn default_config_file() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("rvw").join("config.toml"))
}

/// Parse a TOML config file
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))
}

/// Load bootstrap configuration with graceful degradation
///
/// Missing files yield defaults; unreadable or malformed files are errors.
pub fn load_bootstrap_config(cli_arg: Option<&Path>) -> Result<(TomlConfig, ConfigSource)> {
    match resolve_config_path(cli_arg) {
        Some(path) if path.exists() => {
            let config = load_toml_config(&path)?;
            Ok((config, ConfigSource::File(path)))
        }
        Some(path) => Ok((TomlConfig::default(), ConfigSource::Missing(path))),
        None => Ok((TomlConfig::default(), ConfigSource::Defaults)),
    }
}
