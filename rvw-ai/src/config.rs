//! Analyzer settings resolution for rvw-ai
//!
//! Provides multi-tier resolution with CLI → ENV → TOML → compiled default
//! priority, per field. The resolved settings are passed explicitly into the
//! client and orchestrator at construction.

use crate::models::DEFAULT_MAX_COMMENTS;
use rvw_common::config::AnalyzerToml;
use rvw_common::{Error, Result};
use std::fmt::Display;
use std::str::FromStr;
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_MODEL: &str = "gemma3:1b";
pub const DEFAULT_TEMPERATURE: f32 = 0.3;
pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";
pub const DEFAULT_BATCH_SIZE: usize = 4;

pub const ENV_MODEL: &str = "RVW_MODEL";
pub const ENV_TEMPERATURE: &str = "RVW_TEMPERATURE";
pub const ENV_OLLAMA_URL: &str = "RVW_OLLAMA_URL";
pub const ENV_BATCH_SIZE: &str = "RVW_BATCH_SIZE";

/// Completion service settings
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceSettings {
    /// Backend model identifier
    pub model: String,
    /// Sampling temperature (lower is more deterministic)
    pub temperature: f32,
    /// Base URL of the Ollama server
    pub endpoint: String,
    /// Per-request timeout; `None` waits indefinitely
    pub request_timeout: Option<Duration>,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            endpoint: DEFAULT_OLLAMA_URL.to_string(),
            request_timeout: None,
        }
    }
}

/// Everything needed for one analysis run
#[derive(Debug, Clone, PartialEq)]
pub struct AnalyzerSettings {
    pub service: ServiceSettings,
    /// Records per service call
    pub batch_size: usize,
    /// Comments kept per identifier
    pub max_comments: usize,
}

impl Default for AnalyzerSettings {
    fn default() -> Self {
        Self {
            service: ServiceSettings::default(),
            batch_size: DEFAULT_BATCH_SIZE,
            max_comments: DEFAULT_MAX_COMMENTS,
        }
    }
}

impl AnalyzerSettings {
    /// Reject settings the pipeline cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(Error::Config("batch_size must be at least 1".to_string()));
        }
        if self.max_comments == 0 {
            return Err(Error::Config("max_comments must be at least 1".to_string()));
        }
        if !(0.0..=2.0).contains(&self.service.temperature) {
            return Err(Error::Config(format!(
                "temperature must be within 0.0..=2.0, got {}",
                self.service.temperature
            )));
        }
        if !is_valid_value(&self.service.model) {
            return Err(Error::Config("model must not be empty".to_string()));
        }
        if !is_valid_value(&self.service.endpoint) {
            return Err(Error::Config("ollama_url must not be empty".to_string()));
        }
        Ok(())
    }
}

/// Values given on the command line (highest priority)
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub model: Option<String>,
    pub temperature: Option<f32>,
    pub ollama_url: Option<String>,
    pub batch_size: Option<usize>,
}

/// Resolve settings from CLI → ENV → TOML → defaults, then validate
pub fn resolve_analyzer_settings(cli: &CliOverrides, toml: &AnalyzerToml) -> Result<AnalyzerSettings> {
    let model = resolve("model", cli.model.clone(), ENV_MODEL, toml.model.clone(), DEFAULT_MODEL.to_string())?;
    let temperature = resolve("temperature", cli.temperature, ENV_TEMPERATURE, toml.temperature, DEFAULT_TEMPERATURE)?;
    let endpoint = resolve(
        "ollama_url",
        cli.ollama_url.clone(),
        ENV_OLLAMA_URL,
        toml.ollama_url.clone(),
        DEFAULT_OLLAMA_URL.to_string(),
    )?;
    let batch_size = resolve("batch_size", cli.batch_size, ENV_BATCH_SIZE, toml.batch_size, DEFAULT_BATCH_SIZE)?;

    let settings = AnalyzerSettings {
        service: ServiceSettings {
            model,
            temperature,
            endpoint,
            request_timeout: toml.request_timeout_secs.map(Duration::from_secs),
        },
        batch_size,
        max_comments: toml.max_comments.unwrap_or(DEFAULT_MAX_COMMENTS),
    };
    settings.validate()?;
    Ok(settings)
}

/// Validate a string setting (non-empty, non-whitespace)
pub fn is_valid_value(value: &str) -> bool {
    !value.trim().is_empty()
}

fn resolve<T>(name: &str, cli: Option<T>, env_var: &str, toml: Option<T>, default: T) -> Result<T>
where
    T: FromStr + Display,
    T::Err: Display,
{
    if let Some(value) = cli {
        debug!("{} = {} (command line)", name, value);
        return Ok(value);
    }

    if let Ok(raw) = std::env::var(env_var) {
        if is_valid_value(&raw) {
            let value = raw.trim().parse::<T>().map_err(|e| {
                Error::Config(format!("{}={:?} is not a valid {}: {}", env_var, raw, name, e))
            })?;
            debug!("{} = {} (environment)", name, value);
            return Ok(value);
        }
    }

    if let Some(value) = toml {
        debug!("{} = {} (TOML)", name, value);
        return Ok(value);
    }

    debug!("{} = {} (default)", name, default);
    Ok(default)
}
