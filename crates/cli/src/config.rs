//! Configuration management for the CLI

use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{Context, Result};
use capacity_lib::EngineConfig;
use serde::{Deserialize, Serialize};

use crate::output::OutputFormat;

pub const DEFAULT_API_URL: &str = "http://localhost:8080";

/// CLI configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// Agent endpoint URL
    pub api_url: Option<String>,
    /// Default output format
    pub default_format: Option<String>,
    /// Safety buffer override
    pub buffer_pct: Option<f64>,
    /// Calculator overrides
    pub engine: Option<EngineConfig>,
}

impl Config {
    /// Load configuration from the default location, if present
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).context("Failed to read config file")?;

        serde_json::from_str(&content).context("Failed to parse config file")
    }

    /// Get the configuration file path
    fn config_path() -> Result<PathBuf> {
        let home = dirs_next::home_dir().context("Could not determine home directory")?;
        Ok(home.join(".config").join("capctl").join("config.json"))
    }

    /// Command line value, then the config file, then the local agent
    pub fn api_url(&self, flag: Option<String>) -> String {
        flag.or_else(|| self.api_url.clone())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string())
    }

    pub fn output_format(&self, flag: Option<OutputFormat>) -> Result<OutputFormat> {
        if let Some(format) = flag {
            return Ok(format);
        }
        match &self.default_format {
            Some(name) => OutputFormat::from_str(name)
                .map_err(|err| anyhow::anyhow!("Invalid default_format in config: {err}")),
            None => Ok(OutputFormat::default()),
        }
    }

    /// Engine calibration with the buffer from the flag, then the config file
    pub fn engine_config(&self, buffer_flag: Option<f64>) -> EngineConfig {
        let engine = self.engine.unwrap_or_default();
        match buffer_flag.or(self.buffer_pct) {
            Some(buffer) => engine.with_buffer(buffer),
            None => engine,
        }
    }
}
