//! Agent configuration

use anyhow::{Context, Result};
use capacity_lib::EngineConfig;
use serde::Deserialize;

/// Agent configuration
///
/// Read from an optional file named by `CAPACITY_CONFIG` and from
/// `CAPACITY_*` environment variables; nested keys use `__`
/// (for example `CAPACITY_ENGINE__BUFFER_PCT=0.25`).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Instance name used in logs
    pub instance_name: String,

    /// API server port
    pub api_port: u16,

    /// Directory holding tenants.json, integrations.json and hdfs.json
    pub snapshot_dir: String,

    /// Snapshot reload interval in seconds
    pub refresh_interval_secs: u64,

    pub engine: EngineConfig,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            instance_name: default_instance_name(),
            api_port: 8080,
            snapshot_dir: "/var/lib/capacity/snapshots".to_string(),
            refresh_interval_secs: 60,
            engine: EngineConfig::default(),
        }
    }
}

fn default_instance_name() -> String {
    std::env::var("HOSTNAME").unwrap_or_else(|_| "capacity-agent".to_string())
}

impl AgentConfig {
    /// Load configuration from environment and config file
    pub fn load() -> Result<Self> {
        let mut builder = config::Config::builder();

        if let Ok(path) = std::env::var("CAPACITY_CONFIG") {
            builder = builder.add_source(config::File::with_name(&path).required(true));
        }

        let config = builder
            .add_source(
                config::Environment::with_prefix("CAPACITY")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to parse configuration")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AgentConfig::default();
        assert_eq!(config.api_port, 8080);
        assert_eq!(config.refresh_interval_secs, 60);
        assert_eq!(config.engine, EngineConfig::default());
    }

    #[test]
    fn test_file_overrides_engine_section() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("agent.json");
        std::fs::write(
            &path,
            r#"{"api_port": 9191, "engine": {"buffer_pct": 0.2}}"#,
        )
        .unwrap();

        let config: AgentConfig = config::Config::builder()
            .add_source(config::File::from(path))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(config.api_port, 9191);
        assert_eq!(config.engine.buffer_pct, 0.2);
        assert_eq!(config.engine.model.endpoints_per_su, 5000);
        assert_eq!(config.refresh_interval_secs, 60);
    }
}
