//! Engine configuration shared by the agent and the CLI

use serde::{Deserialize, Serialize};

use crate::headroom::DEFAULT_BUFFER_PCT;
use crate::health::{HeartbeatThresholds, SignalThresholds, StorageThresholds};
use crate::units::ResourceModel;

/// Calibration for every calculator
///
/// Each section defaults independently, so a partial config only overrides
/// the values it names.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Safety buffer reserved when computing headroom
    pub buffer_pct: f64,
    pub model: ResourceModel,
    pub signals: SignalThresholds,
    pub heartbeat: HeartbeatThresholds,
    pub storage: StorageThresholds,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            buffer_pct: DEFAULT_BUFFER_PCT,
            model: ResourceModel::default(),
            signals: SignalThresholds::default(),
            heartbeat: HeartbeatThresholds::default(),
            storage: StorageThresholds::default(),
        }
    }
}

impl EngineConfig {
    pub fn with_buffer(mut self, buffer_pct: f64) -> Self {
        self.buffer_pct = buffer_pct;
        self
    }
}
