//! Health evaluation
//!
//! Classifies tenants, integrations and storage into a three-level status
//! ([`HealthStatus`]). The registry submodule tracks the service's own
//! component health for liveness and readiness probes.

mod heartbeat;
pub mod registry;
mod signals;
mod storage;

pub use heartbeat::{heartbeat_status, HeartbeatStatus, HeartbeatThresholds};
pub use registry::{
    components, ComponentHealth, ComponentStatus, HealthRegistry, HealthResponse,
    ReadinessResponse,
};
pub use signals::{
    breached_signals, explain_status, lag_minutes, rate_ratio, status_from_signals, Signal,
    SignalBreach, SignalThresholds, Signals, Threshold,
};
pub use storage::{
    connectivity_status, mount_status, storage_overall_status, StorageThresholds,
    CONNECTIVITY_STALE_MINUTES,
};

use serde::{Deserialize, Serialize};

/// Three-level health verdict, ordered by severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Green,
    Yellow,
    Red,
}

impl HealthStatus {
    /// Operator-facing label
    pub fn label(&self) -> &'static str {
        match self {
            HealthStatus::Green => "Healthy",
            HealthStatus::Yellow => "Watch",
            HealthStatus::Red => "Action",
        }
    }

    /// Numeric level for gauges (0 green, 1 yellow, 2 red)
    pub fn level(&self) -> i64 {
        match self {
            HealthStatus::Green => 0,
            HealthStatus::Yellow => 1,
            HealthStatus::Red => 2,
        }
    }
}

impl std::fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HealthStatus::Green => write!(f, "green"),
            HealthStatus::Yellow => write!(f, "yellow"),
            HealthStatus::Red => write!(f, "red"),
        }
    }
}
