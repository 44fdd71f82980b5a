//! Service health for liveness and readiness probes
//!
//! Each snapshot source registers as a component. A failed load degrades its
//! component without affecting the others. When every source fails on the
//! same refresh the agent has nothing current to serve and all components
//! turn unhealthy until a source loads again. The service is ready once the
//! first refresh has completed and at least one source is operational.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::source::SnapshotSet;

/// Health of a service component
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentStatus {
    /// Last load succeeded
    Healthy,
    /// Serving the last good or default snapshot
    Degraded,
    /// Every source failed on the latest refresh
    Unhealthy,
}

impl ComponentStatus {
    pub fn is_operational(&self) -> bool {
        *self != ComponentStatus::Unhealthy
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentHealth {
    pub status: ComponentStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub last_check_timestamp: i64,
}

impl ComponentHealth {
    fn new(status: ComponentStatus, message: Option<String>) -> Self {
        Self {
            status,
            message,
            last_check_timestamp: chrono::Utc::now().timestamp(),
        }
    }
}

/// Overall health response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: ComponentStatus,
    pub components: HashMap<String, ComponentHealth>,
}

impl HealthResponse {
    /// Worst status across components; healthy when nothing is registered
    pub fn compute_status(components: &HashMap<String, ComponentHealth>) -> ComponentStatus {
        components
            .values()
            .map(|health| health.status)
            .max()
            .unwrap_or(ComponentStatus::Healthy)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadinessResponse {
    pub ready: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Component names, one per snapshot source
pub mod components {
    pub const TENANTS: &str = "tenants";
    pub const INTEGRATIONS: &str = "integrations";
    pub const STORAGE: &str = "storage";

    pub const ALL: [&str; 3] = [TENANTS, INTEGRATIONS, STORAGE];
}

#[derive(Debug, Clone, Default)]
pub struct HealthRegistry {
    components: Arc<RwLock<HashMap<String, ComponentHealth>>>,
    ready: Arc<RwLock<bool>>,
}

impl HealthRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register every snapshot source as healthy
    pub async fn register_sources(&self) {
        let mut components = self.components.write().await;
        for name in components::ALL {
            components.insert(
                name.to_string(),
                ComponentHealth::new(ComponentStatus::Healthy, None),
            );
        }
    }

    pub async fn set_status(&self, name: &str, status: ComponentStatus, message: Option<String>) {
        self.components
            .write()
            .await
            .insert(name.to_string(), ComponentHealth::new(status, message));
    }

    pub async fn set_degraded(&self, name: &str, message: impl Into<String>) {
        self.set_status(name, ComponentStatus::Degraded, Some(message.into()))
            .await;
    }

    /// Record the outcome of one refresh of all sources
    pub async fn record_refresh(&self, set: &SnapshotSet) {
        let failed_status = if set.all_failed() {
            ComponentStatus::Unhealthy
        } else {
            ComponentStatus::Degraded
        };

        for name in components::ALL {
            match set.error(name) {
                Some(err) => {
                    self.set_status(name, failed_status, Some(err.to_string()))
                        .await
                }
                None => self.set_status(name, ComponentStatus::Healthy, None).await,
            }
        }
    }

    pub async fn set_ready(&self, ready: bool) {
        *self.ready.write().await = ready;
    }

    pub async fn health(&self) -> HealthResponse {
        let components = self.components.read().await.clone();
        HealthResponse {
            status: HealthResponse::compute_status(&components),
            components,
        }
    }

    pub async fn readiness(&self) -> ReadinessResponse {
        let reason = if !*self.ready.read().await {
            Some("Snapshots not loaded yet")
        } else if !self.health().await.status.is_operational() {
            Some("Every snapshot source failed on the last refresh")
        } else {
            None
        };

        ReadinessResponse {
            ready: reason.is_none(),
            reason: reason.map(str::to_string),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{SourceState, SnapshotSet};
    use crate::models::{IntegrationsSnapshot, StorageSnapshot, TenantsSnapshot};

    fn failed<T: Default>(message: &str) -> SourceState<T> {
        SourceState {
            data: T::default(),
            fetched_at: None,
            error: Some(message.to_string()),
        }
    }

    fn ok<T: Default>() -> SourceState<T> {
        SourceState {
            data: T::default(),
            fetched_at: Some(chrono::Utc::now()),
            error: None,
        }
    }

    #[tokio::test]
    async fn test_health_registry_initial_state() {
        let registry = HealthRegistry::new();
        let health = registry.health().await;

        assert_eq!(health.status, ComponentStatus::Healthy);
        assert!(health.components.is_empty());
    }

    #[tokio::test]
    async fn test_register_sources() {
        let registry = HealthRegistry::new();
        registry.register_sources().await;

        let health = registry.health().await;
        assert_eq!(health.components.len(), 3);
        assert_eq!(
            health.components[components::STORAGE].status,
            ComponentStatus::Healthy
        );
    }

    #[tokio::test]
    async fn test_failed_load_degrades_only_that_source() {
        let registry = HealthRegistry::new();
        registry.register_sources().await;

        let set = SnapshotSet {
            tenants: ok::<TenantsSnapshot>(),
            integrations: failed::<IntegrationsSnapshot>("connection refused"),
            storage: ok::<StorageSnapshot>(),
        };
        registry.record_refresh(&set).await;

        let health = registry.health().await;
        assert_eq!(health.status, ComponentStatus::Degraded);
        assert_eq!(
            health.components[components::INTEGRATIONS].message.as_deref(),
            Some("connection refused")
        );
        assert_eq!(
            health.components[components::TENANTS].status,
            ComponentStatus::Healthy
        );

        let recovered = SnapshotSet {
            integrations: ok::<IntegrationsSnapshot>(),
            ..set
        };
        registry.record_refresh(&recovered).await;
        assert_eq!(registry.health().await.status, ComponentStatus::Healthy);
    }

    #[tokio::test]
    async fn test_every_source_failing_is_unhealthy() {
        let registry = HealthRegistry::new();
        registry.register_sources().await;
        registry.set_ready(true).await;

        let set = SnapshotSet {
            tenants: failed::<TenantsSnapshot>("timed out"),
            integrations: failed::<IntegrationsSnapshot>("timed out"),
            storage: failed::<StorageSnapshot>("timed out"),
        };
        registry.record_refresh(&set).await;

        let health = registry.health().await;
        assert_eq!(health.status, ComponentStatus::Unhealthy);
        assert!(health
            .components
            .values()
            .all(|c| c.status == ComponentStatus::Unhealthy));

        let readiness = registry.readiness().await;
        assert!(!readiness.ready);
        assert!(readiness.reason.unwrap().contains("Every snapshot source"));
    }

    #[tokio::test]
    async fn test_readiness_not_ready_initially() {
        let registry = HealthRegistry::new();
        let readiness = registry.readiness().await;

        assert!(!readiness.ready);
        assert_eq!(readiness.reason.as_deref(), Some("Snapshots not loaded yet"));
    }

    #[tokio::test]
    async fn test_readiness_ready_when_degraded() {
        let registry = HealthRegistry::new();
        registry.register_sources().await;
        registry.set_ready(true).await;
        registry.set_degraded(components::STORAGE, "stale").await;

        let readiness = registry.readiness().await;
        assert!(readiness.ready);
        assert!(readiness.reason.is_none());
    }
}
