//! Capacity report
//!
//! Binds a [`SnapshotSet`] to the calculators and produces every value the
//! operator views render: fleet totals and headroom, per-tenant verdicts,
//! integration heartbeats and storage health.

use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::aggregate::{overall_headroom_from_tenants, FleetHeadroom};
use crate::config::EngineConfig;
use crate::headroom::{calc_headroom, HeadroomResult};
use crate::health::{
    components, connectivity_status, explain_status, heartbeat_status, mount_status,
    HealthStatus, Signals,
};
use crate::models::{
    AssetCounts, CloudInventory, CnappProvider, FailingNode, HdfsStatus, K8sSummary, Tenant,
};
use crate::source::SnapshotSet;
use crate::units::su_in_use;
use crate::whatif::{project, WhatIfProjection};

/// Evaluated view of one tenant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TenantRow {
    pub id: String,
    pub name: String,
    pub endpoints: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cnapp_accounts: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cnapp_providers: Option<std::collections::BTreeMap<String, CnappProvider>>,
    pub clusters: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub k8s: Option<K8sSummary>,
    pub assets: AssetCounts,
    pub headroom: HeadroomResult,
    pub signals: Signals,
    pub sus_in_use: u64,
    pub status: HealthStatus,
    pub explanation: String,
}

impl TenantRow {
    pub fn evaluate(tenant: &Tenant, config: &EngineConfig) -> Self {
        let signals = Signals::from_metrics(&tenant.metrics);
        Self {
            id: tenant.id.clone(),
            name: tenant.name.clone(),
            endpoints: tenant.endpoints,
            cnapp_accounts: tenant.cnapp_accounts,
            cnapp_providers: tenant.cnapp_providers.clone(),
            clusters: tenant.clusters.clone(),
            k8s: tenant.k8s,
            assets: tenant.assets,
            headroom: calc_headroom(&(&tenant.metrics).into(), config.buffer_pct, &config.model),
            signals,
            sus_in_use: su_in_use(tenant.endpoints, config.model.endpoints_per_su),
            status: config.signals.evaluate(&signals),
            explanation: explain_status(tenant, &signals, &config.signals),
        }
    }
}

/// Heartbeat verdict for one integration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntegrationRow {
    pub key: String,
    pub name: String,
    pub minutes: Option<f64>,
    pub status: HealthStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectivityRow {
    pub pool: String,
    pub success_pct_15m: f64,
    pub minutes_since_success: Option<f64>,
    pub failing_nodes: Vec<FailingNode>,
    pub status: HealthStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MountRow {
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected_device: Option<String>,
    pub status: HealthStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_change: Option<DateTime<Utc>>,
}

/// Filesystem roll-up, client connectivity and mounts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageReport {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hdfs: Option<HdfsStatus>,
    pub status: HealthStatus,
    pub connectivity: Vec<ConnectivityRow>,
    pub mounts: Vec<MountRow>,
}

/// When a source was last fetched and whether the fetch succeeded
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceFreshness {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fetched_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapacityReport {
    pub generated_at: DateTime<Utc>,
    pub buffer_pct: f64,
    pub endpoints_per_su: u64,
    pub fleet: FleetHeadroom,
    pub inventory: CloudInventory,
    pub tenants: Vec<TenantRow>,
    pub integrations: Vec<IntegrationRow>,
    pub storage: StorageReport,
    pub sources: Vec<SourceFreshness>,
    /// Worst status across tenants, integrations and storage
    pub overall_status: HealthStatus,
}

impl CapacityReport {
    /// Evaluate a snapshot set at `now`
    pub fn build(set: &SnapshotSet, config: &EngineConfig, now: DateTime<Utc>) -> Self {
        let tenants_snapshot = &set.tenants.data;
        let fleet = overall_headroom_from_tenants(
            &tenants_snapshot.tenants,
            config.buffer_pct,
            &config.model,
        );

        let tenants: Vec<TenantRow> = tenants_snapshot
            .tenants
            .iter()
            .map(|t| TenantRow::evaluate(t, config))
            .collect();

        let integrations: Vec<IntegrationRow> = set
            .integrations
            .data
            .integrations
            .iter()
            .map(|(key, integration)| {
                let heartbeat = heartbeat_status(integration.last_heartbeat, now, &config.heartbeat);
                IntegrationRow {
                    key: key.clone(),
                    name: if integration.name.is_empty() {
                        key.to_uppercase()
                    } else {
                        integration.name.clone()
                    },
                    minutes: heartbeat.minutes,
                    status: heartbeat.status,
                }
            })
            .collect();

        let storage = build_storage(set, config, now);

        let overall_status = tenants
            .iter()
            .map(|t| t.status)
            .chain(integrations.iter().map(|i| i.status))
            .chain(std::iter::once(storage.status))
            .max()
            .unwrap_or(HealthStatus::Green);

        Self {
            generated_at: now,
            buffer_pct: config.buffer_pct,
            endpoints_per_su: config.model.endpoints_per_su,
            fleet,
            inventory: tenants_snapshot.bbcloud.clone(),
            tenants,
            integrations,
            storage,
            sources: vec![
                SourceFreshness {
                    name: components::TENANTS.to_string(),
                    updated_at: tenants_snapshot.updated_at,
                    fetched_at: set.tenants.fetched_at,
                    error: set.tenants.error.clone(),
                },
                SourceFreshness {
                    name: components::INTEGRATIONS.to_string(),
                    updated_at: set.integrations.data.updated_at,
                    fetched_at: set.integrations.fetched_at,
                    error: set.integrations.error.clone(),
                },
                SourceFreshness {
                    name: components::STORAGE.to_string(),
                    updated_at: set.storage.data.updated_at,
                    fetched_at: set.storage.fetched_at,
                    error: set.storage.error.clone(),
                },
            ],
            overall_status,
        }
    }

    /// Evaluate and record how long the evaluation took
    pub fn build_timed(
        set: &SnapshotSet,
        config: &EngineConfig,
        now: DateTime<Utc>,
    ) -> (Self, std::time::Duration) {
        let started = Instant::now();
        let report = Self::build(set, config, now);
        (report, started.elapsed())
    }

    pub fn tenant(&self, id: &str) -> Option<&TenantRow> {
        self.tenants.iter().find(|t| t.id == id)
    }

    /// Project additional endpoints against the fleet headroom
    pub fn what_if(&self, endpoints: u64, config: &EngineConfig) -> WhatIfProjection {
        project(
            endpoints,
            &self.fleet.headroom,
            &self.inventory.su_definition,
            self.inventory.current_sus,
            &config.model,
        )
    }

    pub fn count_by_status(&self, status: HealthStatus) -> usize {
        self.tenants.iter().filter(|t| t.status == status).count()
    }
}

fn build_storage(set: &SnapshotSet, config: &EngineConfig, now: DateTime<Utc>) -> StorageReport {
    let snapshot = &set.storage.data;
    let status = match &snapshot.hdfs {
        Some(hdfs) => config.storage.evaluate(hdfs),
        None => HealthStatus::Yellow,
    };

    let connectivity = snapshot
        .client_connectivity
        .iter()
        .map(|pool| ConnectivityRow {
            pool: pool.pool.clone(),
            success_pct_15m: pool.success_pct_15m,
            minutes_since_success: pool
                .last_success
                .and_then(|last| heartbeat_status(Some(last), now, &config.heartbeat).minutes),
            failing_nodes: pool.failing_nodes.clone(),
            status: connectivity_status(pool, now),
        })
        .collect();

    let mounts = snapshot
        .mounts
        .iter()
        .map(|mount| MountRow {
            path: mount.path.clone(),
            expected_device: mount.expected_device.clone(),
            status: mount_status(mount),
            last_change: mount.last_change,
        })
        .collect();

    StorageReport {
        hdfs: snapshot.hdfs.clone(),
        status,
        connectivity,
        mounts,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        ClientConnectivity, Integration, IntegrationsSnapshot, Mount, StorageSnapshot,
        TenantMetrics, TenantsSnapshot,
    };
    use crate::source::SourceState;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap()
    }

    fn snapshot_set() -> SnapshotSet {
        let tenants = TenantsSnapshot {
            updated_at: Some(now() - Duration::minutes(2)),
            tenants: vec![
                Tenant {
                    id: "acme".to_string(),
                    name: "Acme".to_string(),
                    endpoints: 12_000,
                    cnapp_accounts: Some(40),
                    metrics: TenantMetrics {
                        vcpu_total: 1000.0,
                        vcpu_used_pct_peak: 0.5,
                        ram_gib_total: 4000.0,
                        ram_used_pct_peak: 0.5,
                        pnode_cpu_pct: 0.8,
                        ..Default::default()
                    },
                    ..Default::default()
                },
                Tenant {
                    id: "globex".to_string(),
                    name: "Globex".to_string(),
                    endpoints: 3000,
                    metrics: TenantMetrics {
                        vcpu_total: 200.0,
                        vcpu_used_pct_peak: 0.2,
                        ram_gib_total: 800.0,
                        ram_used_pct_peak: 0.3,
                        ..Default::default()
                    },
                    ..Default::default()
                },
            ],
            bbcloud: CloudInventory {
                su_definition: [("pnode".to_string(), 4), ("nginx".to_string(), 2)]
                    .into_iter()
                    .collect(),
                current_sus: 3,
                ..Default::default()
            },
        };

        let integrations = IntegrationsSnapshot {
            updated_at: None,
            integrations: [
                (
                    "sos".to_string(),
                    Integration {
                        name: "SOS Scanner".to_string(),
                        last_heartbeat: Some(now() - Duration::minutes(5)),
                    },
                ),
                ("soc".to_string(), Integration::default()),
            ]
            .into_iter()
            .collect(),
        };

        let storage = StorageSnapshot {
            hdfs: Some(HdfsStatus {
                datanodes_live: 10,
                datanodes_expected: 10,
                ..Default::default()
            }),
            client_connectivity: vec![ClientConnectivity {
                pool: "spark".to_string(),
                success_pct_15m: 99.0,
                last_success: Some(now() - Duration::minutes(1)),
                failing_nodes: Vec::new(),
            }],
            mounts: vec![Mount {
                path: "/data".to_string(),
                status: "mounted".to_string(),
                ..Default::default()
            }],
            ..Default::default()
        };

        SnapshotSet {
            tenants: SourceState::from_result(Ok(tenants), now()),
            integrations: SourceState::from_result(Ok(integrations), now()),
            storage: SourceState::from_result(Ok(storage), now()),
        }
    }

    #[test]
    fn test_report_evaluates_every_section() {
        let config = EngineConfig::default();
        let report = CapacityReport::build(&snapshot_set(), &config, now());

        assert_eq!(report.tenants.len(), 2);
        assert_eq!(report.fleet.totals.endpoints, 15_000);
        assert_eq!(report.fleet.totals.cnapp_accounts, 40);

        let acme = report.tenant("acme").unwrap();
        assert_eq!(acme.status, HealthStatus::Yellow);
        assert_eq!(acme.sus_in_use, 3);
        assert_eq!(report.tenant("globex").unwrap().status, HealthStatus::Green);

        let soc = report.integrations.iter().find(|i| i.key == "soc").unwrap();
        assert_eq!(soc.name, "SOC");
        assert_eq!(soc.status, HealthStatus::Red);
        assert_eq!(soc.minutes, None);

        assert_eq!(report.storage.status, HealthStatus::Green);
        assert_eq!(report.storage.connectivity[0].status, HealthStatus::Green);
        assert_eq!(report.storage.mounts[0].status, HealthStatus::Green);

        assert_eq!(report.overall_status, HealthStatus::Red);
        assert_eq!(report.count_by_status(HealthStatus::Yellow), 1);
    }

    #[test]
    fn test_empty_snapshots_do_not_crash() {
        let report = CapacityReport::build(&SnapshotSet::default(), &EngineConfig::default(), now());

        assert!(report.tenants.is_empty());
        assert_eq!(report.fleet.headroom.safe_headroom, 0);
        assert_eq!(report.storage.status, HealthStatus::Yellow);
        assert_eq!(report.overall_status, HealthStatus::Yellow);
    }

    #[test]
    fn test_what_if_uses_fleet_headroom_and_inventory() {
        let config = EngineConfig::default();
        let report = CapacityReport::build(&snapshot_set(), &config, now());
        let projection = report.what_if(10_000, &config);

        assert_eq!(projection.sus_needed, 2);
        assert_eq!(projection.current_sus, 3);
        assert_eq!(projection.node_plan["pnode"], 8);
        assert_eq!(projection.node_plan["nginx"], 4);
        assert!(projection.within_capacity);
    }

    #[test]
    fn test_source_errors_surface_in_freshness() {
        let mut set = snapshot_set();
        set.storage = SourceState {
            data: StorageSnapshot::default(),
            fetched_at: None,
            error: Some("connection refused".to_string()),
        };
        let report = CapacityReport::build(&set, &EngineConfig::default(), now());

        let storage = report.sources.iter().find(|s| s.name == "storage").unwrap();
        assert_eq!(storage.error.as_deref(), Some("connection refused"));
        assert!(storage.fetched_at.is_none());
        assert_eq!(report.tenants.len(), 2);
    }

    #[test]
    fn test_build_is_deterministic() {
        let config = EngineConfig::default();
        let set = snapshot_set();
        assert_eq!(
            CapacityReport::build(&set, &config, now()),
            CapacityReport::build(&set, &config, now())
        );
    }
}
