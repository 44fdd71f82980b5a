//! Snapshot data models
//!
//! Typed records for the three independently fetched snapshots (tenants,
//! integrations, storage). Every field carries a serde default so partial or
//! loosely populated payloads deserialize into fully populated records; an
//! explicit `null` counts as absent, and counts written as integral floats
//! (`1200.0`) are accepted.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Per-tenant utilization and pipeline metrics for one snapshot
///
/// Percentage fields are fractions in `[0, 1]`. They are not validated here;
/// the calculators clamp them where a value outside the range would flip a sign.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TenantMetrics {
    #[serde(deserialize_with = "lenient::number")]
    pub vcpu_total: f64,
    #[serde(deserialize_with = "lenient::number")]
    pub vcpu_used_pct_peak: f64,
    #[serde(rename = "ramGiBTotal", deserialize_with = "lenient::number")]
    pub ram_gib_total: f64,
    #[serde(deserialize_with = "lenient::number")]
    pub ram_used_pct_peak: f64,
    #[serde(deserialize_with = "lenient::count")]
    pub kafka_lag_messages: u64,
    #[serde(deserialize_with = "lenient::number")]
    pub drain_msgs_per_sec: f64,
    #[serde(deserialize_with = "lenient::number")]
    pub inject_msgs_per_sec: f64,
    #[serde(deserialize_with = "lenient::number")]
    pub pnode_cpu_pct: f64,
    #[serde(deserialize_with = "lenient::number")]
    pub kafka_disk_used_pct: f64,
    #[serde(deserialize_with = "lenient::number")]
    pub spark_inject_per_sec: f64,
    #[serde(deserialize_with = "lenient::number")]
    pub spark_drain_per_sec: f64,
}

/// Kubernetes footprint reported by a tenant
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct K8sSummary {
    pub clusters: u64,
    pub pods: u64,
    pub containers: u64,
}

/// Endpoint breakdown by operating system
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetCounts {
    pub linux: u64,
    pub mac: u64,
    pub windows: u64,
}

/// CNAPP footprint for one cloud provider
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CnappProvider {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub orgs: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tenants: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accounts: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subs: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub projects: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resources: Option<u64>,
}

/// A tenant as reconstructed from the latest snapshot
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Tenant {
    #[serde(deserialize_with = "lenient::null_as_default")]
    pub id: String,
    #[serde(deserialize_with = "lenient::null_as_default")]
    pub name: String,
    #[serde(deserialize_with = "lenient::count")]
    pub endpoints: u64,
    #[serde(
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient::optional_count"
    )]
    pub cnapp_accounts: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cnapp_providers: Option<BTreeMap<String, CnappProvider>>,
    #[serde(deserialize_with = "lenient::null_as_default")]
    pub clusters: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub k8s: Option<K8sSummary>,
    #[serde(deserialize_with = "lenient::null_as_default")]
    pub assets: AssetCounts,
    #[serde(deserialize_with = "lenient::null_as_default")]
    pub metrics: TenantMetrics,
}

/// Node counts per role that make up one scaling unit
///
/// Supplied by the cluster inventory; the engine treats it as an opaque table.
pub type SuDefinition = BTreeMap<String, u32>;

/// Pod phase counts for the shared cluster
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PodSummary {
    pub total: u64,
    pub running: u64,
    pub pending: u64,
    pub failed: u64,
    pub succeeded: u64,
}

/// Inventory of the shared cloud that hosts every tenant
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CloudInventory {
    #[serde(deserialize_with = "lenient::null_as_default")]
    pub su_definition: SuDefinition,
    #[serde(rename = "currentSUs", deserialize_with = "lenient::count")]
    pub current_sus: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node_inventory: Option<BTreeMap<String, u64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pods: Option<PodSummary>,
}

/// Tenant and cluster snapshot
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TenantsSnapshot {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(deserialize_with = "lenient::null_as_default")]
    pub tenants: Vec<Tenant>,
    #[serde(deserialize_with = "lenient::null_as_default")]
    pub bbcloud: CloudInventory,
}

/// An external integration that reports liveness through heartbeats
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Integration {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_heartbeat: Option<DateTime<Utc>>,
}

/// Integration heartbeat snapshot
///
/// Integrations are keyed by short id (`sos`, `soc`, ...) at the top level of
/// the payload, next to `updatedAt`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct IntegrationsSnapshot {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub integrations: BTreeMap<String, Integration>,
}

/// Distributed filesystem roll-up
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HdfsStatus {
    #[serde(deserialize_with = "lenient::null_as_default")]
    pub state: String,
    #[serde(deserialize_with = "lenient::null_as_default")]
    pub safe_mode: bool,
    #[serde(deserialize_with = "lenient::count")]
    pub datanodes_live: u32,
    #[serde(deserialize_with = "lenient::count")]
    pub datanodes_expected: u32,
    #[serde(deserialize_with = "lenient::number")]
    pub percent_used: f64,
    #[serde(deserialize_with = "lenient::number")]
    pub under_replicated_blocks_pct: f64,
    /// Estimated hours until the filesystem is full, when known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ttf_hours: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FailingNode {
    pub node: String,
    pub reason: String,
}

/// Client connectivity to the filesystem from one node pool
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ClientConnectivity {
    pub pool: String,
    #[serde(rename = "successPct15m", deserialize_with = "lenient::number")]
    pub success_pct_15m: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_success: Option<DateTime<Utc>>,
    pub failing_nodes: Vec<FailingNode>,
}

/// A filesystem mount expected on the cluster nodes
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Mount {
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected_device: Option<String>,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_change: Option<DateTime<Utc>>,
}

/// Storage and connectivity snapshot
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StorageSnapshot {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hdfs: Option<HdfsStatus>,
    #[serde(deserialize_with = "lenient::null_as_default")]
    pub client_connectivity: Vec<ClientConnectivity>,
    #[serde(deserialize_with = "lenient::null_as_default")]
    pub mounts: Vec<Mount>,
}

/// Deserializers for loosely typed snapshot fields
mod lenient {
    use serde::de::{Error, Unexpected};
    use serde::{Deserialize, Deserializer};

    /// Treat `null` like a missing field
    pub fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
    where
        D: Deserializer<'de>,
        T: Default + Deserialize<'de>,
    {
        Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
    }

    /// A float where `null` reads as zero
    pub fn number<'de, D>(deserializer: D) -> Result<f64, D::Error>
    where
        D: Deserializer<'de>,
    {
        null_as_default(deserializer)
    }

    /// A non-negative count written either as an integer or an integral float
    pub fn count<'de, D, T>(deserializer: D) -> Result<T, D::Error>
    where
        D: Deserializer<'de>,
        T: Default + TryFrom<u64>,
    {
        Ok(optional_count(deserializer)?.unwrap_or_default())
    }

    pub fn optional_count<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
    where
        D: Deserializer<'de>,
        T: TryFrom<u64>,
    {
        let Some(value) = Option::<f64>::deserialize(deserializer)? else {
            return Ok(None);
        };
        if value < 0.0 || value.fract() != 0.0 || value >= u64::MAX as f64 {
            return Err(D::Error::invalid_value(
                Unexpected::Float(value),
                &"a non-negative whole number",
            ));
        }
        T::try_from(value as u64)
            .map(Some)
            .map_err(|_| D::Error::invalid_value(Unexpected::Float(value), &"a count in range"))
    }
}
