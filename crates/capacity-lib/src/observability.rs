//! Observability for the capacity service
//!
//! Provides:
//! - Prometheus gauges for evaluated capacity and health
//! - Structured JSON logging with tracing

use prometheus::{
    register_gauge, register_gauge_vec, register_histogram, register_int_gauge,
    register_int_gauge_vec, Gauge, GaugeVec, Histogram, IntGauge, IntGaugeVec,
};
use std::sync::OnceLock;
use tracing::{info, warn};

use crate::health::HealthStatus;
use crate::report::CapacityReport;

/// Histogram buckets for evaluation latency (in seconds)
const LATENCY_BUCKETS: &[f64] = &[
    0.00001, 0.00005, 0.0001, 0.0005, 0.001, 0.005, 0.01, 0.05, 0.1,
];

static GLOBAL_METRICS: OnceLock<CapacityMetricsInner> = OnceLock::new();

struct CapacityMetricsInner {
    evaluation_latency_seconds: Histogram,
    safe_headroom_endpoints: IntGauge,
    vcpu_available: Gauge,
    ram_available_gib: Gauge,
    fleet_endpoints: IntGauge,
    tenants: IntGauge,
    tenant_status: IntGaugeVec,
    integration_status: IntGaugeVec,
    storage_status: IntGauge,
    source_load_errors: IntGaugeVec,
    source_age_seconds: GaugeVec,
}

impl CapacityMetricsInner {
    fn new() -> Self {
        Self {
            evaluation_latency_seconds: register_histogram!(
                "capacity_evaluation_latency_seconds",
                "Time spent evaluating a snapshot set into a capacity report",
                LATENCY_BUCKETS.to_vec()
            )
            .expect("Failed to register evaluation_latency_seconds"),

            safe_headroom_endpoints: register_int_gauge!(
                "capacity_safe_headroom_endpoints",
                "Fleet safe headroom in endpoint-equivalents after the safety buffer"
            )
            .expect("Failed to register safe_headroom_endpoints"),

            vcpu_available: register_gauge!(
                "capacity_vcpu_available",
                "Spare fleet vCPU after the safety buffer"
            )
            .expect("Failed to register vcpu_available"),

            ram_available_gib: register_gauge!(
                "capacity_ram_available_gib",
                "Spare fleet RAM in GiB after the safety buffer"
            )
            .expect("Failed to register ram_available_gib"),

            fleet_endpoints: register_int_gauge!(
                "capacity_fleet_endpoints",
                "Endpoints across all tenants"
            )
            .expect("Failed to register fleet_endpoints"),

            tenants: register_int_gauge!("capacity_tenants", "Number of tenants in the snapshot")
                .expect("Failed to register tenants"),

            tenant_status: register_int_gauge_vec!(
                "capacity_tenant_status",
                "Tenant health level (0 green, 1 yellow, 2 red)",
                &["tenant"]
            )
            .expect("Failed to register tenant_status"),

            integration_status: register_int_gauge_vec!(
                "capacity_integration_status",
                "Integration heartbeat level (0 green, 1 yellow, 2 red)",
                &["integration"]
            )
            .expect("Failed to register integration_status"),

            storage_status: register_int_gauge!(
                "capacity_storage_status",
                "Storage health level (0 green, 1 yellow, 2 red)"
            )
            .expect("Failed to register storage_status"),

            source_load_errors: register_int_gauge_vec!(
                "capacity_source_load_errors_total",
                "Failed snapshot loads per source",
                &["source"]
            )
            .expect("Failed to register source_load_errors"),

            source_age_seconds: register_gauge_vec!(
                "capacity_source_age_seconds",
                "Seconds between a snapshot's updatedAt and the evaluation",
                &["source"]
            )
            .expect("Failed to register source_age_seconds"),
        }
    }
}

/// Handle to the process-wide capacity metrics
///
/// Clones share the same registered metrics.
#[derive(Clone)]
pub struct CapacityMetrics {
    _private: (),
}

impl Default for CapacityMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl CapacityMetrics {
    pub fn new() -> Self {
        GLOBAL_METRICS.get_or_init(CapacityMetricsInner::new);
        Self { _private: () }
    }

    fn inner(&self) -> &CapacityMetricsInner {
        GLOBAL_METRICS.get_or_init(CapacityMetricsInner::new)
    }

    pub fn observe_evaluation_latency(&self, duration_secs: f64) {
        self.inner().evaluation_latency_seconds.observe(duration_secs);
    }

    pub fn inc_source_load_errors(&self, source: &str) {
        self.inner()
            .source_load_errors
            .with_label_values(&[source])
            .inc();
    }

    /// Publish the values of a freshly built report
    pub fn record_report(&self, report: &CapacityReport) {
        let inner = self.inner();
        let headroom = &report.fleet.headroom;

        inner
            .safe_headroom_endpoints
            .set(i64::try_from(headroom.safe_headroom).unwrap_or(i64::MAX));
        inner.vcpu_available.set(headroom.vcpu_avail);
        inner.ram_available_gib.set(headroom.ram_avail);
        inner
            .fleet_endpoints
            .set(i64::try_from(report.fleet.totals.endpoints).unwrap_or(i64::MAX));
        inner.tenants.set(report.tenants.len() as i64);

        // Tenants and integrations come and go between snapshots.
        inner.tenant_status.reset();
        for tenant in &report.tenants {
            inner
                .tenant_status
                .with_label_values(&[tenant.id.as_str()])
                .set(tenant.status.level());
        }

        inner.integration_status.reset();
        for integration in &report.integrations {
            inner
                .integration_status
                .with_label_values(&[integration.key.as_str()])
                .set(integration.status.level());
        }

        inner.storage_status.set(report.storage.status.level());

        for source in &report.sources {
            if let Some(as_of) = source.updated_at.or(source.fetched_at) {
                let age = report.generated_at - as_of;
                inner
                    .source_age_seconds
                    .with_label_values(&[source.name.as_str()])
                    .set(age.num_milliseconds().max(0) as f64 / 1000.0);
            }
        }
    }
}

/// Structured logger for capacity evaluation events
#[derive(Clone)]
pub struct StructuredLogger {
    instance: String,
}

impl StructuredLogger {
    pub fn new(instance: impl Into<String>) -> Self {
        Self {
            instance: instance.into(),
        }
    }

    pub fn log_startup(&self, version: &str, snapshot_dir: &str) {
        info!(
            event = "service_started",
            instance = %self.instance,
            version = %version,
            snapshot_dir = %snapshot_dir,
            "Capacity service started"
        );
    }

    pub fn log_shutdown(&self, reason: &str) {
        info!(
            event = "service_shutdown",
            instance = %self.instance,
            reason = %reason,
            "Capacity service shutting down"
        );
    }

    pub fn log_source_failure(&self, source: &str, error: &str) {
        warn!(
            event = "snapshot_load_failed",
            instance = %self.instance,
            source = %source,
            error = %error,
            "Snapshot load failed, serving empty defaults"
        );
    }

    /// Log the headline figures of a report
    pub fn log_report(&self, report: &CapacityReport, latency_secs: f64) {
        info!(
            event = "report_built",
            instance = %self.instance,
            tenants = report.tenants.len(),
            endpoints = report.fleet.totals.endpoints,
            safe_headroom = report.fleet.headroom.safe_headroom,
            overall_status = %report.overall_status,
            latency_secs = latency_secs,
            "Capacity report evaluated"
        );
    }

    /// Log a tenant whose status moved between evaluations
    pub fn log_status_change(
        &self,
        tenant_id: &str,
        previous: HealthStatus,
        current: HealthStatus,
        explanation: &str,
    ) {
        if current > previous {
            warn!(
                event = "tenant_status_changed",
                instance = %self.instance,
                tenant = %tenant_id,
                previous = %previous,
                current = %current,
                explanation = %explanation,
                "Tenant health degraded"
            );
        } else {
            info!(
                event = "tenant_status_changed",
                instance = %self.instance,
                tenant = %tenant_id,
                previous = %previous,
                current = %current,
                "Tenant health recovered"
            );
        }
    }

    /// Compare two reports and log every tenant status change
    pub fn log_status_changes(&self, previous: &CapacityReport, current: &CapacityReport) {
        for tenant in &current.tenants {
            if let Some(before) = previous.tenant(&tenant.id) {
                if before.status != tenant.status {
                    self.log_status_change(
                        &tenant.id,
                        before.status,
                        tenant.status,
                        &tenant.explanation,
                    );
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::source::SnapshotSet;
    use chrono::Utc;

    #[test]
    fn test_capacity_metrics_record_report() {
        let metrics = CapacityMetrics::new();
        let report = CapacityReport::build(&SnapshotSet::default(), &EngineConfig::default(), Utc::now());

        metrics.observe_evaluation_latency(0.0001);
        metrics.inc_source_load_errors("tenants");
        metrics.record_report(&report);

        let families = prometheus::gather();
        assert!(families
            .iter()
            .any(|f| f.get_name() == "capacity_safe_headroom_endpoints"));
    }

    #[test]
    fn test_structured_logger_creation() {
        let logger = StructuredLogger::new("capacity-0");
        assert_eq!(logger.instance, "capacity-0");
    }
}
