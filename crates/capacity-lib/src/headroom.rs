//! Headroom calculation
//!
//! Turns capacity totals and peak utilization into spare capacity, reserves a
//! safety buffer, and expresses the remainder in endpoint-equivalents.

use serde::{Deserialize, Serialize};

use crate::models::TenantMetrics;
use crate::units::ResourceModel;

/// Safety buffer reserved on top of peak utilization (30%)
pub const DEFAULT_BUFFER_PCT: f64 = 0.30;

/// Capacity totals and peak utilization fractions
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CapacityInput {
    pub vcpu_total: f64,
    pub vcpu_used_pct_peak: f64,
    pub ram_gib_total: f64,
    pub ram_used_pct_peak: f64,
}

impl From<&TenantMetrics> for CapacityInput {
    fn from(metrics: &TenantMetrics) -> Self {
        Self {
            vcpu_total: metrics.vcpu_total,
            vcpu_used_pct_peak: metrics.vcpu_used_pct_peak,
            ram_gib_total: metrics.ram_gib_total,
            ram_used_pct_peak: metrics.ram_used_pct_peak,
        }
    }
}

/// Spare capacity after the safety buffer
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct HeadroomResult {
    /// Spare vCPU
    pub vcpu_avail: f64,
    /// Spare RAM in GiB
    pub ram_avail: f64,
    /// Endpoints the spare vCPU can host
    pub headroom_cpu: f64,
    /// Endpoints the spare RAM can host
    pub headroom_ram: f64,
    /// Endpoints that fit under both constraints
    pub safe_headroom: u64,
}

/// Compute headroom for a capacity snapshot
///
/// `available = total * (1 - utilization) * (1 - buffer)`, never negative.
/// The safe headroom is bound by whichever resource runs out first.
pub fn calc_headroom(
    input: &CapacityInput,
    buffer_pct: f64,
    model: &ResourceModel,
) -> HeadroomResult {
    let buffer = fraction(buffer_pct);
    let vcpu_avail = available(input.vcpu_total, input.vcpu_used_pct_peak, buffer);
    let ram_avail = available(input.ram_gib_total, input.ram_used_pct_peak, buffer);

    let headroom_cpu = model.endpoints_for_vcpu(vcpu_avail);
    let headroom_ram = model.endpoints_for_ram(ram_avail);

    HeadroomResult {
        vcpu_avail,
        ram_avail,
        headroom_cpu,
        headroom_ram,
        safe_headroom: headroom_cpu.min(headroom_ram).floor().max(0.0) as u64,
    }
}

/// Headroom for a single tenant's metrics with default ratios
pub fn tenant_headroom(metrics: &TenantMetrics, buffer_pct: f64) -> HeadroomResult {
    calc_headroom(&metrics.into(), buffer_pct, &ResourceModel::default())
}

fn available(total: f64, utilization: f64, buffer: f64) -> f64 {
    let total = sanitize(total).max(0.0);
    (total * (1.0 - fraction(utilization)) * (1.0 - buffer)).max(0.0)
}

/// Clamp a fraction into `[0, 1]`; non-finite values count as zero
pub(crate) fn fraction(value: f64) -> f64 {
    sanitize(value).clamp(0.0, 1.0)
}

/// Replace NaN and infinities with zero
pub(crate) fn sanitize(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}
