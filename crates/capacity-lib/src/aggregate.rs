//! Fleet-wide aggregation of tenant metrics

use serde::{Deserialize, Serialize};

use crate::headroom::{calc_headroom, fraction, sanitize, CapacityInput, HeadroomResult};
use crate::models::Tenant;
use crate::units::ResourceModel;

/// Totals across every tenant in a snapshot
///
/// Utilization is weighted by capacity (total used / total capacity), so a
/// large tenant moves the fleet figure more than a small one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FleetTotals {
    pub vcpu_total: f64,
    pub ram_gib_total: f64,
    pub vcpu_used: f64,
    pub ram_used: f64,
    pub endpoints: u64,
    pub cnapp_accounts: u64,
    pub vcpu_used_pct_peak: f64,
    pub ram_used_pct_peak: f64,
}

impl FleetTotals {
    pub fn capacity_input(&self) -> CapacityInput {
        CapacityInput {
            vcpu_total: self.vcpu_total,
            vcpu_used_pct_peak: self.vcpu_used_pct_peak,
            ram_gib_total: self.ram_gib_total,
            ram_used_pct_peak: self.ram_used_pct_peak,
        }
    }
}

/// Fleet headroom together with the totals it was computed from
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FleetHeadroom {
    #[serde(flatten)]
    pub headroom: HeadroomResult,
    pub totals: FleetTotals,
}

/// Fold tenants into fleet totals
pub fn totals_from_tenants(tenants: &[Tenant]) -> FleetTotals {
    let mut totals = tenants.iter().fold(FleetTotals::default(), |mut acc, tenant| {
        let m = &tenant.metrics;
        let vcpu = sanitize(m.vcpu_total).max(0.0);
        let ram = sanitize(m.ram_gib_total).max(0.0);

        acc.vcpu_total += vcpu;
        acc.ram_gib_total += ram;
        acc.vcpu_used += vcpu * fraction(m.vcpu_used_pct_peak);
        acc.ram_used += ram * fraction(m.ram_used_pct_peak);
        acc.endpoints = acc.endpoints.saturating_add(tenant.endpoints);
        acc.cnapp_accounts = acc
            .cnapp_accounts
            .saturating_add(tenant.cnapp_accounts.unwrap_or(0));
        acc
    });

    for sum in [
        &mut totals.vcpu_total,
        &mut totals.ram_gib_total,
        &mut totals.vcpu_used,
        &mut totals.ram_used,
    ] {
        *sum = sum.min(f64::MAX);
    }
    totals.vcpu_used_pct_peak = weighted(totals.vcpu_used, totals.vcpu_total);
    totals.ram_used_pct_peak = weighted(totals.ram_used, totals.ram_gib_total);
    totals
}

/// Fleet headroom over the combined capacity of all tenants
pub fn overall_headroom_from_tenants(
    tenants: &[Tenant],
    buffer_pct: f64,
    model: &ResourceModel,
) -> FleetHeadroom {
    let totals = totals_from_tenants(tenants);
    FleetHeadroom {
        headroom: calc_headroom(&totals.capacity_input(), buffer_pct, model),
        totals,
    }
}

fn weighted(used: f64, total: f64) -> f64 {
    if total > 0.0 {
        used / total
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::headroom::DEFAULT_BUFFER_PCT;
    use crate::models::TenantMetrics;

    fn tenant(id: &str, endpoints: u64, vcpu: f64, vcpu_pct: f64, ram: f64, ram_pct: f64) -> Tenant {
        Tenant {
            id: id.to_string(),
            name: id.to_uppercase(),
            endpoints,
            cnapp_accounts: Some(3),
            metrics: TenantMetrics {
                vcpu_total: vcpu,
                vcpu_used_pct_peak: vcpu_pct,
                ram_gib_total: ram,
                ram_used_pct_peak: ram_pct,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_overflowing_fleet_totals_saturate() {
        let tenants = vec![
            tenant("a", 10, 1e308, 0.5, 1e308, 0.5),
            tenant("b", 10, 1e308, 0.5, 1e308, 0.5),
        ];
        let fleet = overall_headroom_from_tenants(&tenants, 0.3, &ResourceModel::default());

        assert_eq!(fleet.totals.vcpu_total, f64::MAX);
        assert!(fleet.totals.vcpu_used_pct_peak.is_finite());
        assert!(fleet.headroom.headroom_cpu.is_finite());
        assert!(fleet.headroom.vcpu_avail.is_finite());
    }

    #[test]
    fn test_empty_fleet_is_all_zero() {
        let totals = totals_from_tenants(&[]);

        assert_eq!(totals, FleetTotals::default());
        assert!(!totals.vcpu_used_pct_peak.is_nan());
        assert!(!totals.ram_used_pct_peak.is_nan());
    }

    #[test]
    fn test_zero_capacity_tenants_have_zero_utilization() {
        let totals = totals_from_tenants(&[tenant("a", 10, 0.0, 0.9, 0.0, 0.9)]);

        assert_eq!(totals.vcpu_used_pct_peak, 0.0);
        assert_eq!(totals.ram_used_pct_peak, 0.0);
        assert_eq!(totals.endpoints, 10);
    }

    #[test]
    fn test_utilization_is_weighted_by_capacity() {
        let tenants = vec![
            tenant("big", 1000, 900.0, 0.9, 100.0, 0.5),
            tenant("small", 100, 100.0, 0.1, 100.0, 0.5),
        ];
        let totals = totals_from_tenants(&tenants);

        // (900 * 0.9 + 100 * 0.1) / 1000, not the plain mean of 0.5
        assert!((totals.vcpu_used_pct_peak - 0.82).abs() < 1e-9);
        assert!((totals.ram_used_pct_peak - 0.5).abs() < 1e-9);
        assert_eq!(totals.vcpu_total, 1000.0);
        assert_eq!(totals.endpoints, 1100);
        assert_eq!(totals.cnapp_accounts, 6);
    }

    #[test]
    fn test_order_independent() {
        let a = tenant("a", 5000, 512.0, 0.61, 2048.0, 0.47);
        let b = tenant("b", 12_000, 1024.0, 0.33, 4096.0, 0.72);
        let c = tenant("c", 800, 64.0, 0.95, 256.0, 0.12);

        let forward = totals_from_tenants(&[a.clone(), b.clone(), c.clone()]);
        let reverse = totals_from_tenants(&[c, b, a]);

        assert_eq!(forward.endpoints, reverse.endpoints);
        assert!((forward.vcpu_total - reverse.vcpu_total).abs() < 1e-9);
        assert!((forward.vcpu_used_pct_peak - reverse.vcpu_used_pct_peak).abs() < 1e-12);
        assert!((forward.ram_used_pct_peak - reverse.ram_used_pct_peak).abs() < 1e-12);
    }

    #[test]
    fn test_overall_headroom_uses_totals() {
        let tenants = vec![
            tenant("a", 5000, 500.0, 0.5, 2000.0, 0.5),
            tenant("b", 5000, 500.0, 0.5, 2000.0, 0.5),
        ];
        let model = ResourceModel::default();
        let fleet = overall_headroom_from_tenants(&tenants, DEFAULT_BUFFER_PCT, &model);

        let direct = calc_headroom(&fleet.totals.capacity_input(), DEFAULT_BUFFER_PCT, &model);
        assert_eq!(fleet.headroom, direct);
        assert!((fleet.headroom.vcpu_avail - 350.0).abs() < 1e-9);
    }
}
