//! Unit conversion and resource model
//!
//! Deployment-calibrated ratios expressing how much vCPU and RAM a thousand
//! endpoints consume, and how many endpoints one scaling unit (SU) supports.

use serde::{Deserialize, Serialize};

/// vCPU needed per 1000 endpoints
pub const VCPU_PER_1000: f64 = 42.35;

/// RAM GiB needed per 1000 endpoints
pub const RAM_GIB_PER_1000: f64 = 144.22;

/// Endpoints supported by one scaling unit
pub const ENDPOINTS_PER_SU: u64 = 5000;

/// Resource ratios used by every capacity calculation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourceModel {
    pub vcpu_per_1000_endpoints: f64,
    pub ram_gib_per_1000_endpoints: f64,
    pub endpoints_per_su: u64,
}

impl Default for ResourceModel {
    fn default() -> Self {
        Self {
            vcpu_per_1000_endpoints: VCPU_PER_1000,
            ram_gib_per_1000_endpoints: RAM_GIB_PER_1000,
            endpoints_per_su: ENDPOINTS_PER_SU,
        }
    }
}

/// Additional resources needed to host a number of endpoints
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceRequirement {
    pub add_vcpu: u64,
    pub add_ram_gib: u64,
    pub sus: u64,
}

impl ResourceModel {
    /// Resources required for `endpoints` more endpoints
    ///
    /// Every figure is rounded up so capacity is never under-provisioned.
    pub fn resources_for_endpoints(&self, endpoints: u64) -> ResourceRequirement {
        let units = endpoints as f64 / 1000.0;
        ResourceRequirement {
            add_vcpu: ceil_to_u64(units * self.vcpu_per_1000_endpoints),
            add_ram_gib: ceil_to_u64(units * self.ram_gib_per_1000_endpoints),
            sus: su_needed_for_endpoints(endpoints, self.endpoints_per_su),
        }
    }

    /// Endpoint-equivalents that `vcpu` spare cores can host
    pub fn endpoints_for_vcpu(&self, vcpu: f64) -> f64 {
        per_thousand(vcpu, self.vcpu_per_1000_endpoints)
    }

    /// Endpoint-equivalents that `ram_gib` spare GiB can host
    pub fn endpoints_for_ram(&self, ram_gib: f64) -> f64 {
        per_thousand(ram_gib, self.ram_gib_per_1000_endpoints)
    }
}

/// Shorthand for [`ResourceModel::resources_for_endpoints`] with default ratios
pub fn resources_for_endpoints(endpoints: u64) -> ResourceRequirement {
    ResourceModel::default().resources_for_endpoints(endpoints)
}

/// Scaling units needed to host `endpoints`, rounded up
///
/// A zero `per_su` yields zero rather than dividing by zero.
pub fn su_needed_for_endpoints(endpoints: u64, per_su: u64) -> u64 {
    if per_su == 0 {
        return 0;
    }
    endpoints.div_ceil(per_su)
}

/// Scaling units a tenant currently occupies; every tenant holds at least one
pub fn su_in_use(endpoints: u64, per_su: u64) -> u64 {
    su_needed_for_endpoints(endpoints, per_su).max(1)
}

/// Results too large for an `f64` saturate at `f64::MAX`
fn per_thousand(amount: f64, ratio: f64) -> f64 {
    if ratio <= 0.0 || !ratio.is_finite() || amount.is_nan() || amount <= 0.0 {
        return 0.0;
    }
    ((amount / ratio) * 1000.0).min(f64::MAX)
}

fn ceil_to_u64(value: f64) -> u64 {
    if value.is_finite() && value > 0.0 {
        value.ceil() as u64
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resources_match_ceiling_formula() {
        for endpoints in [0u64, 1, 999, 1000, 1001, 4999, 5000, 60_000, 1_234_567] {
            let req = resources_for_endpoints(endpoints);
            let units = endpoints as f64 / 1000.0;
            assert_eq!(req.add_vcpu, (units * VCPU_PER_1000).ceil() as u64);
            assert_eq!(req.add_ram_gib, (units * RAM_GIB_PER_1000).ceil() as u64);
        }
    }

    #[test]
    fn test_resources_monotonic_in_endpoints() {
        let mut previous = resources_for_endpoints(0);
        for endpoints in (0..50_000u64).step_by(137) {
            let req = resources_for_endpoints(endpoints);
            assert!(req.add_vcpu >= previous.add_vcpu);
            assert!(req.add_ram_gib >= previous.add_ram_gib);
            assert!(req.sus >= previous.sus);
            previous = req;
        }
    }

    #[test]
    fn test_resources_for_sixty_thousand() {
        let req = resources_for_endpoints(60_000);
        assert_eq!(req.add_vcpu, 2541);
        assert_eq!(req.add_ram_gib, 8654);
        assert_eq!(req.sus, 12);
    }

    #[test]
    fn test_su_needed_rounds_up() {
        assert_eq!(su_needed_for_endpoints(0, 5000), 0);
        assert_eq!(su_needed_for_endpoints(5000, 5000), 1);
        assert_eq!(su_needed_for_endpoints(5001, 5000), 2);
    }

    #[test]
    fn test_su_needed_zero_per_su() {
        assert_eq!(su_needed_for_endpoints(12_000, 0), 0);
    }

    #[test]
    fn test_su_in_use_has_floor_of_one() {
        assert_eq!(su_in_use(0, ENDPOINTS_PER_SU), 1);
        assert_eq!(su_in_use(12_000, ENDPOINTS_PER_SU), 3);
    }

    #[test]
    fn test_endpoint_equivalents() {
        let model = ResourceModel::default();
        assert!((model.endpoints_for_vcpu(42.35) - 1000.0).abs() < 1e-9);
        assert!((model.endpoints_for_ram(144.22) - 1000.0).abs() < 1e-9);
    }

    #[test]
    fn test_endpoint_equivalents_saturate_instead_of_overflowing() {
        let model = ResourceModel::default();
        assert_eq!(model.endpoints_for_vcpu(1e307), f64::MAX);
        assert_eq!(model.endpoints_for_ram(f64::MAX), f64::MAX);
        assert_eq!(model.endpoints_for_vcpu(-5.0), 0.0);
    }
}
