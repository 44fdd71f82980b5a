//! What-if projection
//!
//! Projects a hypothetical endpoint increase against current headroom and
//! turns the SU requirement into concrete node additions per role.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::headroom::HeadroomResult;
use crate::models::SuDefinition;
use crate::units::{su_needed_for_endpoints, ResourceModel, ResourceRequirement};

/// Node additions per role for `su_count` scaling units
pub fn node_plan_for_sus(su_count: u64, definition: &SuDefinition) -> BTreeMap<String, u64> {
    definition
        .iter()
        .map(|(role, per_su)| (role.clone(), u64::from(*per_su).saturating_mul(su_count)))
        .collect()
}

/// Outcome of a what-if scenario
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WhatIfProjection {
    pub endpoints: u64,
    pub required: ResourceRequirement,
    pub sus_needed: u64,
    pub current_sus: u32,
    pub node_plan: BTreeMap<String, u64>,
    pub within_capacity: bool,
    /// vCPU still missing after spending the buffered headroom
    pub vcpu_deficit: u64,
    /// RAM GiB still missing after spending the buffered headroom
    pub ram_deficit: u64,
}

/// Project `endpoints` additional endpoints against `headroom`
///
/// Available capacity is floored before comparison, so fractional spare
/// capacity never counts toward the requirement.
pub fn project(
    endpoints: u64,
    headroom: &HeadroomResult,
    definition: &SuDefinition,
    current_sus: u32,
    model: &ResourceModel,
) -> WhatIfProjection {
    let required = model.resources_for_endpoints(endpoints);
    let vcpu_avail = whole(headroom.vcpu_avail);
    let ram_avail = whole(headroom.ram_avail);

    let vcpu_deficit = required.add_vcpu.saturating_sub(vcpu_avail);
    let ram_deficit = required.add_ram_gib.saturating_sub(ram_avail);

    let sus_needed = su_needed_for_endpoints(endpoints, model.endpoints_per_su);

    WhatIfProjection {
        endpoints,
        required,
        sus_needed,
        current_sus,
        node_plan: node_plan_for_sus(sus_needed, definition),
        within_capacity: vcpu_deficit == 0 && ram_deficit == 0,
        vcpu_deficit,
        ram_deficit,
    }
}

fn whole(value: f64) -> u64 {
    if value.is_finite() && value > 0.0 {
        value.floor() as u64
    } else {
        0
    }
}
