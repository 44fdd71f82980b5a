//! What-if: project additional endpoints against fleet headroom

use anyhow::Result;
use capacity_lib::{CapacityReport, EngineConfig, WhatIfProjection};
use colored::Colorize;
use tabled::Tabled;

use crate::output::{
    format_number, format_pct, format_whole, ordered_roles, print_field, print_header,
    print_json, print_subheader, print_success, print_table, print_warning, role_label,
    OutputFormat,
};

#[derive(Tabled)]
struct NodePlanRow {
    #[tabled(rename = "Role")]
    role: String,
    #[tabled(rename = "Per SU")]
    per_su: u32,
    #[tabled(rename = "Add")]
    add: String,
}

/// One-line verdict for a projection
pub fn verdict(projection: &WhatIfProjection) -> String {
    if projection.within_capacity {
        "Within BBCloud buffered capacity. Proceed with K8s scale-out or per-pool adds.".to_string()
    } else {
        format!(
            "Capacity shortfall: vCPU deficit {}, RAM deficit {} GiB. Add VMs (or a new cluster) then scale K8s pools.",
            format_number(projection.vcpu_deficit),
            format_number(projection.ram_deficit)
        )
    }
}

pub fn show_what_if(
    report: &CapacityReport,
    endpoints: u64,
    engine: &EngineConfig,
    format: OutputFormat,
) -> Result<()> {
    let projection = report.what_if(endpoints, engine);

    match format {
        OutputFormat::Json => print_json(&projection)?,
        OutputFormat::Table => {
            let totals = &report.fleet.totals;
            print_header(&format!(
                "What-If: add {} endpoints",
                format_number(endpoints)
            ));
            print_field("Buffer", format_pct(report.buffer_pct));
            print_field("Current vCPU total", format_whole(totals.vcpu_total));
            print_field("Current RAM total (GiB)", format_whole(totals.ram_gib_total));
            print_field(
                "Safe headroom (EP)",
                format_number(report.fleet.headroom.safe_headroom),
            );
            println!();

            print_field(
                &format!("SUs needed ({} EP each)", format_number(report.endpoints_per_su)),
                projection.sus_needed,
            );
            print_field("vCPU required", format_number(projection.required.add_vcpu));
            print_field("RAM GiB required", format_number(projection.required.add_ram_gib));
            println!();

            if projection.within_capacity {
                print_success(&verdict(&projection));
            } else {
                print_warning(&verdict(&projection));
            }
            println!();

            print_subheader("SU composition");
            let definition = &report.inventory.su_definition;
            let rows: Vec<NodePlanRow> = ordered_roles(definition.keys())
                .into_iter()
                .map(|role| NodePlanRow {
                    per_su: definition.get(&role).copied().unwrap_or(0),
                    add: format_number(projection.node_plan.get(&role).copied().unwrap_or(0)),
                    role: role_label(&role).to_string(),
                })
                .collect();
            print_table(&rows);
            println!(
                "{}",
                format!(
                    "Current SUs: {} • Adding {} SU(s) → add the node counts above.",
                    projection.current_sus, projection.sus_needed
                )
                .dimmed()
            );
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use capacity_lib::HeadroomResult;

    fn projection(vcpu: f64, ram: f64) -> WhatIfProjection {
        let headroom = HeadroomResult {
            vcpu_avail: vcpu,
            ram_avail: ram,
            ..Default::default()
        };
        capacity_lib::project(
            10_000,
            &headroom,
            &Default::default(),
            2,
            &Default::default(),
        )
    }

    #[test]
    fn test_verdict_within_capacity() {
        let text = verdict(&projection(10_000.0, 10_000.0));
        assert!(text.starts_with("Within"));
    }

    #[test]
    fn test_verdict_reports_deficits() {
        // 10k endpoints need 424 vCPU and 1443 GiB
        let text = verdict(&projection(400.5, 100.0));
        assert!(text.contains("vCPU deficit 24"));
        assert!(text.contains("RAM deficit 1,343 GiB"));
    }
}
