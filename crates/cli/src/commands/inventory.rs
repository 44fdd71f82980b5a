//! Shared cloud inventory: SU composition, nodes per role and pods

use anyhow::Result;
use capacity_lib::CapacityReport;
use tabled::Tabled;

use crate::output::{
    format_number, ordered_roles, print_field, print_header, print_json, print_subheader,
    print_table, role_label, OutputFormat,
};

#[derive(Tabled)]
struct RoleRow {
    #[tabled(rename = "Role")]
    role: String,
    #[tabled(rename = "Per SU")]
    per_su: u32,
    #[tabled(rename = "Nodes")]
    nodes: String,
}

pub fn show_inventory(report: &CapacityReport, format: OutputFormat) -> Result<()> {
    let inventory = &report.inventory;

    match format {
        OutputFormat::Json => print_json(inventory)?,
        OutputFormat::Table => {
            print_header("BBCloud Inventory");
            print_field("Current SUs", inventory.current_sus);
            print_field("Endpoints per SU", format_number(report.endpoints_per_su));
            println!();

            let mut keys: Vec<&String> = inventory.su_definition.keys().collect();
            if let Some(nodes) = &inventory.node_inventory {
                keys.extend(nodes.keys());
            }
            let rows: Vec<RoleRow> = ordered_roles(keys)
                .into_iter()
                .map(|role| RoleRow {
                    per_su: inventory.su_definition.get(&role).copied().unwrap_or(0),
                    nodes: inventory
                        .node_inventory
                        .as_ref()
                        .and_then(|nodes| nodes.get(&role))
                        .map(|n| format_number(*n))
                        .unwrap_or_else(|| "—".to_string()),
                    role: role_label(&role).to_string(),
                })
                .collect();
            print_table(&rows);

            if let Some(pods) = inventory.pods {
                println!();
                print_subheader("Kubernetes Pods (BBCloud)");
                print_field("Total", format_number(pods.total));
                print_field("Running", format_number(pods.running));
                print_field("Pending", format_number(pods.pending));
                print_field("Failed", format_number(pods.failed));
                print_field("Succeeded", format_number(pods.succeeded));
            }
        }
    }

    Ok(())
}
