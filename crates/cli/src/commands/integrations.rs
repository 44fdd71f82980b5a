//! Integration heartbeats

use anyhow::Result;
use capacity_lib::{CapacityReport, EngineConfig};
use tabled::Tabled;

use crate::output::{
    format_minutes_ago, print_header, print_info, print_json, print_table, status_badge,
    OutputFormat,
};

#[derive(Tabled)]
struct IntegrationTableRow {
    #[tabled(rename = "Key")]
    key: String,
    #[tabled(rename = "Integration")]
    name: String,
    #[tabled(rename = "Last Heartbeat")]
    last_heartbeat: String,
    #[tabled(rename = "Status")]
    status: String,
}

pub fn show_integrations(
    report: &CapacityReport,
    engine: &EngineConfig,
    format: OutputFormat,
) -> Result<()> {
    match format {
        OutputFormat::Json => print_json(&report.integrations)?,
        OutputFormat::Table => {
            print_header("Integrations Health");

            let rows: Vec<IntegrationTableRow> = report
                .integrations
                .iter()
                .map(|i| IntegrationTableRow {
                    key: i.key.clone(),
                    name: i.name.clone(),
                    last_heartbeat: format_minutes_ago(i.minutes),
                    status: status_badge(i.status),
                })
                .collect();
            print_table(&rows);

            print_info(&format!(
                "Heartbeat threshold: watch after {} min, action after {} min",
                engine.heartbeat.warn_minutes, engine.heartbeat.crit_minutes
            ));
        }
    }

    Ok(())
}
