//! Fleet overview cards and source freshness

use anyhow::Result;
use capacity_lib::{CapacityReport, HealthStatus};
use colored::Colorize;
use serde::Serialize;
use tabled::Tabled;

use crate::output::{
    format_number, format_timestamp, format_whole, print_field, print_header, print_json,
    print_subheader, print_table, status_badge, OutputFormat,
};

#[derive(Debug, Serialize)]
pub struct Overview {
    pub tenants: usize,
    pub endpoints: u64,
    pub cnapp_accounts: u64,
    pub vcpu_total: f64,
    pub ram_gib_total: f64,
    pub safe_headroom: u64,
    pub overall_status: HealthStatus,
    pub tenants_by_status: StatusCounts,
}

#[derive(Debug, Default, PartialEq, Serialize)]
pub struct StatusCounts {
    pub green: usize,
    pub yellow: usize,
    pub red: usize,
}

impl Overview {
    pub fn from_report(report: &CapacityReport) -> Self {
        let totals = &report.fleet.totals;
        Self {
            tenants: report.tenants.len(),
            endpoints: totals.endpoints,
            cnapp_accounts: totals.cnapp_accounts,
            vcpu_total: totals.vcpu_total,
            ram_gib_total: totals.ram_gib_total,
            safe_headroom: report.fleet.headroom.safe_headroom,
            overall_status: report.overall_status,
            tenants_by_status: StatusCounts {
                green: report.count_by_status(HealthStatus::Green),
                yellow: report.count_by_status(HealthStatus::Yellow),
                red: report.count_by_status(HealthStatus::Red),
            },
        }
    }
}

#[derive(Tabled)]
struct SourceRow {
    #[tabled(rename = "Source")]
    name: String,
    #[tabled(rename = "Updated")]
    updated_at: String,
    #[tabled(rename = "Fetched")]
    fetched_at: String,
    #[tabled(rename = "Error")]
    error: String,
}

pub fn show_overview(report: &CapacityReport, format: OutputFormat) -> Result<()> {
    let overview = Overview::from_report(report);

    match format {
        OutputFormat::Json => print_json(&overview)?,
        OutputFormat::Table => {
            print_header("Capacity Overview");
            print_field("Status", status_badge(overview.overall_status));
            print_field("Tenants", overview.tenants);
            print_field("Total Endpoints", format_number(overview.endpoints));
            print_field("CNAPP Accounts", format_number(overview.cnapp_accounts));
            print_field("BBCloud vCPU", format_whole(overview.vcpu_total));
            print_field("BBCloud RAM (GiB)", format_whole(overview.ram_gib_total));
            print_field(
                "Safe Headroom (EP)",
                format_number(overview.safe_headroom).cyan(),
            );
            print_field(
                "Tenant statuses",
                format!(
                    "{} healthy, {} watch, {} action",
                    overview.tenants_by_status.green,
                    overview.tenants_by_status.yellow,
                    overview.tenants_by_status.red
                ),
            );
            println!();

            print_subheader("Sources");
            let rows: Vec<SourceRow> = report
                .sources
                .iter()
                .map(|s| SourceRow {
                    name: s.name.clone(),
                    updated_at: format_timestamp(s.updated_at),
                    fetched_at: format_timestamp(s.fetched_at),
                    error: s.error.clone().unwrap_or_else(|| "—".to_string()),
                })
                .collect();
            print_table(&rows);
        }
    }

    Ok(())
}
