//! Storage health, client connectivity and mounts

use anyhow::Result;
use capacity_lib::{report::StorageReport, CapacityReport};
use colored::Colorize;
use tabled::Tabled;

use crate::output::{
    format_minutes_ago, format_timestamp, print_field, print_header, print_json,
    print_subheader, print_table, print_warning, status_badge, OutputFormat,
};

#[derive(Tabled)]
struct ConnectivityTableRow {
    #[tabled(rename = "Pool")]
    pool: String,
    #[tabled(rename = "Success (15m)")]
    success: String,
    #[tabled(rename = "Last Success")]
    last_success: String,
    #[tabled(rename = "Failing Nodes")]
    failing: String,
    #[tabled(rename = "Status")]
    status: String,
}

#[derive(Tabled)]
struct MountTableRow {
    #[tabled(rename = "Path")]
    path: String,
    #[tabled(rename = "Expected Device")]
    expected_device: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Last Change")]
    last_change: String,
}

fn print_hdfs(storage: &StorageReport) {
    let Some(hdfs) = &storage.hdfs else {
        print_warning("No HDFS status in the storage snapshot");
        return;
    };

    let state = if hdfs.state.is_empty() {
        "unknown".to_string()
    } else {
        hdfs.state.to_uppercase()
    };
    print_field("HDFS State", state);
    if hdfs.safe_mode {
        print_field("Safe mode", "ON".red().bold());
    }
    print_field(
        "Live DNs",
        format!("{}/{}", hdfs.datanodes_live, hdfs.datanodes_expected),
    );
    print_field("% Used", format!("{:.1}%", hdfs.percent_used));
    print_field("Under-rep %", format!("{:.1}%", hdfs.under_replicated_blocks_pct));
    print_field(
        "Time-to-Fill",
        hdfs.ttf_hours
            .map(|h| format!("{h}h"))
            .unwrap_or_else(|| "—".to_string()),
    );
}

pub fn show_storage(report: &CapacityReport, format: OutputFormat) -> Result<()> {
    let storage = &report.storage;

    match format {
        OutputFormat::Json => print_json(storage)?,
        OutputFormat::Table => {
            print_header("BBCloud Storage & HDFS Connectivity");
            print_field("Status", status_badge(storage.status));
            print_hdfs(storage);
            println!();

            print_subheader("Client Connectivity (last 15m)");
            let rows: Vec<ConnectivityTableRow> = storage
                .connectivity
                .iter()
                .map(|c| ConnectivityTableRow {
                    pool: c.pool.clone(),
                    success: format!("{:.1}%", c.success_pct_15m),
                    last_success: format_minutes_ago(c.minutes_since_success),
                    failing: if c.failing_nodes.is_empty() {
                        "—".to_string()
                    } else {
                        c.failing_nodes
                            .iter()
                            .map(|n| format!("{} ({})", n.node, n.reason))
                            .collect::<Vec<_>>()
                            .join(", ")
                    },
                    status: status_badge(c.status),
                })
                .collect();
            print_table(&rows);
            println!();

            print_subheader("Mounts");
            let rows: Vec<MountTableRow> = storage
                .mounts
                .iter()
                .map(|m| MountTableRow {
                    path: m.path.clone(),
                    expected_device: m
                        .expected_device
                        .clone()
                        .unwrap_or_else(|| "—".to_string()),
                    status: status_badge(m.status),
                    last_change: format_timestamp(m.last_change),
                })
                .collect();
            print_table(&rows);
        }
    }

    Ok(())
}
