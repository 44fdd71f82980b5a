//! Tenant table and tenant detail

use anyhow::Result;
use capacity_lib::{report::TenantRow, CapacityReport, EngineConfig};
use colored::Colorize;
use tabled::Tabled;

use crate::output::{
    abbr, format_number, format_pct, format_whole, print_field, print_header, print_info,
    print_json, print_subheader, print_table, status_badge, OutputFormat,
};

/// Row for the tenants table
#[derive(Tabled)]
struct TenantTableRow {
    #[tabled(rename = "Tenant")]
    name: String,
    #[tabled(rename = "Assets")]
    assets: String,
    #[tabled(rename = "CNAPP")]
    cnapp: String,
    #[tabled(rename = "K8s")]
    k8s: String,
    #[tabled(rename = "Clusters")]
    clusters: String,
    #[tabled(rename = "Kafka Lag")]
    lag: String,
    #[tabled(rename = "Inject→Drain")]
    inject_drain: String,
    #[tabled(rename = "pnode")]
    pnode: String,
    #[tabled(rename = "Headroom")]
    headroom: String,
    #[tabled(rename = "SUs")]
    sus: u64,
    #[tabled(rename = "Status")]
    status: String,
}

impl From<&TenantRow> for TenantTableRow {
    fn from(t: &TenantRow) -> Self {
        Self {
            name: t.name.clone(),
            assets: format!(
                "{} EP · {} L / {} M / {} W",
                abbr(t.endpoints),
                abbr(t.assets.linux),
                abbr(t.assets.mac),
                abbr(t.assets.windows)
            ),
            cnapp: t
                .cnapp_accounts
                .map(format_number)
                .unwrap_or_else(|| "—".to_string()),
            k8s: t
                .k8s
                .map(|k| {
                    format!(
                        "{}c / {}p / {}ctr",
                        abbr(k.clusters),
                        abbr(k.pods),
                        abbr(k.containers)
                    )
                })
                .unwrap_or_else(|| "—".to_string()),
            clusters: if t.clusters.is_empty() {
                "—".to_string()
            } else {
                t.clusters.join(", ")
            },
            lag: format!("{:.1}m", t.signals.lag_min),
            inject_drain: format!("{:.2}×", t.signals.inject_drain_ratio),
            pnode: format_pct(t.signals.cpu_fraction),
            headroom: format_number(t.headroom.safe_headroom),
            sus: t.sus_in_use,
            status: status_badge(t.status),
        }
    }
}

/// Tenants matching `filter`; `None` or `all` selects every tenant
pub fn filter_tenants<'a>(report: &'a CapacityReport, filter: Option<&str>) -> Vec<&'a TenantRow> {
    report
        .tenants
        .iter()
        .filter(|t| match filter {
            None | Some("all") => true,
            Some(id) => t.id == id,
        })
        .collect()
}

pub fn list_tenants(
    report: &CapacityReport,
    filter: Option<&str>,
    engine: &EngineConfig,
    format: OutputFormat,
) -> Result<()> {
    let tenants = filter_tenants(report, filter);

    match format {
        OutputFormat::Json => print_json(&tenants)?,
        OutputFormat::Table => {
            print_header("Tenants");
            println!(
                "Headroom = min(CPU, RAM) with {} buffer. SU = {} endpoints.",
                format_pct(report.buffer_pct),
                format_number(report.endpoints_per_su)
            );
            println!();

            let rows: Vec<TenantTableRow> = tenants.into_iter().map(TenantTableRow::from).collect();
            print_table(&rows);

            let s = &engine.signals;
            print_info(&format!(
                "Signals: Kafka lag > {}m (watch) / {}m (action); pnode CPU > {} / {}; Kafka disk > {} / {}; inject/drain > {:.2}× / {:.2}×",
                s.kafka_lag_minutes.watch,
                s.kafka_lag_minutes.action,
                format_pct(s.pnode_cpu.watch),
                format_pct(s.pnode_cpu.action),
                format_pct(s.kafka_disk.watch),
                format_pct(s.kafka_disk.action),
                s.inject_drain.watch,
                s.inject_drain.action,
            ));
        }
    }

    Ok(())
}

#[derive(Tabled)]
struct ProviderRow {
    #[tabled(rename = "Provider")]
    provider: String,
    #[tabled(rename = "Orgs/Tenants")]
    orgs: String,
    #[tabled(rename = "Accounts")]
    accounts: String,
    #[tabled(rename = "Subs")]
    subs: String,
    #[tabled(rename = "Projects")]
    projects: String,
    #[tabled(rename = "Resources")]
    resources: String,
}

fn optional(value: Option<u64>) -> String {
    value.map(format_number).unwrap_or_else(|| "—".to_string())
}

pub fn show_tenant(report: &CapacityReport, id: &str, format: OutputFormat) -> Result<()> {
    let Some(tenant) = report.tenant(id) else {
        anyhow::bail!("Tenant '{}' not found", id);
    };

    match format {
        OutputFormat::Json => print_json(tenant)?,
        OutputFormat::Table => {
            print_header(&tenant.name);
            print_field("ID", &tenant.id);
            print_field("Status", status_badge(tenant.status));
            println!();

            print_subheader("Assets");
            print_field("Endpoints", format_number(tenant.endpoints));
            print_field(
                "By OS",
                format!(
                    "{} Linux, {} Mac, {} Windows",
                    format_number(tenant.assets.linux),
                    format_number(tenant.assets.mac),
                    format_number(tenant.assets.windows)
                ),
            );
            println!();

            if tenant.cnapp_accounts.is_some() || tenant.cnapp_providers.is_some() {
                print_subheader("CNAPP Footprint");
                print_field(
                    "Total accounts",
                    format_number(tenant.cnapp_accounts.unwrap_or(0)),
                );
                if let Some(providers) = &tenant.cnapp_providers {
                    let rows: Vec<ProviderRow> = providers
                        .iter()
                        .map(|(name, p)| ProviderRow {
                            provider: name.to_uppercase(),
                            orgs: optional(p.orgs.or(p.tenants)),
                            accounts: optional(p.accounts),
                            subs: optional(p.subs),
                            projects: optional(p.projects),
                            resources: optional(p.resources),
                        })
                        .collect();
                    print_table(&rows);
                }
                println!();
            }

            if let Some(k8s) = tenant.k8s {
                print_subheader("Kubernetes");
                print_field("Clusters", format_number(k8s.clusters));
                print_field("Pods", format_number(k8s.pods));
                print_field("Containers", format_number(k8s.containers));
                println!();
            }

            print_subheader("Headroom");
            print_field("vCPU available", format_whole(tenant.headroom.vcpu_avail));
            print_field("RAM GiB available", format_whole(tenant.headroom.ram_avail));
            print_field("Safe headroom (EP)", format_number(tenant.headroom.safe_headroom));
            print_field("SUs in use", tenant.sus_in_use);
            println!();

            print_subheader("Signals");
            print_field("Kafka lag", format!("{:.1}m", tenant.signals.lag_min));
            print_field("Inject→Drain", format!("{:.2}×", tenant.signals.inject_drain_ratio));
            print_field("pnode CPU", format_pct(tenant.signals.cpu_fraction));
            print_field("Kafka disk", format_pct(tenant.signals.disk_fraction));
            print_field("Spark inject→drain", format!("{:.2}×", tenant.signals.compute_ratio));
            println!();

            print_subheader("Explain status");
            println!("{}", tenant.explanation.dimmed());
        }
    }

    Ok(())
}
