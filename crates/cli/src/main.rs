//! Capacity control plane CLI
//!
//! Fetches the tenants, integrations and storage snapshots (from the agent or
//! a local directory), evaluates them, and renders operator views.

mod client;
mod commands;
mod config;
mod output;

use anyhow::{Context, Result};
use capacity_lib::{load_snapshots, CapacityReport, FileSource, SnapshotSource};
use chrono::Utc;
use clap::{Parser, Subcommand};
use commands::{integrations, inventory, overview, storage, tenants, whatif};
use tracing_subscriber::EnvFilter;

/// Capacity Control Plane CLI
#[derive(Parser)]
#[command(name = "capctl")]
#[command(author, version, about = "CLI for the Capacity Control Plane", long_about = None)]
pub struct Cli {
    /// Agent URL serving the raw snapshots (can also be set via CAPCTL_API_URL env var)
    #[arg(long, env = "CAPCTL_API_URL")]
    pub api_url: Option<String>,

    /// Read tenants.json, integrations.json and hdfs.json from this directory instead of the agent
    #[arg(long)]
    pub snapshot_dir: Option<String>,

    /// Output format
    #[arg(long, short)]
    pub format: Option<output::OutputFormat>,

    /// Safety buffer reserved on top of peak utilization (0.0 - 1.0)
    #[arg(long)]
    pub buffer: Option<f64>,

    /// Enable verbose output
    #[arg(long, short)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Fleet totals, safe headroom and source freshness
    Overview,

    /// List tenants with signals, headroom and status
    Tenants {
        /// Show only this tenant ID ("all" for every tenant)
        #[arg(long, short)]
        tenant: Option<String>,
    },

    /// Show one tenant in detail with an explanation of its status
    Tenant {
        /// Tenant ID
        id: String,
    },

    /// Show SU composition, node inventory and pods
    Inventory,

    /// Show integration heartbeats
    Integrations,

    /// Show HDFS health, client connectivity and mounts
    Storage,

    /// Project additional endpoints against current headroom
    WhatIf {
        /// Number of endpoints to add
        endpoints: u64,
    },
}

fn snapshot_source(cli: &Cli, api_url: String) -> Result<Box<dyn SnapshotSource>> {
    match &cli.snapshot_dir {
        Some(dir) => {
            tracing::debug!(dir = %dir, "Reading snapshots from directory");
            Ok(Box::new(FileSource::new(dir)))
        }
        None => {
            let api = client::ApiClient::new(&api_url)
                .with_context(|| format!("Cannot use API URL {api_url}"))?;
            tracing::debug!(url = %api.base_url(), "Reading snapshots from agent");
            Ok(Box::new(client::HttpSource::new(api)))
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.verbose {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")),
            )
            .with_writer(std::io::stderr)
            .init();
    }

    let config = config::Config::load()?;
    let format = config.output_format(cli.format)?;
    let engine = config.engine_config(cli.buffer);
    if !(0.0..1.0).contains(&engine.buffer_pct) {
        anyhow::bail!("Buffer must be in [0, 1), got {}", engine.buffer_pct);
    }

    let source = snapshot_source(&cli, config.api_url(cli.api_url.clone()))?;

    let now = Utc::now();
    let snapshots = load_snapshots(source.as_ref(), now).await;
    for (name, err) in snapshots.errors() {
        output::print_warning(&format!("{name} snapshot unavailable, using defaults: {err}"));
    }
    let report = CapacityReport::build(&snapshots, &engine, now);

    // Execute command
    match cli.command {
        Commands::Overview => overview::show_overview(&report, format)?,
        Commands::Tenants { tenant } => {
            tenants::list_tenants(&report, tenant.as_deref(), &engine, format)?
        }
        Commands::Tenant { id } => tenants::show_tenant(&report, &id, format)?,
        Commands::Inventory => inventory::show_inventory(&report, format)?,
        Commands::Integrations => integrations::show_integrations(&report, &engine, format)?,
        Commands::Storage => storage::show_storage(&report, format)?,
        Commands::WhatIf { endpoints } => {
            whatif::show_what_if(&report, endpoints, &engine, format)?
        }
    }

    Ok(())
}
