//! Output formatting utilities

use std::str::FromStr;

use anyhow::Result;
use capacity_lib::HealthStatus;
use chrono::{DateTime, Utc};
use clap::ValueEnum;
use colored::Colorize;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

/// Node roles in display order
pub const ROLES: [&str; 5] = ["nginx", "pnode", "dnode", "spark", "ruleengine"];

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    /// Table format (default)
    #[default]
    Table,
    /// JSON format
    Json,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        <Self as ValueEnum>::from_str(s, true)
    }
}

/// Print a table from a list of rows
pub fn print_table<T: Tabled>(items: &[T]) {
    if items.is_empty() {
        println!("{}", "No items found".yellow());
        return;
    }
    let table = Table::new(items).with(Style::rounded()).to_string();
    println!("{}", table);
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Print a section heading
pub fn print_header(title: &str) {
    println!("{}", title.bold());
    println!("{}", "=".repeat(50));
}

pub fn print_subheader(title: &str) {
    println!("{}", title.bold());
    println!("{}", "-".repeat(50));
}

/// Print an aligned `label: value` line
pub fn print_field(label: &str, value: impl std::fmt::Display) {
    println!("{:<24}{}", format!("{label}:"), value);
}

/// Print a success message
pub fn print_success(message: &str) {
    println!("{} {}", "✓".green().bold(), message);
}

/// Print a warning message to stderr so JSON output stays parseable
pub fn print_warning(message: &str) {
    eprintln!("{} {}", "⚠".yellow().bold(), message);
}

/// Print an info message
pub fn print_info(message: &str) {
    println!("{} {}", "ℹ".blue().bold(), message);
}

/// Colored Healthy / Watch / Action badge
pub fn status_badge(status: HealthStatus) -> String {
    let label = status.label();
    match status {
        HealthStatus::Green => label.green().to_string(),
        HealthStatus::Yellow => label.yellow().to_string(),
        HealthStatus::Red => label.red().bold().to_string(),
    }
}

/// Abbreviate a count: 950, 1.2k, 3.4M, 1.1B
pub fn abbr(n: u64) -> String {
    const UNITS: [(f64, &str); 3] = [(1e9, "B"), (1e6, "M"), (1e3, "k")];

    let value = n as f64;
    for (scale, suffix) in UNITS {
        if value >= scale {
            let scaled = format!("{:.1}", value / scale);
            let scaled = scaled.strip_suffix(".0").unwrap_or(&scaled);
            return format!("{scaled}{suffix}");
        }
    }
    n.to_string()
}

/// Format a count with thousands separators
pub fn format_number(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Format a non-negative quantity, dropping the fraction
pub fn format_whole(value: f64) -> String {
    if value.is_finite() && value > 0.0 {
        format_number(value.floor() as u64)
    } else {
        "0".to_string()
    }
}

/// Format a 0..1 fraction as a whole percentage
pub fn format_pct(fraction: f64) -> String {
    let fraction = if fraction.is_finite() { fraction } else { 0.0 };
    format!("{:.0}%", (fraction * 100.0).round())
}

/// Format minutes since an event
pub fn format_minutes_ago(minutes: Option<f64>) -> String {
    match minutes {
        Some(m) => format!("{:.1} min ago", m),
        None => "no data".to_string(),
    }
}

pub fn format_timestamp(ts: Option<DateTime<Utc>>) -> String {
    ts.map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| "—".to_string())
}

/// Operator-facing name of a node role
pub fn role_label(role: &str) -> &str {
    match role {
        "nginx" => "Nginx",
        "pnode" => "Processing",
        "dnode" => "Data",
        "spark" => "Spark",
        "ruleengine" => "Rule Engine",
        other => other,
    }
}

/// Known roles first, then any others present in `keys`
pub fn ordered_roles<'a>(keys: impl IntoIterator<Item = &'a String>) -> Vec<String> {
    let mut roles: Vec<String> = ROLES.iter().map(|r| r.to_string()).collect();
    for key in keys {
        if !roles.contains(key) {
            roles.push(key.clone());
        }
    }
    roles
}
