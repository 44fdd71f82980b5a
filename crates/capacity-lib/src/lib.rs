//! Capacity and health evaluation engine
//!
//! This crate provides:
//! - Resource ratios and scaling-unit arithmetic
//! - Headroom calculation with a safety buffer
//! - Fleet aggregation with capacity-weighted utilization
//! - Red/yellow/green health evaluation for tenants, integrations and storage
//! - What-if projection of endpoint growth into node additions
//! - Snapshot sources, report assembly and observability for the outer surfaces
//!
//! The calculators are pure: identical inputs give identical outputs, and
//! anything time-dependent takes the current time as a parameter.

pub mod aggregate;
pub mod config;
pub mod headroom;
pub mod health;
pub mod models;
pub mod observability;
pub mod report;
pub mod source;
pub mod units;
pub mod whatif;

pub use aggregate::{overall_headroom_from_tenants, totals_from_tenants, FleetHeadroom, FleetTotals};
pub use config::EngineConfig;
pub use headroom::{calc_headroom, CapacityInput, HeadroomResult, DEFAULT_BUFFER_PCT};
pub use health::{
    heartbeat_status, lag_minutes, status_from_signals, storage_overall_status, HealthStatus,
    Signals,
};
pub use models::*;
pub use observability::{CapacityMetrics, StructuredLogger};
pub use report::CapacityReport;
pub use source::{load_snapshots, FileSource, SnapshotSet, SnapshotSource, SourceError, SourceState};
pub use units::{resources_for_endpoints, su_needed_for_endpoints, ResourceModel, ResourceRequirement};
pub use whatif::{node_plan_for_sus, project, WhatIfProjection};
