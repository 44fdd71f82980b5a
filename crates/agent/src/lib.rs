//! Capacity agent
//!
//! Loads the tenants, integrations and storage snapshots from disk on an
//! interval and serves them raw and evaluated over HTTP.

pub mod api;
pub mod config;
pub mod refresh;
