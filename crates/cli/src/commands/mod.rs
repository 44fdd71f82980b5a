//! Subcommand implementations
//!
//! Every command renders a view of one [`capacity_lib::CapacityReport`].

pub mod integrations;
pub mod inventory;
pub mod overview;
pub mod storage;
pub mod tenants;
pub mod whatif;
