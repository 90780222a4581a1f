//! Shared utilities: topology and artifact consistency checks.

pub mod validation;

pub use validation::{validate_ip_map_consistency, validate_topology};
