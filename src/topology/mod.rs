//! Network topology module.
//!
//! This module contains the in-memory topology model, the grid construction
//! algorithm and static route distribution.

pub mod types;
pub mod connections;
pub mod distribution;

// Re-export key types and functions for easier access
pub use types::{Channel, ChannelIdx, Interface, InterfaceIdx, Node, NodeIdx, Role, Topology};
pub use connections::{build_topology, TopologyBuilder};
pub use distribution::{distribute_routes, node_routes, Route};

use crate::config::ValidationError;
use crate::ip::AllocationError;

/// Errors that abort topology generation
#[derive(Debug, thiserror::Error)]
pub enum GeneratorError {
    #[error(transparent)]
    Config(#[from] ValidationError),

    #[error(transparent)]
    Allocation(#[from] AllocationError),

    #[error("uplink '{node}' of external '{external}' does not exist")]
    UnknownUplink { external: String, node: String },

    #[error("uplink '{node}' of external '{external}' is a {device}, not a router")]
    UplinkNotRouter { external: String, node: String, device: &'static str },

    #[error("external '{0}' needs an access router but the topology has none")]
    NoAccessNodes(String),

    #[error("topology is inconsistent: {0}")]
    Inconsistent(String),
}
