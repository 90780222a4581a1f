//! IP address allocation and management module.
//!
//! This module carves point-to-point link networks out of the configured
//! pool, derives interface addresses from them and keeps a registry of every
//! address handed out so collisions surface as errors instead of silently
//! reused addresses.

pub mod registry;
pub mod allocator;

// Re-export commonly used types
pub use registry::AddressRegistry;
pub use allocator::{host_address, NetworkPool};

use ipnet::Ipv4Net;
use std::net::Ipv4Addr;

/// Errors raised while allocating networks and addresses
#[derive(Debug, thiserror::Error)]
pub enum AllocationError {
    #[error("address space exhausted: pool {pool} holds only {capacity} /{prefix} link networks")]
    PoolExhausted { pool: Ipv4Net, prefix: u8, capacity: u64 },

    #[error("cannot split {pool} into /{prefix} networks")]
    InvalidPrefix { pool: Ipv4Net, prefix: u8 },

    #[error("network {network} has no usable host number {host}")]
    HostOutOfRange { network: Ipv4Net, host: u32 },

    #[error("address {address} requested by {requested} is already assigned to {existing}")]
    AddressConflict { address: Ipv4Addr, existing: String, requested: String },
}
