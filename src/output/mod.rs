//! # Output Artifacts Module
//!
//! This module turns the in-memory topology into the two files handed to
//! the rest of the experiment: the topology document rettij provisions the
//! emulated network from, and the IP map operators use to find the
//! addresses they bridge into.
//!
//! ## Single Source of Truth
//!
//! Both artifacts are rendered from the same [`Topology`](crate::topology::Topology)
//! value. Neither serializer assigns anything; they only read the model, so
//! the two files cannot disagree about an address.
//!
//! ## Topology Document
//!
//! ```yaml
//! version: '1.0'
//! nodes:
//! - id: backbone0.0
//!   device: router
//!   component: simple-router
//!   interfaces:
//!   - id: i0
//!     channel: c_bb0.0_bb0.1
//!     ip: 10.96.0.1/28
//!   routes:
//!   - network: 10.96.0.16/28
//!     gateway: 10.96.0.2
//!     metric: 2
//! channels:
//! - id: c_bb0.0_bb0.1
//! - id: c_bb0.1_bb1.0
//!   delay: 25us
//! ```
//!
//! ## IP Map
//!
//! Text (one line per node, first interface address):
//!
//! ```text
//! pc -> 10.100.101.2
//! rtu -> 10.100.102.2
//! ```
//!
//! JSON (every interface address):
//!
//! ```json
//! [{"id":"uw0","interfaces":["10.96.2.130","10.96.2.146"]}]
//! ```

pub mod types;
pub mod document;
pub mod ip_map;

// Re-export commonly used types for convenience
pub use types::{
    TopologyDocument,
    NodeEntry,
    InterfaceEntry,
    RouteEntry,
    ChannelEntry,
    DOCUMENT_VERSION,
};
pub use document::{topology_document, render_document};
pub use ip_map::{IpMap, IpMapEntry, IpMapFormat, IpMapScope};
