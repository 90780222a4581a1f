//! Topology document type definitions.
//!
//! These structures mirror the YAML document rettij reads as its
//! provisioning input.

use serde::{Deserialize, Serialize};

/// Format version written to every document
pub const DOCUMENT_VERSION: &str = "1.0";

// ============================================================================
// Document Types
// ============================================================================

/// Root of the topology document.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct TopologyDocument {
    /// Document format version
    pub version: String,
    /// Nodes in enumeration order
    pub nodes: Vec<NodeEntry>,
    /// Channels in creation order
    pub channels: Vec<ChannelEntry>,
}

/// A node and its interfaces.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct NodeEntry {
    /// Unique node identifier (e.g. "backbone0.1", "uw12", "pc")
    pub id: String,
    /// Device kind ("router", "container", "host")
    pub device: String,
    /// Component implementing the device
    pub component: String,
    pub interfaces: Vec<InterfaceEntry>,
    /// Static routes; absent for external hosts
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub routes: Option<Vec<RouteEntry>>,
}

/// Attachment of a node to a channel.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct InterfaceEntry {
    pub id: String,
    /// Id of the channel the interface is attached to
    pub channel: String,
    /// Address with prefix length (e.g. "10.96.0.1/28")
    pub ip: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct RouteEntry {
    pub network: String,
    pub gateway: String,
    pub metric: u32,
}

/// A point-to-point channel.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ChannelEntry {
    pub id: String,
    /// One-way delay (e.g. "25us"); absent when the link adds no delay
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delay: Option<String>,
}
