//! IP map serializer.
//!
//! The IP map is the operator's view of the topology: which address a node
//! answers on. It is derived from the same model as the topology document.

use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::net::Ipv4Addr;

use crate::topology::{NodeIdx, Topology};

/// Output format of the IP map
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IpMapFormat {
    /// One `id -> address` line per node, using the first interface
    #[default]
    Text,
    /// JSON array of `{"id", "interfaces"}` objects listing every address
    Json,
}

/// Which nodes the IP map lists
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IpMapScope {
    /// Every node in enumeration order
    #[default]
    All,
    /// Substations only
    Uw,
    /// External hosts only
    External,
}

/// Addresses of one node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IpMapEntry {
    pub id: String,
    /// Addresses in interface order
    pub interfaces: Vec<Ipv4Addr>,
}

impl IpMapEntry {
    pub fn primary(&self) -> Option<Ipv4Addr> {
        self.interfaces.first().copied()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IpMap {
    entries: Vec<IpMapEntry>,
}

impl IpMap {
    pub fn from_topology(topology: &Topology, scope: IpMapScope) -> Self {
        let nodes: Vec<NodeIdx> = match scope {
            IpMapScope::All => topology.ordered_nodes(),
            IpMapScope::Uw => topology.uw_nodes().to_vec(),
            IpMapScope::External => topology.external_nodes().to_vec(),
        };

        let entries = nodes
            .into_iter()
            .map(|node| IpMapEntry {
                id: topology.node(node).role.id(),
                interfaces: topology.node_addresses(node),
            })
            .collect();

        IpMap { entries }
    }

    pub fn entries(&self) -> &[IpMapEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn render(&self, format: IpMapFormat) -> Result<String, serde_json::Error> {
        match format {
            IpMapFormat::Text => Ok(self.render_text()),
            IpMapFormat::Json => serde_json::to_string(&self.entries),
        }
    }

    fn render_text(&self) -> String {
        let mut output = String::new();
        for entry in &self.entries {
            if let Some(address) = entry.primary() {
                let _ = writeln!(output, "{} -> {}", entry.id, address);
            }
        }
        output
    }
}

/// Parse the text format back into `(id, address)` pairs
pub fn parse_text(content: &str) -> Result<Vec<(String, Ipv4Addr)>, String> {
    content
        .lines()
        .filter(|line| !line.trim().is_empty())
        .enumerate()
        .map(|(number, line)| {
            let (id, address) = line
                .split_once(" -> ")
                .ok_or_else(|| format!("line {}: expected 'id -> address', got '{}'", number + 1, line))?;
            let address = address
                .trim()
                .parse::<Ipv4Addr>()
                .map_err(|e| format!("line {}: invalid address '{}': {}", number + 1, address, e))?;
            Ok((id.trim().to_string(), address))
        })
        .collect()
}
