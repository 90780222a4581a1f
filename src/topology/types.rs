//! Topology type definitions.
//!
//! The model is an arena: nodes, channels and interfaces live in vectors and
//! refer to each other by index. Indices are only ever handed out by
//! [`Topology`], so every reference resolves.

use ipnet::Ipv4Net;
use std::fmt;
use std::net::Ipv4Addr;
use std::time::Duration;

use crate::ip::{host_address, AddressRegistry, AllocationError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeIdx(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChannelIdx(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InterfaceIdx(pub usize);

/// Role of a node in the grid.
///
/// `num` is a running counter per role; `side` distinguishes the two routers
/// of a redundant pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Role {
    Backbone { num: usize, side: usize },
    Aggregation { num: usize, side: usize },
    Access { num: usize },
    /// Substation attached to one or two routers
    Uw { num: usize },
    /// Host outside the emulation, bridged in by the operator
    External { name: String },
}

impl Role {
    /// Identifier used in the topology document
    pub fn id(&self) -> String {
        match self {
            Role::Backbone { num, side } => format!("backbone{}.{}", num, side),
            Role::Aggregation { num, side } => format!("aggregation{}.{}", num, side),
            Role::Access { num } => format!("access{}", num),
            Role::Uw { num } => format!("uw{}", num),
            Role::External { name } => name.clone(),
        }
    }

    /// Abbreviated identifier used to build channel ids
    pub fn short(&self) -> String {
        match self {
            Role::Backbone { num, side } => format!("bb{}.{}", num, side),
            Role::Aggregation { num, side } => format!("agg{}.{}", num, side),
            Role::Access { num } => format!("acc{}", num),
            Role::Uw { num } => format!("uw{}", num),
            Role::External { name } => name.clone(),
        }
    }

    pub fn device(&self) -> &'static str {
        match self {
            Role::Backbone { .. } | Role::Aggregation { .. } | Role::Access { .. } => "router",
            Role::Uw { .. } => "container",
            Role::External { .. } => "host",
        }
    }

    pub fn component(&self) -> &'static str {
        match self {
            Role::Backbone { .. } | Role::Aggregation { .. } | Role::Access { .. } => "simple-router",
            Role::Uw { .. } => "simple-uw",
            Role::External { .. } => "host",
        }
    }

    /// External hosts are configured by the operator, not by the orchestrator
    pub fn has_routes(&self) -> bool {
        !matches!(self, Role::External { .. })
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id())
    }
}

#[derive(Debug, Clone)]
pub struct Node {
    pub role: Role,
    /// Interfaces in attach order
    pub interfaces: Vec<InterfaceIdx>,
}

/// Point-to-point link with its own subnet
#[derive(Debug, Clone)]
pub struct Channel {
    pub id: String,
    pub network: Ipv4Net,
    pub delay: Duration,
    /// Interfaces in attach order; the position determines the host number
    pub interfaces: Vec<InterfaceIdx>,
    /// Destinations reachable through this channel
    pub adverts: Vec<Advert>,
}

/// A destination channel reachable from a channel via one of its interfaces
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Advert {
    pub destination: ChannelIdx,
    /// Interface on the advertising channel that forwards towards `destination`
    pub via: InterfaceIdx,
    /// Number of channel hops
    pub distance: u32,
}

#[derive(Debug, Clone)]
pub struct Interface {
    pub name: String,
    pub node: NodeIdx,
    pub channel: ChannelIdx,
    /// Host address with the channel's prefix length
    pub address: Ipv4Net,
}

impl Interface {
    pub fn ip(&self) -> Ipv4Addr {
        self.address.addr()
    }
}

/// The complete in-memory topology
#[derive(Debug, Default)]
pub struct Topology {
    nodes: Vec<Node>,
    channels: Vec<Channel>,
    interfaces: Vec<Interface>,
    pub(crate) backbone: Vec<[NodeIdx; 2]>,
    pub(crate) aggregation: Vec<[NodeIdx; 2]>,
    pub(crate) access: Vec<NodeIdx>,
    pub(crate) uw: Vec<NodeIdx>,
    pub(crate) external: Vec<NodeIdx>,
    registry: AddressRegistry,
}

impl Topology {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare an address range the topology may draw link networks from
    pub fn declare_range(&mut self, range: Ipv4Net) {
        self.registry.declare_range(range);
    }

    pub(crate) fn add_node(&mut self, role: Role) -> NodeIdx {
        let idx = NodeIdx(self.nodes.len());
        self.nodes.push(Node {
            role,
            interfaces: Vec::new(),
        });
        idx
    }

    /// Link two nodes through a new channel on `network`.
    ///
    /// `a` is attached first and gets host number 1, `b` host number 2.
    /// `name_b` overrides the interface name on `b`.
    pub(crate) fn connect(
        &mut self,
        a: NodeIdx,
        b: NodeIdx,
        network: Ipv4Net,
        delay: Duration,
        name_b: Option<String>,
    ) -> Result<ChannelIdx, AllocationError> {
        let id = format!("c_{}_{}", self.nodes[a.0].role.short(), self.nodes[b.0].role.short());
        let channel = ChannelIdx(self.channels.len());
        self.channels.push(Channel {
            id,
            network: network.trunc(),
            delay,
            interfaces: Vec::new(),
            adverts: Vec::new(),
        });

        self.attach(a, channel, None)?;
        self.attach(b, channel, name_b)?;
        Ok(channel)
    }

    fn attach(
        &mut self,
        node: NodeIdx,
        channel: ChannelIdx,
        name: Option<String>,
    ) -> Result<InterfaceIdx, AllocationError> {
        let offset = self.channels[channel.0].interfaces.len();
        let address = host_address(self.channels[channel.0].network, offset)?;
        let name = name.unwrap_or_else(|| format!("i{}", self.nodes[node.0].interfaces.len()));

        let owner = format!("{}/{}", self.nodes[node.0].role.id(), name);
        self.registry.register(address.addr(), &owner)?;

        let idx = InterfaceIdx(self.interfaces.len());
        self.interfaces.push(Interface {
            name,
            node,
            channel,
            address,
        });
        self.nodes[node.0].interfaces.push(idx);
        self.channels[channel.0].interfaces.push(idx);
        Ok(idx)
    }

    pub fn node(&self, idx: NodeIdx) -> &Node {
        &self.nodes[idx.0]
    }

    pub fn channel(&self, idx: ChannelIdx) -> &Channel {
        &self.channels[idx.0]
    }

    pub(crate) fn channel_mut(&mut self, idx: ChannelIdx) -> &mut Channel {
        &mut self.channels[idx.0]
    }

    pub fn interface(&self, idx: InterfaceIdx) -> &Interface {
        &self.interfaces[idx.0]
    }

    /// All nodes in enumeration order: backbone pairs, aggregation pairs,
    /// access routers, substations, external hosts
    pub fn ordered_nodes(&self) -> Vec<NodeIdx> {
        let mut nodes = Vec::with_capacity(self.nodes.len());
        for pair in self.backbone.iter().chain(self.aggregation.iter()) {
            nodes.extend_from_slice(pair);
        }
        nodes.extend_from_slice(&self.access);
        nodes.extend_from_slice(&self.uw);
        nodes.extend_from_slice(&self.external);
        nodes
    }

    /// Channels in creation order
    pub fn channels(&self) -> impl Iterator<Item = (ChannelIdx, &Channel)> {
        self.channels.iter().enumerate().map(|(i, c)| (ChannelIdx(i), c))
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn uw_nodes(&self) -> &[NodeIdx] {
        &self.uw
    }

    pub fn external_nodes(&self) -> &[NodeIdx] {
        &self.external
    }

    /// Find a node by its document identifier
    pub fn find_node(&self, id: &str) -> Option<NodeIdx> {
        self.nodes
            .iter()
            .position(|node| node.role.id() == id)
            .map(NodeIdx)
    }

    /// Addresses of a node's interfaces in attach order
    pub fn node_addresses(&self, idx: NodeIdx) -> Vec<Ipv4Addr> {
        self.node(idx)
            .interfaces
            .iter()
            .map(|&i| self.interface(i).ip())
            .collect()
    }

    pub fn registry(&self) -> &AddressRegistry {
        &self.registry
    }
}
