//! Topology document serializer.

use std::time::Duration;

use crate::output::types::{
    ChannelEntry, InterfaceEntry, NodeEntry, RouteEntry, TopologyDocument, DOCUMENT_VERSION,
};
use crate::topology::{node_routes, NodeIdx, Topology};

/// Build the document view of `topology`
pub fn topology_document(topology: &Topology) -> TopologyDocument {
    let nodes = topology
        .ordered_nodes()
        .into_iter()
        .map(|node| node_entry(topology, node))
        .collect();

    let channels = topology
        .channels()
        .map(|(_, channel)| ChannelEntry {
            id: channel.id.clone(),
            delay: format_delay(channel.delay),
        })
        .collect();

    TopologyDocument {
        version: DOCUMENT_VERSION.to_string(),
        nodes,
        channels,
    }
}

fn node_entry(topology: &Topology, idx: NodeIdx) -> NodeEntry {
    let node = topology.node(idx);

    let interfaces = node
        .interfaces
        .iter()
        .map(|&i| {
            let interface = topology.interface(i);
            InterfaceEntry {
                id: interface.name.clone(),
                channel: topology.channel(interface.channel).id.clone(),
                ip: interface.address.to_string(),
            }
        })
        .collect();

    let routes = node.role.has_routes().then(|| {
        node_routes(topology, idx)
            .into_iter()
            .map(|route| RouteEntry {
                network: route.network.to_string(),
                gateway: route.gateway.to_string(),
                metric: route.metric,
            })
            .collect()
    });

    NodeEntry {
        id: node.role.id(),
        device: node.role.device().to_string(),
        component: node.role.component().to_string(),
        interfaces,
        routes,
    }
}

/// Delays are written in whole microseconds; zero means no delay entry
fn format_delay(delay: Duration) -> Option<String> {
    if delay.is_zero() {
        None
    } else {
        Some(format!("{}us", delay.as_micros()))
    }
}

/// Serialize the document as YAML
pub fn render_document(document: &TopologyDocument) -> Result<String, serde_yaml::Error> {
    serde_yaml::to_string(document)
}
