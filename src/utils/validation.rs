//! Topology consistency checks.
//!
//! These run on the finished model before anything is written, and on the
//! rendered artifacts to make sure both describe the same assignment.

use std::collections::{HashMap, HashSet};

use crate::output::{IpMap, TopologyDocument};
use crate::topology::Topology;

/// Validate the invariants of a built topology
///
/// Checks for:
/// - Unique node identifiers
/// - Unique channel identifiers
/// - Every node attached to at least one channel
/// - Exactly two endpoints per channel, on distinct existing nodes
/// - Unique interface addresses, each inside its channel's network
/// - Channel networks inside a declared range (link pool or external network)
///
/// # Arguments
/// * `topology` - The topology to validate
///
/// # Returns
/// * `Ok(())` if validation succeeds
/// * `Err(String)` with an error message if validation fails
///
/// # Examples
/// ```
/// use gridtopo::config::Config;
/// use gridtopo::topology::build_topology;
/// use gridtopo::utils::validation::validate_topology;
///
/// let topology = build_topology(&Config::default()).unwrap();
/// assert!(validate_topology(&topology).is_ok());
/// ```
pub fn validate_topology(topology: &Topology) -> Result<(), String> {
    let mut ids = HashSet::new();
    for idx in topology.ordered_nodes() {
        let node = topology.node(idx);
        let id = node.role.id();
        if node.interfaces.is_empty() {
            return Err(format!("Node {} is not attached to any channel", id));
        }
        if !ids.insert(id.clone()) {
            return Err(format!("Duplicate node identifier '{}'", id));
        }
    }
    if ids.len() != topology.node_count() {
        return Err(format!(
            "{} nodes exist but only {} are enumerated",
            topology.node_count(),
            ids.len()
        ));
    }

    let mut addresses = HashMap::new();
    let mut channel_ids = HashSet::new();
    for (_, channel) in topology.channels() {
        if !channel_ids.insert(channel.id.as_str()) {
            return Err(format!("Duplicate channel identifier '{}'", channel.id));
        }
        if channel.interfaces.len() != 2 {
            return Err(format!(
                "Channel {} has {} endpoints instead of 2",
                channel.id,
                channel.interfaces.len()
            ));
        }
        let endpoints: Vec<_> = channel
            .interfaces
            .iter()
            .map(|&i| topology.interface(i).node)
            .collect();
        if endpoints[0] == endpoints[1] {
            return Err(format!("Channel {} connects a node to itself", channel.id));
        }
        if !topology.registry().is_declared(&channel.network) {
            return Err(format!(
                "Network {} of channel {} lies outside every declared range {:?}",
                channel.network,
                channel.id,
                topology.registry().declared_ranges()
            ));
        }

        for &i in &channel.interfaces {
            let interface = topology.interface(i);
            let owner = format!("{}/{}", topology.node(interface.node).role.id(), interface.name);
            let ip = interface.ip();

            if !channel.network.contains(&ip) || ip == channel.network.network() || ip == channel.network.broadcast() {
                return Err(format!(
                    "Address {} of {} is not a host address of {}",
                    ip, owner, channel.network
                ));
            }
            if let Some(existing) = addresses.insert(ip, owner.clone()) {
                return Err(format!(
                    "Duplicate address {} (assigned to {} and {})",
                    ip, existing, owner
                ));
            }
        }
    }

    log::debug!(
        "Topology validated: {} nodes, {} channels, {} addresses",
        ids.len(),
        topology.channel_count(),
        addresses.len()
    );

    Ok(())
}

/// Validate that an IP map lists every document node exactly once, with the
/// node's first interface address
pub fn validate_ip_map_consistency(document: &TopologyDocument, ip_map: &IpMap) -> Result<(), String> {
    let mut listed: HashMap<&str, usize> = HashMap::new();
    for entry in ip_map.entries() {
        *listed.entry(entry.id.as_str()).or_default() += 1;
    }

    for node in &document.nodes {
        match listed.get(node.id.as_str()) {
            None => return Err(format!("Node {} is missing from the IP map", node.id)),
            Some(count) if *count > 1 => {
                return Err(format!("Node {} appears {} times in the IP map", node.id, count))
            }
            Some(_) => {}
        }
    }
    if listed.len() != document.nodes.len() {
        return Err(format!(
            "IP map lists {} nodes, topology document has {}",
            listed.len(),
            document.nodes.len()
        ));
    }

    for (node, entry) in document.nodes.iter().zip(ip_map.entries()) {
        let document_ip = node
            .interfaces
            .first()
            .and_then(|i| i.ip.split('/').next())
            .unwrap_or_default();
        let map_ip = entry.primary().map(|ip| ip.to_string()).unwrap_or_default();
        if node.id != entry.id || document_ip != map_ip {
            return Err(format!(
                "IP map entry {} ({}) does not match document node {} ({})",
                entry.id, map_ip, node.id, document_ip
            ));
        }
    }

    Ok(())
}
