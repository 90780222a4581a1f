//! Static route distribution.
//!
//! Every channel advertises itself by a breadth-first walk over the channel
//! graph: from a channel, a hop reaches every other channel of every node
//! attached to it. Each node then picks, per destination, the closest
//! advertisement heard on any of its interfaces and aggregates sibling
//! networks that share a gateway.

use ipnet::Ipv4Net;
use std::collections::{BTreeMap, VecDeque};
use std::net::Ipv4Addr;

use crate::topology::types::{Advert, ChannelIdx, InterfaceIdx, NodeIdx, Topology};

/// A node's choice of next hop towards one destination
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteChoice {
    /// The node's own interface the advertisement was heard on
    pub interface: InterfaceIdx,
    /// The neighbour interface traffic is sent to
    pub gateway: InterfaceIdx,
    pub metric: u32,
}

/// Route entry as written to the topology document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    pub network: Ipv4Net,
    pub gateway: Ipv4Addr,
    pub metric: u32,
}

/// Flood one advertisement per channel through the topology
pub fn distribute_routes(topology: &mut Topology) {
    let count = topology.channel_count();
    let mut pending: Vec<(ChannelIdx, Advert)> = Vec::new();

    for source in 0..count {
        let source = ChannelIdx(source);
        let mut known = vec![false; count];
        let mut queue = VecDeque::new();

        known[source.0] = true;
        queue.push_back((source, 0u32));

        while let Some((current, distance)) = queue.pop_front() {
            for &in_interface in &topology.channel(current).interfaces {
                let node = topology.interface(in_interface).node;
                for &out_interface in &topology.node(node).interfaces {
                    let next = topology.interface(out_interface).channel;
                    if known[next.0] {
                        continue;
                    }
                    known[next.0] = true;
                    queue.push_back((next, distance + 1));
                    pending.push((
                        next,
                        Advert {
                            destination: source,
                            via: out_interface,
                            distance: distance + 1,
                        },
                    ));
                }
            }
        }
    }

    log::debug!("Distributed {} route advertisements over {} channels", pending.len(), count);

    for (channel, advert) in pending {
        topology.channel_mut(channel).adverts.push(advert);
    }
}

/// Closest advertisement per destination heard on any of the node's interfaces.
///
/// Ties keep the advertisement seen first, in interface order. The result is
/// sorted by destination network.
pub fn best_routes(topology: &Topology, node: NodeIdx) -> Vec<(Ipv4Net, RouteChoice)> {
    let mut best: BTreeMap<ChannelIdx, RouteChoice> = BTreeMap::new();

    for &interface in &topology.node(node).interfaces {
        let channel = topology.interface(interface).channel;
        for advert in &topology.channel(channel).adverts {
            let better = best
                .get(&advert.destination)
                .map_or(true, |current| current.metric > advert.distance);
            if better {
                best.insert(
                    advert.destination,
                    RouteChoice {
                        interface,
                        gateway: advert.via,
                        metric: advert.distance,
                    },
                );
            }
        }
    }

    let mut routes: Vec<(Ipv4Net, RouteChoice)> = best
        .into_iter()
        .map(|(channel, choice)| (topology.channel(channel).network, choice))
        .collect();
    routes.sort_by_key(|(network, _)| *network);
    routes
}

/// Replace runs of sibling networks sharing a gateway by their supernet
pub fn aggregate_routes(routes: Vec<(Ipv4Net, RouteChoice)>) -> Vec<(Ipv4Net, RouteChoice)> {
    let mut result: Vec<(Ipv4Net, RouteChoice)> = Vec::with_capacity(routes.len());

    for entry in routes {
        result.push(entry);
        while result.len() > 1 {
            let (last_net, last) = result[result.len() - 1];
            let (prev_net, prev) = result[result.len() - 2];
            match (last_net.supernet(), prev_net.supernet()) {
                (Some(a), Some(b)) if a == b && last.gateway == prev.gateway => {
                    result.truncate(result.len() - 2);
                    result.push((a, last));
                }
                _ => break,
            }
        }
    }

    result
}

/// Routes of a node as written to the topology document.
///
/// Destinations the node reaches itself (gateway is its own interface) are
/// left out; external hosts carry no routes.
pub fn node_routes(topology: &Topology, node: NodeIdx) -> Vec<Route> {
    if !topology.node(node).role.has_routes() {
        return Vec::new();
    }

    aggregate_routes(best_routes(topology, node))
        .into_iter()
        .filter(|(_, choice)| choice.interface != choice.gateway)
        .map(|(network, choice)| Route {
            network,
            gateway: topology.interface(choice.gateway).ip(),
            metric: choice.metric,
        })
        .collect()
}
