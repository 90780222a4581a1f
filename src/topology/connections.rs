//! Topology construction.
//!
//! This file lays out the grid: a ring of redundant backbone pairs, chains of
//! aggregation pairs between neighbouring backbone pairs, chains of access
//! routers below each aggregation pair, one substation per router group and
//! the external hosts. Link networks are drawn from the pool in construction
//! order, which makes the order of the calls below part of the output format.

use ipnet::Ipv4Net;
use log::{debug, info};
use std::time::Duration;

use crate::config::{Config, ExternalConfig, Uplink, ValidationError};
use crate::ip::{AllocationError, NetworkPool};
use crate::topology::distribution::distribute_routes;
use crate::topology::types::{NodeIdx, Role, Topology};
use crate::topology::GeneratorError;

/// Incrementally builds a [`Topology`] from one network pool
pub struct TopologyBuilder {
    topology: Topology,
    pool: NetworkPool,
}

impl TopologyBuilder {
    pub fn new(pool: Ipv4Net, link_prefix: u8) -> Result<Self, AllocationError> {
        let pool = NetworkPool::new(pool, link_prefix)?;
        let mut topology = Topology::new();
        topology.declare_range(pool.pool());
        Ok(Self { topology, pool })
    }

    fn link(&mut self, a: NodeIdx, b: NodeIdx, delay: Duration) -> Result<(), AllocationError> {
        let network = self.pool.next_network()?;
        self.topology.connect(a, b, network, delay, None)?;
        Ok(())
    }

    /// Add a ring of `length` backbone pairs.
    ///
    /// All pair-internal links are created before the ring links.
    pub fn add_backbone(&mut self, length: usize, delay: Duration) -> Result<Vec<[NodeIdx; 2]>, AllocationError> {
        let base = self.topology.backbone.len();
        let mut pairs = Vec::with_capacity(length);

        for i in 0..length {
            let pair = [
                self.topology.add_node(Role::Backbone { num: base + i, side: 0 }),
                self.topology.add_node(Role::Backbone { num: base + i, side: 1 }),
            ];
            self.link(pair[0], pair[1], Duration::ZERO)?;
            pairs.push(pair);
        }

        for i in 0..length {
            self.link(pairs[i][1], pairs[(i + 1) % length][0], delay)?;
        }

        self.topology.backbone.extend_from_slice(&pairs);
        Ok(pairs)
    }

    /// Add a chain of `length` aggregation pairs from `uplink_a` to `uplink_b`
    pub fn add_aggregation(
        &mut self,
        uplink_a: NodeIdx,
        uplink_b: NodeIdx,
        length: usize,
        delay: Duration,
    ) -> Result<Vec<[NodeIdx; 2]>, AllocationError> {
        let base = self.topology.aggregation.len();
        let mut pairs = Vec::with_capacity(length);

        for i in 0..length {
            let pair = [
                self.topology.add_node(Role::Aggregation { num: base + i, side: 0 }),
                self.topology.add_node(Role::Aggregation { num: base + i, side: 1 }),
            ];
            self.link(pair[0], pair[1], Duration::ZERO)?;
            pairs.push(pair);
        }

        if let (Some(first), Some(last)) = (pairs.first().copied(), pairs.last().copied()) {
            self.link(uplink_a, first[0], delay)?;
            for window in pairs.windows(2) {
                self.link(window[0][1], window[1][0], delay)?;
            }
            self.link(last[1], uplink_b, delay)?;
        }

        self.topology.aggregation.extend_from_slice(&pairs);
        Ok(pairs)
    }

    /// Add a chain of `length` access routers hanging off `uplink`
    pub fn add_access(&mut self, uplink: NodeIdx, length: usize, delay: Duration) -> Result<Vec<NodeIdx>, AllocationError> {
        let base = self.topology.access.len();
        let nodes: Vec<NodeIdx> = (0..length)
            .map(|i| self.topology.add_node(Role::Access { num: base + i }))
            .collect();

        let mut previous = uplink;
        for &node in &nodes {
            self.link(previous, node, delay)?;
            previous = node;
        }

        self.topology.access.extend_from_slice(&nodes);
        Ok(nodes)
    }

    /// Add a substation linked to each of `uplinks`
    pub fn add_uw(&mut self, uplinks: &[NodeIdx]) -> Result<NodeIdx, AllocationError> {
        let node = self.topology.add_node(Role::Uw { num: self.topology.uw.len() });
        for &uplink in uplinks {
            self.link(uplink, node, Duration::ZERO)?;
        }
        self.topology.uw.push(node);
        Ok(node)
    }

    /// Add an external host on its own `network`, attached to `uplink`
    pub fn add_external(&mut self, uplink: NodeIdx, network: Ipv4Net, name: &str) -> Result<NodeIdx, AllocationError> {
        self.topology.declare_range(network);
        let node = self.topology.add_node(Role::External { name: name.to_string() });
        self.topology.connect(uplink, node, network, Duration::ZERO, Some(format!("rettij.{}", name)))?;
        self.topology.external.push(node);
        Ok(node)
    }

    fn resolve_uplink(&self, external: &ExternalConfig) -> Result<NodeIdx, GeneratorError> {
        match &external.uplink {
            Uplink::FirstBackbone => self
                .topology
                .backbone
                .first()
                .map(|pair| pair[0])
                .ok_or_else(|| GeneratorError::UnknownUplink {
                    external: external.name.clone(),
                    node: "backbone0.0".to_string(),
                }),
            Uplink::MiddleAccess => {
                let access = &self.topology.access;
                access
                    .get(access.len() / 2)
                    .copied()
                    .ok_or_else(|| GeneratorError::NoAccessNodes(external.name.clone()))
            }
            Uplink::Node(id) => {
                let node = self
                    .topology
                    .find_node(id)
                    .ok_or_else(|| GeneratorError::UnknownUplink {
                        external: external.name.clone(),
                        node: id.clone(),
                    })?;
                let device = self.topology.node(node).role.device();
                if device != "router" {
                    return Err(GeneratorError::UplinkNotRouter {
                        external: external.name.clone(),
                        node: id.clone(),
                        device,
                    });
                }
                Ok(node)
            }
        }
    }

    pub fn finish(self) -> Topology {
        debug!(
            "Allocated {} of {} link networks from {}",
            self.pool.allocated(),
            self.pool.capacity(),
            self.pool.pool()
        );
        self.topology
    }
}

/// Build the grid topology described by `config` and distribute its routes
pub fn build_topology(config: &Config) -> Result<Topology, GeneratorError> {
    config.validate()?;

    let addressing = &config.addressing;
    let required = config.required_link_networks().ok_or_else(|| {
        ValidationError::InvalidTopology("topology size overflows the link network count".to_string())
    })? as u64;
    let capacity = addressing.capacity();
    if required > capacity {
        return Err(AllocationError::PoolExhausted {
            pool: addressing.pool.trunc(),
            prefix: addressing.link_prefix,
            capacity,
        }
        .into());
    }
    info!(
        "Building topology: {} backbone pairs, {} aggregation pairs per segment, {} access routers per aggregation pair ({} of {} link networks)",
        config.backbone_length, config.aggregation_length, config.access_length, required, capacity
    );

    let mut builder = TopologyBuilder::new(addressing.pool, addressing.link_prefix)?;
    let delays = &config.delays;
    let backbone_length = config.backbone_length;

    let backbone = builder.add_backbone(backbone_length, delays.backbone)?;
    for i in 0..backbone_length {
        builder.add_uw(&backbone[i])?;

        let next = backbone[(i + 1) % backbone_length][0];
        let aggregation = builder.add_aggregation(backbone[i][1], next, config.aggregation_length, delays.aggregation)?;
        for pair in &aggregation {
            builder.add_uw(pair)?;

            let access = builder.add_access(pair[0], config.access_length, delays.access)?;
            for &node in &access {
                builder.add_uw(&[node])?;
            }
        }
    }

    for external in &config.externals {
        let uplink = builder.resolve_uplink(external)?;
        debug!(
            "Attaching external '{}' ({}) to {}",
            external.name,
            external.network,
            builder.topology.node(uplink).role
        );
        builder.add_external(uplink, external.network, &external.name)?;
    }

    let mut topology = builder.finish();
    distribute_routes(&mut topology);

    info!(
        "Built topology with {} nodes, {} channels and {} addresses",
        topology.node_count(),
        topology.channel_count(),
        topology.registry().assigned_count()
    );

    Ok(topology)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_config() -> Config {
        Config {
            backbone_length: 2,
            aggregation_length: 1,
            access_length: 2,
            ..Config::default()
        }
    }

    fn ids(topology: &Topology, nodes: &[NodeIdx]) -> Vec<String> {
        nodes.iter().map(|&n| topology.node(n).role.id()).collect()
    }

    #[test]
    fn test_backbone_ring() {
        let mut builder = TopologyBuilder::new("10.96.0.0/16".parse().unwrap(), 28).unwrap();
        builder.add_backbone(3, Duration::from_micros(25)).unwrap();
        let topology = builder.finish();

        let channels: Vec<_> = topology.channels().map(|(_, c)| (c.id.clone(), c.network.to_string())).collect();
        assert_eq!(
            channels,
            vec![
                ("c_bb0.0_bb0.1".to_string(), "10.96.0.0/28".to_string()),
                ("c_bb1.0_bb1.1".to_string(), "10.96.0.16/28".to_string()),
                ("c_bb2.0_bb2.1".to_string(), "10.96.0.32/28".to_string()),
                ("c_bb0.1_bb1.0".to_string(), "10.96.0.48/28".to_string()),
                ("c_bb1.1_bb2.0".to_string(), "10.96.0.64/28".to_string()),
                ("c_bb2.1_bb0.0".to_string(), "10.96.0.80/28".to_string()),
            ]
        );
        let delays: Vec<_> = topology.channels().map(|(_, c)| c.delay.as_micros()).collect();
        assert_eq!(delays, vec![0, 0, 0, 25, 25, 25]);
    }

    #[test]
    fn test_aggregation_chain() {
        let mut builder = TopologyBuilder::new("10.96.0.0/16".parse().unwrap(), 28).unwrap();
        let backbone = builder.add_backbone(2, Duration::ZERO).unwrap();
        builder
            .add_aggregation(backbone[0][1], backbone[1][0], 2, Duration::from_micros(150))
            .unwrap();
        let topology = builder.finish();

        let chain: Vec<_> = topology.channels().skip(4).map(|(_, c)| c.id.clone()).collect();
        assert_eq!(
            chain,
            vec![
                "c_agg0.0_agg0.1",
                "c_agg1.0_agg1.1",
                "c_bb0.1_agg0.0",
                "c_agg0.1_agg1.0",
                "c_agg1.1_bb1.0",
            ]
        );
    }

    #[test]
    fn test_empty_aggregation_adds_nothing() {
        let mut builder = TopologyBuilder::new("10.96.0.0/16".parse().unwrap(), 28).unwrap();
        let backbone = builder.add_backbone(1, Duration::ZERO).unwrap();
        let pairs = builder.add_aggregation(backbone[0][1], backbone[0][0], 0, Duration::ZERO).unwrap();
        assert!(pairs.is_empty());
        assert_eq!(builder.finish().channel_count(), 2);
    }

    #[test]
    fn test_enumeration_order() {
        let topology = build_topology(&small_config()).unwrap();
        let ordered = ids(&topology, &topology.ordered_nodes());

        assert_eq!(
            &ordered[..8],
            &[
                "backbone0.0", "backbone0.1", "backbone1.0", "backbone1.1",
                "aggregation0.0", "aggregation0.1", "aggregation1.0", "aggregation1.1",
            ]
        );
        assert_eq!(&ordered[8..12], &["access0", "access1", "access2", "access3"]);
        // 2 backbone + 2 aggregation + 4 access substations
        assert_eq!(topology.uw_nodes().len(), 8);
        assert_eq!(&ordered[ordered.len() - 2..], &["pc", "rtu"]);
        assert_eq!(topology.channel_count(), small_config().required_link_networks().unwrap() + 2);
    }

    #[test]
    fn test_externals_use_their_own_networks() {
        let topology = build_topology(&small_config()).unwrap();
        let externals = topology.external_nodes();

        let pc = topology.node(externals[0]);
        let pc_interface = topology.interface(pc.interfaces[0]);
        assert_eq!(pc_interface.name, "rettij.pc");
        assert_eq!(pc_interface.address.to_string(), "10.100.101.2/24");
        let pc_channel = topology.channel(pc_interface.channel);
        assert_eq!(pc_channel.id, "c_bb0.0_pc");

        let rtu = topology.node(externals[1]);
        let rtu_interface = topology.interface(rtu.interfaces[0]);
        assert_eq!(rtu_interface.address.to_string(), "10.100.102.2/24");
        // middle of four access routers
        assert_eq!(topology.channel(rtu_interface.channel).id, "c_acc2_rtu");
    }

    #[test]
    fn test_external_on_named_uplink() {
        let mut config = small_config();
        config.externals[1].uplink = Uplink::Node("aggregation1.1".to_string());
        let topology = build_topology(&config).unwrap();

        let rtu = topology.node(topology.external_nodes()[1]);
        let channel = topology.channel(topology.interface(rtu.interfaces[0]).channel);
        assert_eq!(channel.id, "c_agg1.1_rtu");
    }

    #[test]
    fn test_unknown_uplink() {
        let mut config = small_config();
        config.externals[0].uplink = Uplink::Node("backbone9.0".to_string());
        assert!(matches!(
            build_topology(&config),
            Err(GeneratorError::UnknownUplink { .. })
        ));
    }

    #[test]
    fn test_uplink_must_be_a_router() {
        for uplink in ["uw0", "pc"] {
            let mut config = small_config();
            config.externals[1].uplink = Uplink::Node(uplink.to_string());
            assert!(
                matches!(build_topology(&config), Err(GeneratorError::UplinkNotRouter { .. })),
                "uplink {} should be rejected",
                uplink
            );
        }
    }

    #[test]
    fn test_pool_too_small() {
        let mut config = small_config();
        config.addressing.pool = "10.96.0.0/24".parse().unwrap();
        assert!(matches!(
            build_topology(&config),
            Err(GeneratorError::Allocation(AllocationError::PoolExhausted { capacity: 16, .. }))
        ));
    }

    #[test]
    fn test_builder_reports_exhaustion() {
        let mut builder = TopologyBuilder::new("10.96.0.0/26".parse().unwrap(), 28).unwrap();
        let backbone = builder.add_backbone(2, Duration::ZERO).unwrap();
        let err = builder.add_uw(&backbone[0]).unwrap_err();
        assert!(matches!(err, AllocationError::PoolExhausted { capacity: 4, .. }));
    }
}
