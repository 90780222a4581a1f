#[cfg(test)]
mod generator_tests {
    use std::collections::HashSet;
    use std::fs;
    use std::io::Write;
    use std::net::Ipv4Addr;
    use tempfile::{NamedTempFile, TempDir};

    use ipnet::Ipv4Net;

    use gridtopo::config::{Config, Uplink};
    use gridtopo::config_loader::load_config;
    use gridtopo::ip::AllocationError;
    use gridtopo::orchestrator::{generate, IpMapOptions};
    use gridtopo::output::ip_map::parse_text;
    use gridtopo::output::{IpMapEntry, IpMapFormat, IpMapScope, TopologyDocument};
    use gridtopo::topology::GeneratorError;

    fn run(config: &Config, options: IpMapOptions) -> (TempDir, String, String) {
        let dir = TempDir::new().unwrap();
        let topology_path = dir.path().join("topology.yml");
        let ip_map_path = dir.path().join("ips");

        generate(config, &topology_path, &ip_map_path, options).unwrap();

        let topology = fs::read_to_string(&topology_path).unwrap();
        let ip_map = fs::read_to_string(&ip_map_path).unwrap();
        (dir, topology, ip_map)
    }

    fn parameter_sets() -> Vec<Config> {
        let mut sets = Vec::new();
        for (backbone, aggregation, access) in [(1, 1, 1), (2, 0, 0), (3, 1, 4), (5, 2, 2), (6, 3, 3)] {
            let mut config = Config {
                backbone_length: backbone,
                aggregation_length: aggregation,
                access_length: access,
                ..Config::default()
            };
            if config.access_count() == Some(0) {
                config.externals.retain(|e| e.uplink != Uplink::MiddleAccess);
            }
            sets.push(config);
        }
        sets
    }

    /// Every document node appears exactly once in the IP map
    #[test]
    fn test_every_node_listed_once() {
        for config in parameter_sets() {
            let (_dir, topology, ip_map) = run(&config, IpMapOptions::default());
            let document: TopologyDocument = serde_yaml::from_str(&topology).unwrap();
            let lines = parse_text(&ip_map).unwrap();

            assert_eq!(lines.len(), document.nodes.len());
            let listed: HashSet<&str> = lines.iter().map(|(id, _)| id.as_str()).collect();
            assert_eq!(listed.len(), lines.len(), "duplicate ids in IP map");
            for node in &document.nodes {
                assert!(listed.contains(node.id.as_str()), "{} missing from IP map", node.id);
            }
        }
    }

    /// All addresses are unique and inside the declared ranges
    #[test]
    fn test_addresses_unique_and_in_range() {
        for config in parameter_sets() {
            let (_dir, topology, _) = run(&config, IpMapOptions::default());
            let document: TopologyDocument = serde_yaml::from_str(&topology).unwrap();

            let mut ranges = vec![config.addressing.pool];
            ranges.extend(config.externals.iter().map(|e| e.network));

            let mut seen = HashSet::new();
            for node in &document.nodes {
                for interface in &node.interfaces {
                    let address: Ipv4Net = interface.ip.parse().unwrap();
                    assert!(seen.insert(address.addr()), "duplicate address {}", address);
                    assert!(
                        ranges.iter().any(|range| range.contains(&address.addr())),
                        "{} of {} outside declared ranges",
                        address,
                        node.id
                    );
                }
            }
        }
    }

    #[test]
    fn test_channel_endpoints_exist() {
        let config = Config {
            backbone_length: 4,
            ..Config::default()
        };
        let (_dir, topology, _) = run(&config, IpMapOptions::default());
        let document: TopologyDocument = serde_yaml::from_str(&topology).unwrap();

        let channel_ids: HashSet<&str> = document.channels.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(channel_ids.len(), document.channels.len());

        let mut endpoints = std::collections::HashMap::new();
        for node in &document.nodes {
            for interface in &node.interfaces {
                assert!(channel_ids.contains(interface.channel.as_str()));
                *endpoints.entry(interface.channel.as_str()).or_insert(0) += 1;
            }
        }
        assert!(endpoints.values().all(|&count| count == 2));
        assert_eq!(endpoints.len(), document.channels.len());
    }

    #[test]
    fn test_regeneration_is_identical() {
        let config = Config::default();
        let (_a, topology_a, ip_map_a) = run(&config, IpMapOptions::default());
        let (_b, topology_b, ip_map_b) = run(&config, IpMapOptions::default());

        assert_eq!(topology_a, topology_b);
        assert_eq!(ip_map_a, ip_map_b);
    }

    #[test]
    fn test_exhausted_pool_writes_nothing() {
        let mut config = Config::default();
        config.addressing.pool = "10.96.0.0/22".parse().unwrap();

        let dir = TempDir::new().unwrap();
        let topology_path = dir.path().join("topology.yml");
        let ip_map_path = dir.path().join("ips.txt");

        let err = generate(&config, &topology_path, &ip_map_path, IpMapOptions::default()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<GeneratorError>(),
            Some(GeneratorError::Allocation(AllocationError::PoolExhausted { .. }))
        ));
        assert!(err.to_string().contains("address space exhausted"));
        assert!(!topology_path.exists());
        assert!(!ip_map_path.exists());
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_invalid_parameters_write_nothing() {
        let config = Config {
            backbone_length: 0,
            ..Config::default()
        };

        let dir = TempDir::new().unwrap();
        let topology_path = dir.path().join("topology.yml");
        let ip_map_path = dir.path().join("ips.txt");

        let err = generate(&config, &topology_path, &ip_map_path, IpMapOptions::default()).unwrap_err();
        assert!(matches!(err.downcast_ref::<GeneratorError>(), Some(GeneratorError::Config(_))));
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_external_shadowing_generated_node_writes_nothing() {
        for name in ["uw0", "bb0.1"] {
            let mut config = Config {
                backbone_length: 2,
                aggregation_length: 1,
                access_length: 1,
                ..Config::default()
            };
            config.externals[0].name = name.to_string();

            let dir = TempDir::new().unwrap();
            let topology_path = dir.path().join("topology.yml");
            let ip_map_path = dir.path().join("ips.txt");

            let err = generate(&config, &topology_path, &ip_map_path, IpMapOptions::default()).unwrap_err();
            assert!(
                matches!(err.downcast_ref::<GeneratorError>(), Some(GeneratorError::Config(_))),
                "{}: {}",
                name,
                err
            );
            assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
        }
    }

    #[test]
    fn test_oversized_parameters_are_rejected() {
        let config = Config {
            backbone_length: 1,
            aggregation_length: 1 << 63,
            access_length: 1,
            ..Config::default()
        };

        let dir = TempDir::new().unwrap();
        let err = generate(
            &config,
            &dir.path().join("topology.yml"),
            &dir.path().join("ips.txt"),
            IpMapOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err.downcast_ref::<GeneratorError>(), Some(GeneratorError::Config(_))));
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    /// The bridging commands of the experiment address the PC and the RTU
    #[test]
    fn test_external_hosts_ip_map() {
        let options = IpMapOptions {
            format: IpMapFormat::Text,
            scope: IpMapScope::External,
        };
        let (_dir, _, ip_map) = run(&Config::default(), options);

        assert_eq!(ip_map, "pc -> 10.100.101.2\nrtu -> 10.100.102.2\n");
        let lines = parse_text(&ip_map).unwrap();
        assert_eq!(lines[0].1, Ipv4Addr::new(10, 100, 101, 2));
    }

    #[test]
    fn test_reference_topology_layout() {
        let (_dir, topology, _) = run(&Config::default(), IpMapOptions::default());
        let document: TopologyDocument = serde_yaml::from_str(&topology).unwrap();

        // 40 backbone + 120 aggregation + 180 access + 260 substations + 2 externals
        assert_eq!(document.nodes.len(), 602);
        assert_eq!(document.channels.len(), 702);
        assert_eq!(document.version, "1.0");

        let rtu = document.nodes.iter().find(|n| n.id == "rtu").unwrap();
        assert_eq!(rtu.interfaces[0].id, "rettij.rtu");
        assert_eq!(rtu.interfaces[0].channel, "c_acc90_rtu");

        let uw0 = document.nodes.iter().find(|n| n.id == "uw0").unwrap();
        let ips: Vec<&str> = uw0.interfaces.iter().map(|i| i.ip.as_str()).collect();
        assert_eq!(ips, vec!["10.96.2.130/28", "10.96.2.146/28"]);
    }

    #[test]
    fn test_uw_json_map() {
        let options = IpMapOptions {
            format: IpMapFormat::Json,
            scope: IpMapScope::Uw,
        };
        let (_dir, _, ip_map) = run(&Config::default(), options);
        let entries: Vec<IpMapEntry> = serde_json::from_str(&ip_map).unwrap();

        assert_eq!(entries.len(), 260);
        assert_eq!(entries[0].id, "uw0");
        assert_eq!(
            entries[0].interfaces,
            vec![Ipv4Addr::new(10, 96, 2, 130), Ipv4Addr::new(10, 96, 2, 146)]
        );
    }

    #[test]
    fn test_config_file_end_to_end() {
        let yaml = r#"
backbone_length: 2
aggregation_length: 1
access_length: 1
addressing:
  pool: 172.20.0.0/24
  link_prefix: 29
delays:
  backbone: 1ms
externals:
  - name: scada
    network: 192.168.50.0/30
    uplink:
      node: access1
"#;
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", yaml).unwrap();
        let config = load_config(file.path()).unwrap();

        let options = IpMapOptions {
            format: IpMapFormat::Text,
            scope: IpMapScope::External,
        };
        let (_dir, topology, ip_map) = run(&config, options);

        assert_eq!(ip_map, "scada -> 192.168.50.2\n");
        assert!(topology.contains("delay: 1000us"));
        assert!(topology.contains("ip: 172.20.0.1/29"));
        assert!(topology.contains("channel: c_acc1_scada"));
    }
}
