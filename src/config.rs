use ipnet::Ipv4Net;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::net::Ipv4Addr;
use std::sync::LazyLock;
use std::time::Duration;

/// Node ids and short ids the generator assigns itself
static GENERATED_ID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:(?:backbone|aggregation|bb|agg)\d+\.\d+|(?:access|acc|uw)\d+)$")
        .expect("Invalid generated id regex")
});

/// Generation parameters for a grid topology.
///
/// Every field has a default, so an empty YAML document (or no file at all)
/// describes the reference experiment: a ring of 20 backbone pairs, 3
/// aggregation pairs per segment and 3 access routers per aggregation pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Number of redundant backbone router pairs forming the ring
    pub backbone_length: usize,
    /// Aggregation router pairs chained between two neighbouring backbone pairs
    pub aggregation_length: usize,
    /// Access routers chained below each aggregation pair
    pub access_length: usize,
    pub addressing: AddressingConfig,
    pub delays: DelayConfig,
    /// External hosts bridged into the emulation, in attach order
    pub externals: Vec<ExternalConfig>,
}

/// Address space used for point-to-point links
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AddressingConfig {
    /// Network the link subnets are carved from
    pub pool: Ipv4Net,
    /// Prefix length of every link subnet
    pub link_prefix: u8,
}

/// One-way delays applied to the links of each tier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DelayConfig {
    #[serde(with = "humantime_serde")]
    pub backbone: Duration,
    #[serde(with = "humantime_serde")]
    pub aggregation: Duration,
    #[serde(with = "humantime_serde")]
    pub access: Duration,
}

/// An external host (control-center PC, RTU, ...) with its own network
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExternalConfig {
    /// Role name, used as node id and in the `rettij.{name}` interface
    pub name: String,
    /// Network shared by the host and its uplink router
    pub network: Ipv4Net,
    #[serde(with = "serde_yaml::with::singleton_map")]
    pub uplink: Uplink,
}

/// Router an external host is attached to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Uplink {
    /// Side 0 of the first backbone pair (`backbone0.0`)
    FirstBackbone,
    /// The access router in the middle of the enumeration order
    MiddleAccess,
    /// A backbone, aggregation or access router, by node id
    Node(String),
}

impl Config {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.backbone_length == 0 {
            return Err(ValidationError::InvalidTopology(
                "backbone_length must be at least 1".to_string(),
            ));
        }

        if self.required_link_networks().is_none() {
            return Err(ValidationError::InvalidTopology(format!(
                "{} backbone pairs x {} aggregation pairs x {} access routers is too large to address",
                self.backbone_length, self.aggregation_length, self.access_length
            )));
        }

        self.addressing.validate()?;
        self.delays.validate()?;

        let mut seen: Vec<&ExternalConfig> = Vec::new();
        for external in &self.externals {
            if external.name.trim().is_empty() {
                return Err(ValidationError::InvalidExternal(
                    "external name cannot be empty".to_string(),
                ));
            }
            if external.name.contains('_') {
                return Err(ValidationError::InvalidExternal(format!(
                    "external name '{}' cannot contain '_', it separates the parts of channel ids",
                    external.name
                )));
            }
            if GENERATED_ID.is_match(&external.name) {
                return Err(ValidationError::InvalidExternal(format!(
                    "external name '{}' collides with a generated node id",
                    external.name
                )));
            }
            if external.network.prefix_len() > 30 {
                return Err(ValidationError::InvalidExternal(format!(
                    "network {} of external '{}' has room for fewer than two hosts",
                    external.network, external.name
                )));
            }
            if overlaps(&external.network, &self.addressing.pool) {
                return Err(ValidationError::InvalidExternal(format!(
                    "network {} of external '{}' overlaps the link pool {}",
                    external.network, external.name, self.addressing.pool
                )));
            }
            for other in &seen {
                if other.name == external.name {
                    return Err(ValidationError::InvalidExternal(format!(
                        "duplicate external name '{}'",
                        external.name
                    )));
                }
                if overlaps(&other.network, &external.network) {
                    return Err(ValidationError::InvalidExternal(format!(
                        "networks of externals '{}' ({}) and '{}' ({}) overlap",
                        other.name, other.network, external.name, external.network
                    )));
                }
            }
            if external.uplink == Uplink::MiddleAccess && self.access_count() == Some(0) {
                return Err(ValidationError::InvalidExternal(format!(
                    "external '{}' uses uplink middle_access but the topology has no access routers",
                    external.name
                )));
            }
            seen.push(external);
        }

        Ok(())
    }

    /// Total number of access routers the parameters describe, `None` on overflow
    pub fn access_count(&self) -> Option<usize> {
        self.backbone_length
            .checked_mul(self.aggregation_length)?
            .checked_mul(self.access_length)
    }

    /// Number of link subnets construction will draw from the pool, `None` on overflow
    pub fn required_link_networks(&self) -> Option<usize> {
        let aggregation = self.aggregation_length;
        let access = self.access_length;
        // ring: one internal link per pair plus one link to the next pair
        let ring = 2;
        let backbone_uw = 2;
        let chain = if aggregation > 0 { aggregation.checked_add(1)? } else { 0 };
        let per_aggregation = access.checked_mul(2)?.checked_add(2)?;
        let per_segment = aggregation
            .checked_mul(per_aggregation)?
            .checked_add(aggregation)?
            .checked_add(chain)?
            .checked_add(ring + backbone_uw)?;
        self.backbone_length.checked_mul(per_segment)
    }
}

impl AddressingConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.link_prefix > 30 {
            return Err(ValidationError::InvalidAddressing(format!(
                "link_prefix /{} leaves fewer than two host addresses per link",
                self.link_prefix
            )));
        }
        if self.link_prefix <= self.pool.prefix_len() {
            return Err(ValidationError::InvalidAddressing(format!(
                "link_prefix /{} must be longer than the pool prefix of {}",
                self.link_prefix, self.pool
            )));
        }
        if self.pool != self.pool.trunc() {
            log::warn!(
                "Pool {} has host bits set, using {} instead",
                self.pool,
                self.pool.trunc()
            );
        }
        Ok(())
    }

    /// Number of link subnets the pool can hold
    pub fn capacity(&self) -> u64 {
        1u64 << self.link_prefix.saturating_sub(self.pool.prefix_len()).min(32)
    }
}

impl DelayConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        let tiers = [
            ("backbone", self.backbone),
            ("aggregation", self.aggregation),
            ("access", self.access),
        ];
        for (tier, delay) in tiers {
            if delay.subsec_nanos() % 1_000 != 0 {
                return Err(ValidationError::InvalidDelay(format!(
                    "{} delay {:?} is not a whole number of microseconds",
                    tier, delay
                )));
            }
        }
        Ok(())
    }
}

fn overlaps(a: &Ipv4Net, b: &Ipv4Net) -> bool {
    a.contains(&b.network()) || b.contains(&a.network())
}

/// Configuration validation errors
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("Invalid topology configuration: {0}")]
    InvalidTopology(String),
    #[error("Invalid addressing configuration: {0}")]
    InvalidAddressing(String),
    #[error("Invalid delay configuration: {0}")]
    InvalidDelay(String),
    #[error("Invalid external configuration: {0}")]
    InvalidExternal(String),
}

/// Default implementations
impl Default for Config {
    fn default() -> Self {
        Self {
            backbone_length: 20,
            aggregation_length: 3,
            access_length: 3,
            addressing: AddressingConfig::default(),
            delays: DelayConfig::default(),
            externals: vec![
                ExternalConfig {
                    name: "pc".to_string(),
                    network: Ipv4Net::new_assert(Ipv4Addr::new(10, 100, 101, 0), 24),
                    uplink: Uplink::FirstBackbone,
                },
                ExternalConfig {
                    name: "rtu".to_string(),
                    network: Ipv4Net::new_assert(Ipv4Addr::new(10, 100, 102, 0), 24),
                    uplink: Uplink::MiddleAccess,
                },
            ],
        }
    }
}

impl Default for AddressingConfig {
    fn default() -> Self {
        Self {
            pool: Ipv4Net::new_assert(Ipv4Addr::new(10, 96, 0, 0), 16),
            link_prefix: 28,
        }
    }
}

impl Default for DelayConfig {
    fn default() -> Self {
        Self {
            backbone: Duration::from_micros(25),
            aggregation: Duration::from_micros(150),
            access: Duration::from_micros(100),
        }
    }
}
