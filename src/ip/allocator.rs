//! Link network allocation.
//!
//! The pool is split into equally sized subnets which are handed out in
//! ascending address order, so the same sequence of requests always yields
//! the same networks.

use ipnet::{Ipv4Net, Ipv4Subnets};
use std::net::Ipv4Addr;

use super::AllocationError;

/// Sequential allocator of link networks
#[derive(Debug)]
pub struct NetworkPool {
    pool: Ipv4Net,
    prefix: u8,
    subnets: Ipv4Subnets,
    allocated: u64,
}

impl NetworkPool {
    /// Create a pool handing out `/prefix` networks from `pool`
    pub fn new(pool: Ipv4Net, prefix: u8) -> Result<Self, AllocationError> {
        let pool = pool.trunc();
        let subnets = pool
            .subnets(prefix)
            .map_err(|_| AllocationError::InvalidPrefix { pool, prefix })?;

        Ok(NetworkPool {
            pool,
            prefix,
            subnets,
            allocated: 0,
        })
    }

    /// Take the next free network
    pub fn next_network(&mut self) -> Result<Ipv4Net, AllocationError> {
        match self.subnets.next() {
            Some(network) => {
                self.allocated += 1;
                Ok(network)
            }
            None => Err(AllocationError::PoolExhausted {
                pool: self.pool,
                prefix: self.prefix,
                capacity: self.capacity(),
            }),
        }
    }

    /// Number of networks the pool holds in total
    pub fn capacity(&self) -> u64 {
        if self.prefix < self.pool.prefix_len() {
            return 0;
        }
        1u64 << (self.prefix - self.pool.prefix_len())
    }

    /// Number of networks handed out so far
    pub fn allocated(&self) -> u64 {
        self.allocated
    }

    pub fn pool(&self) -> Ipv4Net {
        self.pool
    }
}

/// Address of host number `offset + 1` in `network`, carrying its prefix length.
///
/// Host numbers start at 1, skipping the network address; the broadcast
/// address is never handed out.
pub fn host_address(network: Ipv4Net, offset: usize) -> Result<Ipv4Net, AllocationError> {
    let network = network.trunc();
    let host = u32::try_from(offset)
        .ok()
        .and_then(|offset| offset.checked_add(1))
        .unwrap_or(u32::MAX);

    let size = 1u64 << (32 - network.prefix_len());
    if u64::from(host) + 1 >= size {
        return Err(AllocationError::HostOutOfRange { network, host });
    }

    let address = Ipv4Addr::from(u32::from(network.network()) + host);
    Ipv4Net::new(address, network.prefix_len())
        .map_err(|_| AllocationError::HostOutOfRange { network, host })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn net(s: &str) -> Ipv4Net {
        s.parse().unwrap()
    }

    #[test]
    fn test_networks_are_sequential() {
        let mut pool = NetworkPool::new(net("10.96.0.0/16"), 28).unwrap();
        assert_eq!(pool.capacity(), 4096);
        assert_eq!(pool.next_network().unwrap(), net("10.96.0.0/28"));
        assert_eq!(pool.next_network().unwrap(), net("10.96.0.16/28"));
        assert_eq!(pool.next_network().unwrap(), net("10.96.0.32/28"));
        assert_eq!(pool.allocated(), 3);
    }

    #[test]
    fn test_pool_exhaustion() {
        let mut pool = NetworkPool::new(net("10.96.0.0/29"), 30).unwrap();
        assert!(pool.next_network().is_ok());
        assert!(pool.next_network().is_ok());

        let err = pool.next_network().unwrap_err();
        assert!(matches!(
            err,
            AllocationError::PoolExhausted { capacity: 2, prefix: 30, .. }
        ));
        assert!(err.to_string().contains("10.96.0.0/29"));
    }

    #[test]
    fn test_pool_with_host_bits_is_truncated() {
        let mut pool = NetworkPool::new(net("10.96.3.7/16"), 24).unwrap();
        assert_eq!(pool.pool(), net("10.96.0.0/16"));
        assert_eq!(pool.next_network().unwrap(), net("10.96.0.0/24"));
    }

    #[test]
    fn test_invalid_prefix() {
        assert!(matches!(
            NetworkPool::new(net("10.96.0.0/16"), 8),
            Err(AllocationError::InvalidPrefix { .. })
        ));
    }

    #[test]
    fn test_host_address() {
        let network = net("10.100.101.0/24");
        assert_eq!(host_address(network, 0).unwrap().to_string(), "10.100.101.1/24");
        assert_eq!(host_address(network, 1).unwrap().to_string(), "10.100.101.2/24");
        assert_eq!(host_address(network, 253).unwrap().to_string(), "10.100.101.254/24");
        assert!(host_address(network, 254).is_err());
    }

    #[test]
    fn test_host_address_smallest_link() {
        let network = net("10.96.0.4/30");
        assert_eq!(host_address(network, 0).unwrap().addr(), Ipv4Addr::new(10, 96, 0, 5));
        assert_eq!(host_address(network, 1).unwrap().addr(), Ipv4Addr::new(10, 96, 0, 6));
        assert!(matches!(
            host_address(network, 2),
            Err(AllocationError::HostOutOfRange { host: 3, .. })
        ));
    }
}
