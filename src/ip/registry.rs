//! IP address registry.
//!
//! This file tracks every address assigned during construction together with
//! the interface that owns it, and the address ranges the topology declares.

use ipnet::Ipv4Net;
use std::collections::BTreeMap;
use std::net::Ipv4Addr;

use super::AllocationError;

/// Registry of assigned addresses and declared ranges
#[derive(Debug, Default)]
pub struct AddressRegistry {
    /// Address -> owning interface label (`node/interface`)
    assigned: BTreeMap<Ipv4Addr, String>,
    /// Ranges addresses may be drawn from
    declared: Vec<Ipv4Net>,
}

impl AddressRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a range addresses may be assigned from
    pub fn declare_range(&mut self, range: Ipv4Net) {
        let range = range.trunc();
        if !self.declared.contains(&range) {
            self.declared.push(range);
        }
    }

    /// Record `address` as owned by `owner`
    pub fn register(&mut self, address: Ipv4Addr, owner: &str) -> Result<(), AllocationError> {
        if let Some(existing) = self.assigned.get(&address) {
            return Err(AllocationError::AddressConflict {
                address,
                existing: existing.clone(),
                requested: owner.to_string(),
            });
        }
        self.assigned.insert(address, owner.to_string());
        Ok(())
    }

    /// Get the interface that owns a given address
    pub fn owner_of(&self, address: Ipv4Addr) -> Option<&str> {
        self.assigned.get(&address).map(String::as_str)
    }

    /// Whether `network` lies entirely within one declared range
    pub fn is_declared(&self, network: &Ipv4Net) -> bool {
        self.declared.iter().any(|range| range.contains(network))
    }

    pub fn declared_ranges(&self) -> &[Ipv4Net] {
        &self.declared
    }

    /// Number of addresses handed out
    pub fn assigned_count(&self) -> usize {
        self.assigned.len()
    }
}
