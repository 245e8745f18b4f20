//! Subnet registry.
//!
//! Tracks every address pool and every allocated subnet so that no two
//! pools overlap and no subnet is handed out twice.

use crate::errors::CompileError;
use ipnet::Ipv6Net;
use std::collections::HashMap;

/// Owner of an address pool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PoolOwner {
    As(u32),
    Ebgp,
}

impl PoolOwner {
    pub fn label(&self) -> String {
        match self {
            PoolOwner::As(asn) => format!("AS{}", asn),
            PoolOwner::Ebgp => "eBGP".to_string(),
        }
    }
}

/// Registry of reserved pools and allocated subnets
#[derive(Debug, Default)]
pub struct SubnetRegistry {
    /// Reserved pools in reservation order
    pools: Vec<(Ipv6Net, PoolOwner)>,
    /// Allocated subnet -> owner description
    allocated: HashMap<Ipv6Net, String>,
}

impl SubnetRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve `range` for `owner`, failing if it overlaps a pool already
    /// reserved by an AS.
    pub fn reserve_pool(&mut self, range: Ipv6Net, owner: PoolOwner) -> Result<(), CompileError> {
        if let Some((_, existing)) = self.pools.iter().find(|(pool, _)| overlaps(pool, &range)) {
            return Err(match (owner, *existing) {
                (PoolOwner::As(asn), PoolOwner::As(other_asn)) => {
                    CompileError::OverlappingAddressRange { asn, other_asn, range }
                }
                (_, existing) => CompileError::AddressConflict {
                    subnet: range,
                    first: existing.label(),
                    second: owner.label(),
                },
            });
        }
        self.pools.push((range, owner));
        Ok(())
    }

    /// True when `candidate` overlaps no reserved pool.
    pub fn is_free(&self, candidate: &Ipv6Net) -> bool {
        !self.pools.iter().any(|(pool, _)| overlaps(pool, candidate))
    }

    /// Record an allocated subnet, rejecting duplicates.
    pub fn record(&mut self, subnet: Ipv6Net, owner: &str) -> Result<(), CompileError> {
        if let Some(first) = self.allocated.get(&subnet) {
            return Err(CompileError::AddressConflict {
                subnet,
                first: first.clone(),
                second: owner.to_string(),
            });
        }
        self.allocated.insert(subnet, owner.to_string());
        Ok(())
    }

    /// Owner description of an allocated subnet
    pub fn owner_of(&self, subnet: &Ipv6Net) -> Option<&str> {
        self.allocated.get(subnet).map(String::as_str)
    }

    pub fn allocated_count(&self) -> usize {
        self.allocated.len()
    }
}

/// Whether two prefixes share any address
pub fn overlaps(a: &Ipv6Net, b: &Ipv6Net) -> bool {
    a.contains(b) || b.contains(a)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn net(s: &str) -> Ipv6Net {
        s.parse().unwrap()
    }

    #[test]
    fn test_overlap() {
        assert!(overlaps(&net("2001:db8::/32"), &net("2001:db8:5::/48")));
        assert!(overlaps(&net("2001:db8:5::/48"), &net("2001:db8::/32")));
        assert!(!overlaps(&net("2001:db8:5::/48"), &net("2001:db8:6::/48")));
    }

    #[test]
    fn test_overlapping_as_pools_rejected() {
        let mut registry = SubnetRegistry::new();
        registry.reserve_pool(net("2001:db8:1::/48"), PoolOwner::As(1)).unwrap();
        let err = registry
            .reserve_pool(net("2001:db8:1::/48"), PoolOwner::As(257))
            .unwrap_err();
        assert_eq!(
            err,
            CompileError::OverlappingAddressRange {
                asn: 257,
                other_asn: 1,
                range: net("2001:db8:1::/48")
            }
        );
        assert!(!registry.is_free(&net("2001:db8:1:5::/64")));
        assert!(registry.is_free(&net("2001:db8:2::/48")));
    }

    #[test]
    fn test_duplicate_allocation_rejected() {
        let mut registry = SubnetRegistry::new();
        registry.record(net("2001:db8:1::/64"), "R1-R2").unwrap();
        assert!(registry.record(net("2001:db8:1:1::/64"), "R2-R3").is_ok());
        assert!(matches!(
            registry.record(net("2001:db8:1::/64"), "R3-R4"),
            Err(CompileError::AddressConflict { .. })
        ));
        assert_eq!(registry.owner_of(&net("2001:db8:1::/64")), Some("R1-R2"));
        assert_eq!(registry.allocated_count(), 2);
    }
}
