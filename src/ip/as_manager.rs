//! Per-AS subnet pools and the shared eBGP range.
//!
//! Each AS carves its point-to-point /64s from its own /48. Inter-AS links
//! share one /48 chosen so that it overlaps no AS range.

use super::registry::overlaps;
use crate::errors::CompileError;
use crate::inventory::Inventory;
use ipnet::{Ipv6Net, Ipv6Subnets};
use std::collections::BTreeMap;
use std::net::Ipv6Addr;

/// Prefix length of every point-to-point link subnet
pub const LINK_PREFIX_LEN: u8 = 64;

/// Prefix length of the eBGP candidate blocks
pub const EBGP_BLOCK_PREFIX_LEN: u8 = 48;

/// Prefix length of the superblock the eBGP range is searched in
pub const EBGP_SUPERBLOCK_PREFIX_LEN: u8 = 32;

/// Hands out the /64 blocks of a range in ascending order, skipping blocks
/// that overlap a reserved prefix.
#[derive(Debug)]
pub struct SubnetCursor {
    pool: String,
    range: Ipv6Net,
    blocks: Ipv6Subnets,
    reserved: Vec<Ipv6Net>,
}

impl SubnetCursor {
    pub fn new(
        pool: impl Into<String>,
        range: Ipv6Net,
        reserved: Vec<Ipv6Net>,
    ) -> Result<Self, CompileError> {
        let pool = pool.into();
        let blocks = range
            .trunc()
            .subnets(LINK_PREFIX_LEN)
            .map_err(|_| CompileError::AddressPoolExhausted {
                pool: pool.clone(),
                range,
            })?;
        Ok(Self {
            pool,
            range,
            blocks,
            reserved,
        })
    }

    /// Next unused block, or `AddressPoolExhausted`.
    pub fn next_block(&mut self) -> Result<Ipv6Net, CompileError> {
        for block in self.blocks.by_ref() {
            if self.reserved.iter().any(|reserved| overlaps(reserved, &block)) {
                continue;
            }
            return Ok(block);
        }
        Err(CompileError::AddressPoolExhausted {
            pool: self.pool.clone(),
            range: self.range,
        })
    }
}

/// Address `offset` hosts into `subnet`, keeping the subnet's prefix length.
pub fn host_in(subnet: &Ipv6Net, offset: u128) -> Ipv6Net {
    let addr = Ipv6Addr::from(u128::from(subnet.network()) + offset);
    // Prefix length comes from an existing subnet, so it is always valid.
    Ipv6Net::new_assert(addr, subnet.prefix_len())
}

/// One cursor per AS over its address range, with the AS's loopback range
/// held back.
#[derive(Debug)]
pub struct AsSubnetManager {
    cursors: BTreeMap<u32, SubnetCursor>,
}

impl AsSubnetManager {
    pub fn new(inv: &Inventory) -> Result<Self, CompileError> {
        let mut cursors = BTreeMap::new();
        for as_obj in inv.ases.values() {
            let cursor = SubnetCursor::new(
                format!("AS{}", as_obj.asn),
                as_obj.address_range,
                vec![as_obj.loopback_range],
            )?;
            cursors.insert(as_obj.asn, cursor);
        }
        Ok(Self { cursors })
    }

    /// Next free /64 of `asn`'s range
    pub fn next_subnet(&mut self, asn: u32) -> Result<Ipv6Net, CompileError> {
        self.cursors
            .get_mut(&asn)
            .ok_or(CompileError::UnknownAs(asn))?
            .next_block()
    }
}

/// Pick the shared eBGP /48.
///
/// Candidates are the /48s of the /32 that contains the first AS range, in
/// ascending order; the first one disjoint from every AS range wins.
pub fn choose_ebgp_range(as_ranges: &[Ipv6Net]) -> Result<Ipv6Net, CompileError> {
    let anchor = as_ranges
        .first()
        .map(|range| range.network())
        .unwrap_or_else(|| Ipv6Addr::new(0x2001, 0xdb8, 0, 0, 0, 0, 0, 0));
    let superblock = Ipv6Net::new_assert(anchor, EBGP_SUPERBLOCK_PREFIX_LEN).trunc();

    let candidates = superblock
        .subnets(EBGP_BLOCK_PREFIX_LEN)
        .map_err(|_| CompileError::NoEbgpRangeAvailable { superblock })?;

    for candidate in candidates {
        if as_ranges.iter().all(|range| !overlaps(range, &candidate)) {
            return Ok(candidate);
        }
    }
    Err(CompileError::NoEbgpRangeAvailable { superblock })
}
