//! IPv6 address planning.
//!
//! Allocation runs in three fixed steps over a validated inventory:
//! intra-AS links, inter-AS (eBGP) links, then loopbacks. Every step walks
//! links or routers in index order, so the same intent always produces the
//! same addressing.

use super::as_manager::{choose_ebgp_range, host_in, AsSubnetManager, SubnetCursor};
use super::registry::{PoolOwner, SubnetRegistry};
use crate::errors::CompileError;
use crate::inventory::{Interface, Inventory, LOOPBACK_INTERFACE};
use crate::topology::{discover_links, Endpoint, Link};
use ipnet::Ipv6Net;
use log::{debug, info};

/// Offset of the address given to the endpoint discovered first
const SOURCE_HOST: u128 = 1;
/// Offset of the address given to the reverse endpoint
const TARGET_HOST: u128 = 2;

fn set_address(inv: &mut Inventory, endpoint: &Endpoint, link: &Link, address: Ipv6Net) -> Result<(), CompileError> {
    let iface = inv
        .interface_mut(&endpoint.router, &endpoint.interface)
        .ok_or_else(|| CompileError::LinkInconsistency {
            router: link.source.router.clone(),
            interface: link.source.interface.clone(),
            neighbor: link.target.router.clone(),
        })?;
    iface.ipv6 = Some(address);
    Ok(())
}

/// Write `subnet`'s `::1` and `::2` into the two endpoints of `link`.
fn assign_link(
    inv: &mut Inventory,
    link: &Link,
    subnet: Ipv6Net,
    registry: &mut SubnetRegistry,
) -> Result<(), CompileError> {
    registry.record(
        subnet,
        &format!("{}:{} <-> {}:{}", link.source.router, link.source.interface, link.target.router, link.target.interface),
    )?;
    set_address(inv, &link.source, link, host_in(&subnet, SOURCE_HOST))?;
    set_address(inv, &link.target, link, host_in(&subnet, TARGET_HOST))?;
    debug!(
        "{} {}:{} <-> {}:{}",
        subnet, link.source.router, link.source.interface, link.target.router, link.target.interface
    );
    Ok(())
}

/// Address intra-AS links from each AS's own /48.
pub fn allocate_intra_as(
    inv: &mut Inventory,
    links: &[Link],
    registry: &mut SubnetRegistry,
) -> Result<(), CompileError> {
    let mut manager = AsSubnetManager::new(inv)?;
    for link in links {
        let subnet = manager.next_subnet(link.source.asn)?;
        assign_link(inv, link, subnet, registry)?;
    }
    info!("Addressed {} intra-AS links", links.len());
    Ok(())
}

/// Address inter-AS links from the shared eBGP range. A no-op without
/// inter-AS links.
pub fn allocate_inter_as(
    inv: &mut Inventory,
    links: &[Link],
    registry: &mut SubnetRegistry,
) -> Result<(), CompileError> {
    if links.is_empty() {
        debug!("No inter-AS links, skipping eBGP range selection");
        return Ok(());
    }

    let as_ranges: Vec<Ipv6Net> = inv.ases.values().map(|as_obj| as_obj.address_range).collect();
    let ebgp_range = choose_ebgp_range(&as_ranges)?;
    registry.reserve_pool(ebgp_range, PoolOwner::Ebgp)?;
    info!("Using {} for inter-AS links", ebgp_range);

    let mut cursor = SubnetCursor::new(PoolOwner::Ebgp.label(), ebgp_range, Vec::new())?;
    for link in links {
        let subnet = cursor.next_block()?;
        assign_link(inv, link, subnet, registry)?;
    }
    info!("Addressed {} inter-AS links", links.len());
    Ok(())
}

/// Give every router a /128 on `Loopback0` from its AS's loopback range,
/// creating the interface when it is missing.
pub fn allocate_loopbacks(inv: &mut Inventory) -> Result<(), CompileError> {
    for as_obj in inv.ases.values_mut() {
        let asn = as_obj.asn;
        let range = as_obj.loopback_range.trunc();
        let network = range.network();
        let mut hosts = range.hosts().filter(move |addr| *addr != network);

        for router in as_obj.routers.values_mut() {
            let host = hosts
                .next()
                .ok_or(CompileError::LoopbackPoolExhausted { asn, range })?;
            let loopback = router
                .interfaces
                .entry(LOOPBACK_INTERFACE.to_string())
                .or_insert_with(|| Interface::unlinked(LOOPBACK_INTERFACE));
            loopback.ipv6 = Some(Ipv6Net::new_assert(host, 128));
        }
    }
    Ok(())
}

/// Allocate every link and loopback address of a validated inventory.
pub fn allocate(mut inv: Inventory) -> Result<Inventory, CompileError> {
    let links = discover_links(&inv)?;

    let mut registry = SubnetRegistry::new();
    for as_obj in inv.ases.values() {
        registry.reserve_pool(as_obj.address_range, PoolOwner::As(as_obj.asn))?;
    }

    allocate_intra_as(&mut inv, &links.intra, &mut registry)?;
    allocate_inter_as(&mut inv, &links.inter, &mut registry)?;
    allocate_loopbacks(&mut inv)?;

    info!(
        "Allocated {} link subnets and {} loopbacks",
        registry.allocated_count(),
        inv.router_to_as.len()
    );
    Ok(inv)
}

/// Confirm that every link endpoint and every `Loopback0` carries an address.
pub fn check_addresses(inv: &Inventory) -> Result<(), CompileError> {
    let links = discover_links(inv)?;
    for link in links.iter() {
        for endpoint in [&link.source, &link.target] {
            let addressed = inv
                .router(&endpoint.router)
                .and_then(|router| router.interfaces.get(&endpoint.interface))
                .is_some_and(|iface| iface.ipv6.is_some());
            if !addressed {
                return Err(CompileError::MissingAddress {
                    router: endpoint.router.clone(),
                    interface: endpoint.interface.clone(),
                });
            }
        }
    }

    for (_, router) in inv.routers() {
        if router.loopback().is_none() {
            return Err(CompileError::MissingAddress {
                router: router.name.clone(),
                interface: LOOPBACK_INTERFACE.to_string(),
            });
        }
    }
    Ok(())
}
