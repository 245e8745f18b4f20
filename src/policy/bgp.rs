//! Per-router BGP session and policy compilation.
//!
//! iBGP mesh construction and eBGP neighbor discovery are two independent
//! walks: the mesh only looks at loopbacks inside one AS, eBGP only at
//! inter-AS interfaces and their reverse interfaces.

use super::tables::{export_route_map, import_route_map, policy_object_definitions, SET_LOCAL_ROUTE_MAP};
use crate::errors::CompileError;
use crate::inventory::{AutonomousSystem, Inventory, Relationship, Router, LOOPBACK_INTERFACE};
use crate::policy_config::PolicyConfig;
use crate::topology::find_reverse_interface;
use log::{debug, warn};
use regex::Regex;
use std::collections::BTreeMap;
use std::net::{Ipv4Addr, Ipv6Addr};
use std::sync::LazyLock;

/// Trailing digits of a router name
static ROUTER_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)$").expect("Invalid router number regex"));

/// Number at the end of a router name, e.g. 12 for `R12`
pub fn router_number(name: &str) -> Option<u64> {
    ROUTER_NUMBER
        .captures(name.trim())
        .and_then(|caps| caps[1].parse::<u64>().ok())
}

/// Router ID: the router number as all four octets. Names without a number
/// use 1; numbers are reduced modulo 256 and 0 maps to 1.
pub fn router_id(name: &str) -> Ipv4Addr {
    let octet = match router_number(name).map(|n| (n % 256) as u8) {
        Some(0) | None => 1,
        Some(n) => n,
    };
    Ipv4Addr::new(octet, octet, octet, octet)
}

/// eBGP neighbor as seen from one router
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EbgpNeighbor {
    pub router: String,
    pub address: Ipv6Addr,
    pub asn: u32,
    /// Role of the neighbor toward the local router
    pub role: Relationship,
}

/// Compiled BGP block for one router
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouterPolicy {
    pub router_id: Ipv4Addr,
    /// Policy objects shared by every router of the AS
    pub global: Vec<String>,
    /// `router bgp` block
    pub bgp: Vec<String>,
}

fn loopback_of(router: &Router) -> Result<Ipv6Addr, CompileError> {
    router.loopback().ok_or_else(|| CompileError::MissingAddress {
        router: router.name.clone(),
        interface: LOOPBACK_INTERFACE.to_string(),
    })
}

fn lookup_as(inv: &Inventory, asn: u32) -> Result<&AutonomousSystem, CompileError> {
    inv.ases.get(&asn).ok_or(CompileError::UnknownAs(asn))
}

/// iBGP peers of every router in `asn`: the loopbacks of all other routers
/// of the AS, ordered by router number then name.
pub fn ibgp_peers(inv: &Inventory, asn: u32) -> Result<BTreeMap<String, Vec<Ipv6Addr>>, CompileError> {
    let as_obj = lookup_as(inv, asn)?;

    let mut ordered: Vec<&Router> = as_obj.routers.values().collect();
    ordered.sort_by_key(|router| (router_number(&router.name).unwrap_or(u64::MAX), router.name.clone()));

    let loopbacks = ordered
        .iter()
        .map(|router| loopback_of(router).map(|lo| (router.name.as_str(), lo)))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(as_obj
        .routers
        .keys()
        .map(|name| {
            let peers = loopbacks
                .iter()
                .filter(|(peer, _)| *peer != name.as_str())
                .map(|(_, lo)| *lo)
                .collect();
            (name.clone(), peers)
        })
        .collect())
}

/// Role of the neighbor on an inter-AS interface: the complement of the
/// local tag, else the neighbor's own tag, else peer.
fn neighbor_role(local: Option<Relationship>, remote: Option<Relationship>, router: &str, neighbor: &str) -> Relationship {
    match (local, remote) {
        (Some(local), _) => local.complement(),
        (None, Some(remote)) => remote,
        (None, None) => {
            warn!("No relationship on {} <-> {}, treating as peer", router, neighbor);
            Relationship::Peer
        }
    }
}

/// eBGP neighbors of every router in `asn`, one per inter-AS interface, in
/// interface order.
pub fn ebgp_neighbors(inv: &Inventory, asn: u32) -> Result<BTreeMap<String, Vec<EbgpNeighbor>>, CompileError> {
    let as_obj = lookup_as(inv, asn)?;
    let mut out = BTreeMap::new();

    for router in as_obj.routers.values() {
        let mut neighbors = Vec::new();
        for iface in router.interfaces.values() {
            if iface.is_loopback() {
                continue;
            }
            let Some(neighbor) = iface.neighbor.as_deref() else {
                continue;
            };
            let Some(neighbor_asn) = inv.router_to_as.asn_of(neighbor) else {
                continue;
            };
            if neighbor_asn == asn {
                continue;
            }

            let link_error = || CompileError::LinkInconsistency {
                router: router.name.clone(),
                interface: iface.name.clone(),
                neighbor: neighbor.to_string(),
            };
            let reverse_name = find_reverse_interface(inv, &router.name, neighbor).ok_or_else(link_error)?;
            let reverse = inv
                .router(neighbor)
                .and_then(|ngbr| ngbr.interfaces.get(reverse_name))
                .ok_or_else(link_error)?;
            let address = reverse.address().ok_or_else(|| CompileError::MissingAddress {
                router: neighbor.to_string(),
                interface: reverse_name.to_string(),
            })?;

            neighbors.push(EbgpNeighbor {
                router: neighbor.to_string(),
                address,
                asn: neighbor_asn,
                role: neighbor_role(iface.relationship, reverse.relationship, &router.name, neighbor),
            });
        }
        out.insert(router.name.clone(), neighbors);
    }
    Ok(out)
}

/// Compile the BGP block of every router in `asn`.
pub fn compile(
    inv: &Inventory,
    asn: u32,
    config: &PolicyConfig,
) -> Result<BTreeMap<String, RouterPolicy>, CompileError> {
    let as_obj = lookup_as(inv, asn)?;
    let ibgp = ibgp_peers(inv, asn)?;
    let ebgp = ebgp_neighbors(inv, asn)?;
    let global = policy_object_definitions(config);

    let mut per_router = BTreeMap::new();
    for router in as_obj.routers.values() {
        let rid = router_id(&router.name);
        let local_lo = loopback_of(router)?;
        let ibgp_peers = ibgp.get(&router.name).map(Vec::as_slice).unwrap_or_default();
        let ebgp_peers = ebgp.get(&router.name).map(Vec::as_slice).unwrap_or_default();

        let mut bgp = vec![
            format!("router bgp {}", asn),
            format!(" bgp router-id {}", rid),
            " bgp log-neighbor-changes".to_string(),
            " no bgp default ipv4-unicast".to_string(),
        ];

        for peer_lo in ibgp_peers {
            bgp.push(format!(" neighbor {} remote-as {}", peer_lo, asn));
            bgp.push(format!(" neighbor {} update-source {}", peer_lo, LOOPBACK_INTERFACE));
        }
        for peer in ebgp_peers {
            bgp.push(format!(" neighbor {} remote-as {}", peer.address, peer.asn));
        }

        bgp.push(" address-family ipv6 unicast".to_string());
        bgp.push(format!("  network {}/128 route-map {}", local_lo, SET_LOCAL_ROUTE_MAP));

        for peer_lo in ibgp_peers {
            bgp.push(format!("  neighbor {} activate", peer_lo));
            bgp.push(format!("  neighbor {} next-hop-self", peer_lo));
            bgp.push(format!("  neighbor {} send-community both", peer_lo));
        }
        for peer in ebgp_peers {
            bgp.push(format!("  neighbor {} activate", peer.address));
            bgp.push(format!("  neighbor {} route-map {} in", peer.address, import_route_map(peer.role)));
            bgp.push(format!("  neighbor {} route-map {} out", peer.address, export_route_map(peer.role)));
            bgp.push(format!("  neighbor {} send-community both", peer.address));
        }
        bgp.push(" exit-address-family".to_string());

        debug!(
            "{}: {} iBGP peers, {} eBGP neighbors",
            router.name,
            ibgp_peers.len(),
            ebgp_peers.len()
        );
        per_router.insert(
            router.name.clone(),
            RouterPolicy {
                router_id: rid,
                global: global.clone(),
                bgp,
            },
        );
    }

    Ok(per_router)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intent::Intent;
    use crate::inventory::build;
    use crate::ip::allocate;
    use crate::topology::validate;

    fn addressed(json: &str) -> Inventory {
        let intent: Intent = serde_json::from_str(json).unwrap();
        allocate(validate(build(&intent).unwrap()).unwrap()).unwrap()
    }

    const THREE_ROUTERS: &str = r#"{"AS": {
        "65001": {"igp": "OSPF", "routers": {
            "R1": {"interfaces": {"g0": {"ngbr": "R2"}}},
            "R2": {"interfaces": {"g0": {"ngbr": "R1"}, "g1": {"ngbr": "R3", "relationship": "provider"}}}
        }},
        "65002": {"igp": "RIP", "routers": {
            "R3": {"interfaces": {"g0": {"ngbr": "R2", "relationship": "customer"}}}
        }}
    }}"#;

    #[test]
    fn test_router_id() {
        assert_eq!(router_id("R12"), Ipv4Addr::new(12, 12, 12, 12));
        assert_eq!(router_id("core"), Ipv4Addr::new(1, 1, 1, 1));
        assert_eq!(router_id("edge-7"), Ipv4Addr::new(7, 7, 7, 7));
        assert_eq!(router_id("R300"), Ipv4Addr::new(44, 44, 44, 44));
        assert_eq!(router_id("R0"), Ipv4Addr::new(1, 1, 1, 1));
    }

    #[test]
    fn test_ibgp_full_mesh_over_loopbacks() {
        let inv = addressed(THREE_ROUTERS);
        let peers = ibgp_peers(&inv, 65001).unwrap();
        assert_eq!(peers["R1"], vec!["2001:db8:233:ffff::2".parse::<Ipv6Addr>().unwrap()]);
        assert_eq!(peers["R2"], vec!["2001:db8:233:ffff::1".parse::<Ipv6Addr>().unwrap()]);

        let single = ibgp_peers(&inv, 65002).unwrap();
        assert!(single["R3"].is_empty());
    }

    #[test]
    fn test_ebgp_neighbors_use_reverse_interface() {
        let inv = addressed(THREE_ROUTERS);
        let r3_addr = inv.router("R3").unwrap().interfaces["g0"].address().unwrap();
        let r2_addr = inv.router("R2").unwrap().interfaces["g1"].address().unwrap();

        let ebgp = ebgp_neighbors(&inv, 65001).unwrap();
        assert!(ebgp["R1"].is_empty());
        assert_eq!(
            ebgp["R2"],
            vec![EbgpNeighbor {
                router: "R3".into(),
                address: r3_addr,
                asn: 65002,
                role: Relationship::Customer,
            }]
        );

        let ebgp = ebgp_neighbors(&inv, 65002).unwrap();
        assert_eq!(ebgp["R3"][0].address, r2_addr);
        assert_eq!(ebgp["R3"][0].role, Relationship::Provider);
    }

    #[test]
    fn test_compiled_block() {
        let inv = addressed(THREE_ROUTERS);
        let policies = compile(&inv, 65002, &PolicyConfig::default()).unwrap();
        let r3 = &policies["R3"];
        let r2_addr = inv.router("R2").unwrap().interfaces["g1"].address().unwrap();

        assert_eq!(r3.router_id, Ipv4Addr::new(3, 3, 3, 3));
        assert_eq!(r3.bgp[0], "router bgp 65002");
        assert!(r3.bgp.contains(&format!(" neighbor {} remote-as 65001", r2_addr)));
        assert!(r3.bgp.contains(&format!("  neighbor {} route-map RM-IN-PROVIDER in", r2_addr)));
        assert!(r3.bgp.contains(&format!("  neighbor {} route-map RM-OUT-TO-PROVIDER out", r2_addr)));
        assert!(r3.bgp.contains(&"  network 2001:db8:234:ffff::1/128 route-map RM-SET-LOCAL".to_string()));
        assert_eq!(r3.bgp.last().unwrap(), " exit-address-family");
        assert!(!r3.bgp.iter().any(|l| l.contains("update-source")));
    }

    #[test]
    fn test_ibgp_lines() {
        let inv = addressed(THREE_ROUTERS);
        let policies = compile(&inv, 65001, &PolicyConfig::default()).unwrap();
        let r1 = &policies["R1"];

        assert!(r1.bgp.contains(&" neighbor 2001:db8:233:ffff::2 remote-as 65001".to_string()));
        assert!(r1.bgp.contains(&" neighbor 2001:db8:233:ffff::2 update-source Loopback0".to_string()));
        assert!(r1.bgp.contains(&"  neighbor 2001:db8:233:ffff::2 next-hop-self".to_string()));
        assert!(r1.bgp.contains(&"  neighbor 2001:db8:233:ffff::2 send-community both".to_string()));
        assert_eq!(r1.global, policies["R2"].global);
    }

    #[test]
    fn test_unknown_as() {
        let inv = addressed(THREE_ROUTERS);
        assert_eq!(
            compile(&inv, 1, &PolicyConfig::default()).unwrap_err(),
            CompileError::UnknownAs(1)
        );
    }

    #[test]
    fn test_unaddressed_inventory_rejected() {
        let intent: Intent = serde_json::from_str(THREE_ROUTERS).unwrap();
        let inv = validate(build(&intent).unwrap()).unwrap();
        assert!(matches!(
            compile(&inv, 65001, &PolicyConfig::default()),
            Err(CompileError::MissingAddress { .. })
        ));
    }
}
