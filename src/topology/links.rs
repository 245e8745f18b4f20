//! Link discovery.
//!
//! A link is never stored; it is derived from two interfaces naming each
//! other's routers. Discovery walks the global router index so that the
//! resulting link lists, and everything allocated from them, are
//! reproducible run-to-run.

use crate::errors::CompileError;
use crate::inventory::Inventory;
use std::collections::HashSet;

/// One side of a link
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Endpoint {
    pub router: String,
    pub interface: String,
    pub asn: u32,
}

/// Whether a link stays inside one AS
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkKind {
    IntraAs,
    InterAs,
}

/// Undirected link. `source` is the endpoint discovered first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    pub source: Endpoint,
    pub target: Endpoint,
    pub kind: LinkKind,
}

/// Links split by kind, each list in discovery order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiscoveredLinks {
    pub intra: Vec<Link>,
    pub inter: Vec<Link>,
}

impl DiscoveredLinks {
    pub fn len(&self) -> usize {
        self.intra.len() + self.inter.len()
    }

    pub fn is_empty(&self) -> bool {
        self.intra.is_empty() && self.inter.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Link> {
        self.intra.iter().chain(self.inter.iter())
    }
}

/// Names of the interfaces on `neighbor` that point back at `router`, in
/// interface order.
pub fn reverse_interfaces<'a>(inv: &'a Inventory, router: &str, neighbor: &str) -> Vec<&'a str> {
    inv.router(neighbor)
        .map(|ngbr| {
            ngbr.interfaces
                .values()
                .filter(|iface| iface.neighbor.as_deref() == Some(router))
                .map(|iface| iface.name.as_str())
                .collect()
        })
        .unwrap_or_default()
}

/// First interface on `neighbor` that points back at `router`.
pub fn find_reverse_interface<'a>(inv: &'a Inventory, router: &str, neighbor: &str) -> Option<&'a str> {
    reverse_interfaces(inv, router, neighbor).into_iter().next()
}

/// Discover and classify every link of a validated inventory.
///
/// Routers are walked in global index order and interfaces in name order.
/// Interfaces with no neighbor or an unknown neighbor are skipped, and each
/// unordered router pair is emitted once. A missing reverse interface at
/// this point means validation was bypassed, which is reported as
/// [`CompileError::LinkInconsistency`].
pub fn discover_links(inv: &Inventory) -> Result<DiscoveredLinks, CompileError> {
    let mut links = DiscoveredLinks::default();
    let mut seen_pairs: HashSet<(String, String)> = HashSet::new();

    for (as_obj, router) in inv.routers() {
        for iface in router.interfaces.values() {
            let Some(neighbor) = iface.neighbor.as_deref() else {
                continue;
            };
            let Some(neighbor_asn) = inv.router_to_as.asn_of(neighbor) else {
                continue;
            };

            if seen_pairs.contains(&(router.name.clone(), neighbor.to_string()))
                || seen_pairs.contains(&(neighbor.to_string(), router.name.clone()))
            {
                continue;
            }

            let reverse = find_reverse_interface(inv, &router.name, neighbor).ok_or_else(|| {
                CompileError::LinkInconsistency {
                    router: router.name.clone(),
                    interface: iface.name.clone(),
                    neighbor: neighbor.to_string(),
                }
            })?;

            let link = Link {
                source: Endpoint {
                    router: router.name.clone(),
                    interface: iface.name.clone(),
                    asn: as_obj.asn,
                },
                target: Endpoint {
                    router: neighbor.to_string(),
                    interface: reverse.to_string(),
                    asn: neighbor_asn,
                },
                kind: if as_obj.asn == neighbor_asn {
                    LinkKind::IntraAs
                } else {
                    LinkKind::InterAs
                },
            };

            match link.kind {
                LinkKind::IntraAs => links.intra.push(link),
                LinkKind::InterAs => links.inter.push(link),
            }
            seen_pairs.insert((router.name.clone(), neighbor.to_string()));
        }
    }

    log::debug!(
        "Discovered {} intra-AS and {} inter-AS links",
        links.intra.len(),
        links.inter.len()
    );
    Ok(links)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intent::Intent;
    use crate::inventory::build;

    fn inventory(json: &str) -> Inventory {
        let intent: Intent = serde_json::from_str(json).unwrap();
        build(&intent).unwrap()
    }

    const TRIANGLE: &str = r#"{"AS": {
        "1": {"igp": "OSPF", "routers": {
            "R1": {"interfaces": {"g0": {"ngbr": "R2"}, "g1": {"ngbr": "R3"}}},
            "R2": {"interfaces": {"g0": {"ngbr": "R1"}, "g1": {"ngbr": "R4", "relationship": "customer"}}},
            "R3": {"interfaces": {"g0": {"ngbr": "R1"}, "Loopback0": {"ngbr": ""}}}
        }},
        "2": {"igp": "RIP", "routers": {
            "R4": {"interfaces": {"g0": {"ngbr": "R2", "relationship": "provider"}}}
        }}
    }}"#;

    #[test]
    fn test_discovery_order_and_classification() {
        let inv = inventory(TRIANGLE);
        let links = discover_links(&inv).unwrap();

        assert_eq!(links.len(), 3);
        let intra: Vec<(&str, &str, &str, &str)> = links
            .intra
            .iter()
            .map(|l| {
                (
                    l.source.router.as_str(),
                    l.source.interface.as_str(),
                    l.target.router.as_str(),
                    l.target.interface.as_str(),
                )
            })
            .collect();
        assert_eq!(intra, vec![("R1", "g0", "R2", "g0"), ("R1", "g1", "R3", "g0")]);

        assert_eq!(links.inter.len(), 1);
        let ebgp = &links.inter[0];
        assert_eq!(ebgp.kind, LinkKind::InterAs);
        assert_eq!((ebgp.source.router.as_str(), ebgp.source.asn), ("R2", 1));
        assert_eq!((ebgp.target.router.as_str(), ebgp.target.asn), ("R4", 2));
    }

    #[test]
    fn test_each_pair_emitted_once() {
        let inv = inventory(TRIANGLE);
        let links = discover_links(&inv).unwrap();
        let mut pairs: Vec<(String, String)> = links
            .iter()
            .map(|l| {
                let mut pair = [l.source.router.clone(), l.target.router.clone()];
                pair.sort();
                (pair[0].clone(), pair[1].clone())
            })
            .collect();
        let total = pairs.len();
        pairs.dedup();
        assert_eq!(pairs.len(), total);
    }

    #[test]
    fn test_unknown_neighbors_are_skipped() {
        let inv = inventory(
            r#"{"AS": {"1": {"igp": "RIP", "routers": {"R1": {"interfaces": {"g0": {"ngbr": "R77"}}}}}}}"#,
        );
        assert!(discover_links(&inv).unwrap().is_empty());
    }

    #[test]
    fn test_missing_reverse_is_internal_error() {
        let inv = inventory(
            r#"{"AS": {"1": {"igp": "RIP", "routers": {
                "R1": {"interfaces": {"g0": {"ngbr": "R2"}}},
                "R2": {"interfaces": {"g0": {"ngbr": ""}}}
            }}}}"#,
        );
        let err = discover_links(&inv).unwrap_err();
        assert!(err.is_internal());
        assert!(matches!(err, CompileError::LinkInconsistency { .. }));
    }

    #[test]
    fn test_reverse_interface_lookup() {
        let inv = inventory(TRIANGLE);
        assert_eq!(find_reverse_interface(&inv, "R2", "R4"), Some("g0"));
        assert_eq!(find_reverse_interface(&inv, "R3", "R2"), None);
        assert!(reverse_interfaces(&inv, "R1", "R99").is_empty());
    }
}
