//! Neighbor existence and link reciprocity checks.

use super::links::reverse_interfaces;
use crate::errors::CompileError;
use crate::inventory::Inventory;
use log::info;

/// Validate neighbor references and link reciprocity.
///
/// Runs two passes over the inventory in index order:
/// 1. every non-empty neighbor must name a known router other than the
///    interface's own router;
/// 2. exactly one interface on the neighbor must point back.
///
/// Existence is checked for the whole topology before reciprocity so that a
/// typo in a router name is reported as such rather than as a broken link.
pub fn validate(inv: Inventory) -> Result<Inventory, CompileError> {
    for (_, router) in inv.routers() {
        for iface in router.interfaces.values() {
            let Some(neighbor) = iface.neighbor.as_deref() else {
                continue;
            };
            if neighbor == router.name {
                return Err(CompileError::SelfLoop {
                    router: router.name.clone(),
                    interface: iface.name.clone(),
                });
            }
            if !inv.router_to_as.contains(neighbor) {
                return Err(CompileError::UnknownNeighbor {
                    router: router.name.clone(),
                    interface: iface.name.clone(),
                    neighbor: neighbor.to_string(),
                });
            }
        }
    }

    for (_, router) in inv.routers() {
        for iface in router.interfaces.values() {
            let Some(neighbor) = iface.neighbor.as_deref() else {
                continue;
            };
            match reverse_interfaces(&inv, &router.name, neighbor).len() {
                1 => {}
                0 => {
                    return Err(CompileError::NonReciprocalLink {
                        router: router.name.clone(),
                        interface: iface.name.clone(),
                        neighbor: neighbor.to_string(),
                    })
                }
                count => {
                    return Err(CompileError::AmbiguousLink {
                        router: router.name.clone(),
                        interface: iface.name.clone(),
                        neighbor: neighbor.to_string(),
                        count,
                    })
                }
            }
        }
    }

    info!(
        "Topology valid: {} ASes, {} routers",
        inv.ases.len(),
        inv.router_to_as.len()
    );
    Ok(inv)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intent::Intent;
    use crate::inventory::build;

    fn check(json: &str) -> Result<Inventory, CompileError> {
        let intent: Intent = serde_json::from_str(json).unwrap();
        validate(build(&intent)?)
    }

    #[test]
    fn test_valid_pair() {
        let inv = check(
            r#"{"AS": {"1": {"igp": "RIP", "routers": {
                "R1": {"interfaces": {"g0": {"ngbr": "R2"}, "Loopback0": {"ngbr": ""}}},
                "R2": {"interfaces": {"g0": {"ngbr": "R1"}}}
            }}}}"#,
        );
        assert!(inv.is_ok());
    }

    #[test]
    fn test_unknown_neighbor() {
        let err = check(
            r#"{"AS": {"1": {"igp": "RIP", "routers": {
                "R1": {"interfaces": {"g0": {"ngbr": "R9"}}}
            }}}}"#,
        )
        .unwrap_err();
        assert_eq!(
            err,
            CompileError::UnknownNeighbor {
                router: "R1".into(),
                interface: "g0".into(),
                neighbor: "R9".into()
            }
        );
    }

    #[test]
    fn test_unknown_neighbor_reported_before_reciprocity() {
        // R1 -> R2 is non-reciprocal, but R2 -> R9 names an unknown router.
        let err = check(
            r#"{"AS": {"1": {"igp": "RIP", "routers": {
                "R1": {"interfaces": {"g0": {"ngbr": "R2"}}},
                "R2": {"interfaces": {"g0": {"ngbr": "R9"}}}
            }}}}"#,
        )
        .unwrap_err();
        assert!(matches!(err, CompileError::UnknownNeighbor { .. }));
    }

    #[test]
    fn test_self_loop() {
        let err = check(
            r#"{"AS": {"1": {"igp": "RIP", "routers": {
                "R1": {"interfaces": {"g0": {"ngbr": "R1"}}}
            }}}}"#,
        )
        .unwrap_err();
        assert!(matches!(err, CompileError::SelfLoop { .. }));
    }

    #[test]
    fn test_non_reciprocal_link() {
        let err = check(
            r#"{"AS": {"1": {"igp": "RIP", "routers": {
                "R1": {"interfaces": {"g0": {"ngbr": "R2"}}},
                "R2": {"interfaces": {"g0": {"ngbr": ""}}}
            }}}}"#,
        )
        .unwrap_err();
        assert_eq!(
            err,
            CompileError::NonReciprocalLink {
                router: "R1".into(),
                interface: "g0".into(),
                neighbor: "R2".into()
            }
        );
    }

    #[test]
    fn test_ambiguous_link() {
        let err = check(
            r#"{"AS": {"1": {"igp": "RIP", "routers": {
                "R1": {"interfaces": {"g0": {"ngbr": "R2"}}},
                "R2": {"interfaces": {"g0": {"ngbr": "R1"}, "g1": {"ngbr": "R1"}}}
            }}}}"#,
        )
        .unwrap_err();
        assert!(matches!(err, CompileError::AmbiguousLink { count: 2, ref router, .. } if router == "R1"));
    }

    #[test]
    fn test_inter_as_reciprocity() {
        let err = check(
            r#"{"AS": {
                "1": {"igp": "RIP", "routers": {"R1": {"interfaces": {"g0": {"ngbr": "R2", "relationship": "peer"}}}}},
                "2": {"igp": "OSPF", "routers": {"R2": {"interfaces": {"g0": {"ngbr": "R3"}}}, "R3": {"interfaces": {"g0": {"ngbr": "R2"}}}}}
            }}"#,
        )
        .unwrap_err();
        assert!(matches!(err, CompileError::NonReciprocalLink { ref router, .. } if router == "R1"));
    }
}
