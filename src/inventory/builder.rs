//! Inventory construction from a raw intent.

use super::types::{AutonomousSystem, Igp, Interface, Inventory, Relationship, Router, RouterIndex};
use crate::errors::CompileError;
use crate::intent::{AsIntent, Intent, InterfaceIntent};
use ipnet::Ipv6Net;
use log::{debug, warn};
use std::collections::BTreeMap;

/// Parse an AS key into a positive AS number
fn parse_asn(key: &str) -> Result<u32, CompileError> {
    match key.trim().parse::<u32>() {
        Ok(asn) if asn > 0 => Ok(asn),
        _ => Err(CompileError::InvalidAsNumber(key.to_string())),
    }
}

fn build_interface(
    router: &str,
    name: &str,
    raw: &InterfaceIntent,
) -> Result<Interface, CompileError> {
    let ipv6 = match raw.ipv6.trim() {
        "" => None,
        value => Some(value.parse::<Ipv6Net>().map_err(|_| CompileError::InvalidAddress {
            router: router.to_string(),
            interface: name.to_string(),
            value: value.to_string(),
        })?),
    };

    // Unknown tags are rejected by the relationship validator, which reports
    // the interface; here they simply carry no relationship.
    let relationship = raw.relationship_tag().and_then(|tag| match tag.parse::<Relationship>() {
        Ok(rel) => Some(rel),
        Err(unknown) => {
            warn!("{}:{} carries unrecognised relationship '{}'", router, name, unknown);
            None
        }
    });

    Ok(Interface {
        name: name.to_string(),
        neighbor: raw.neighbor().map(str::to_string),
        relationship,
        ipv6,
    })
}

fn build_as(
    asn: u32,
    raw: &AsIntent,
    index: &mut RouterIndex,
) -> Result<AutonomousSystem, CompileError> {
    let igp = raw.igp.parse::<Igp>().map_err(CompileError::UnsupportedIgp)?;

    if raw.routers.is_empty() {
        return Err(CompileError::EmptyRouterSet(asn));
    }

    let mut as_obj = AutonomousSystem::new(asn, igp);
    for (router_name, router_raw) in &raw.routers {
        if router_raw.interfaces.is_empty() {
            return Err(CompileError::EmptyInterfaceSet {
                asn,
                router: router_name.clone(),
            });
        }

        index
            .insert(router_name, asn)
            .map_err(|first_asn| CompileError::RouterCollision {
                router: router_name.clone(),
                first_asn,
                second_asn: asn,
            })?;

        let interfaces = router_raw
            .interfaces
            .iter()
            .map(|(if_name, if_raw)| {
                build_interface(router_name, if_name, if_raw).map(|iface| (if_name.clone(), iface))
            })
            .collect::<Result<BTreeMap<_, _>, _>>()?;

        as_obj.routers.insert(
            router_name.clone(),
            Router {
                name: router_name.clone(),
                interfaces,
            },
        );
    }

    Ok(as_obj)
}

/// Build a typed [`Inventory`] from a raw intent.
///
/// ASes are visited in ascending numeric order and routers in ascending name
/// order, so the global router index is built in the order that address
/// allocation later relies on. Router names share one key space across all
/// ASes.
pub fn build(intent: &Intent) -> Result<Inventory, CompileError> {
    if intent.autonomous_systems.is_empty() {
        return Err(CompileError::EmptyAsSet);
    }

    let mut numbered: Vec<(u32, &AsIntent)> = Vec::with_capacity(intent.autonomous_systems.len());
    for (key, raw) in &intent.autonomous_systems {
        numbered.push((parse_asn(key)?, raw));
    }
    numbered.sort_by_key(|(asn, _)| *asn);

    let mut ases = BTreeMap::new();
    let mut router_to_as = RouterIndex::default();
    for (asn, raw) in numbered {
        if ases.contains_key(&asn) {
            return Err(CompileError::DuplicateAs(asn));
        }
        let as_obj = build_as(asn, raw, &mut router_to_as)?;
        debug!("AS {} ({}): {} routers", asn, as_obj.igp, as_obj.routers.len());
        ases.insert(asn, as_obj);
    }

    Ok(Inventory { ases, router_to_as })
}
