//! Business relationship checks for inter-AS links.
//!
//! Relationships are authored by the user, so this check runs against the
//! raw intent before any address is filled in.

use crate::errors::CompileError;
use crate::intent::{Intent, RouterIntent};
use crate::inventory::Relationship;
use log::info;
use std::collections::HashMap;

/// Raw intent routers keyed by name, with the AS key that owns them, in
/// AS-ascending then router-ascending order.
fn routers_in_order(intent: &Intent) -> Vec<(&str, &str, &RouterIntent)> {
    let mut keys: Vec<&String> = intent.autonomous_systems.keys().collect();
    keys.sort_by_key(|key| (key.trim().parse::<u32>().unwrap_or(u32::MAX), key.as_str()));

    keys.into_iter()
        .flat_map(|key| {
            intent.autonomous_systems[key]
                .routers
                .iter()
                .map(move |(name, router)| (key.as_str(), name.as_str(), router))
        })
        .collect()
}

/// Relationship declared by `router` on its first interface facing
/// `neighbor`. Absent or unrecognised tags read as unknown.
fn declared_relationship(router: &RouterIntent, neighbor: &str) -> Option<Relationship> {
    router
        .interfaces
        .values()
        .find(|iface| iface.neighbor() == Some(neighbor))
        .and_then(|iface| iface.relationship_tag())
        .and_then(|tag| tag.parse().ok())
}

/// Check that every inter-AS interface carries a valid relationship and that
/// both sides of each inter-AS link agree.
///
/// Interfaces whose neighbor is unknown or in the same AS are ignored. When
/// the far side's tag is unknown the consistency check is skipped; that side
/// is rejected on its own turn.
pub fn validate_relationships(intent: &Intent) -> Result<(), CompileError> {
    let ordered = routers_in_order(intent);
    let lookup: HashMap<&str, (&str, &RouterIntent)> = ordered
        .iter()
        .map(|(asn, name, router)| (*name, (*asn, *router)))
        .collect();

    let mut checked = 0usize;
    for (asn, router_name, router) in &ordered {
        for (if_name, iface) in &router.interfaces {
            let Some(neighbor) = iface.neighbor() else {
                continue;
            };
            let Some((neighbor_asn, neighbor_router)) = lookup.get(neighbor) else {
                continue;
            };
            if neighbor_asn == asn {
                continue;
            }

            let relationship = iface
                .relationship_tag()
                .and_then(|tag| tag.parse::<Relationship>().ok())
                .ok_or_else(|| CompileError::InvalidRelationship {
                    router: router_name.to_string(),
                    interface: if_name.clone(),
                })?;

            if let Some(other) = declared_relationship(neighbor_router, router_name) {
                if !relationship.is_complementary(other) {
                    return Err(CompileError::InconsistentRelationship {
                        router: router_name.to_string(),
                        relationship: relationship.to_string(),
                        neighbor: neighbor.to_string(),
                        other_relationship: other.to_string(),
                    });
                }
            }
            checked += 1;
        }
    }

    info!("Relationships consistent on {} inter-AS interfaces", checked);
    Ok(())
}
