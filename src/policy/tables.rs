//! Relationship-driven policy tables and the shared policy objects.

use crate::inventory::Relationship;
use crate::policy_config::PolicyConfig;

/// Community list matching routes that may be exported to anyone
pub const EXPORTABLE_COMMUNITY_LIST: &str = "COMM-CUST-OR-LOCAL";

/// Route-map tagging locally originated prefixes
pub const SET_LOCAL_ROUTE_MAP: &str = "RM-SET-LOCAL";

/// What a router may announce to a neighbor of a given role
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportPolicy {
    /// Every route
    PermitAll,
    /// Only customer-learned and locally originated routes
    CustomerOrLocalOnly,
}

/// Export rule toward a neighbor in `role`. Transit is only ever sold to
/// customers.
pub fn export_policy(role: Relationship) -> ExportPolicy {
    match role {
        Relationship::Customer => ExportPolicy::PermitAll,
        Relationship::Peer | Relationship::Provider => ExportPolicy::CustomerOrLocalOnly,
    }
}

fn role_tag(role: Relationship) -> String {
    role.as_str().to_uppercase()
}

/// Route-map applied to routes received from a neighbor in `role`
pub fn import_route_map(role: Relationship) -> String {
    format!("RM-IN-{}", role_tag(role))
}

/// Route-map applied to routes sent to a neighbor in `role`
pub fn export_route_map(role: Relationship) -> String {
    format!("RM-OUT-TO-{}", role_tag(role))
}

/// Global policy objects shared by every router of an AS: community lists,
/// the local-origin tagger, and one import and one export route-map per role.
pub fn policy_object_definitions(config: &PolicyConfig) -> Vec<String> {
    let mut lines = vec!["ip bgp-community new-format".to_string()];

    for community in [&config.communities.customer, &config.communities.local] {
        lines.push(format!(
            "ip community-list standard {} permit {}",
            EXPORTABLE_COMMUNITY_LIST, community
        ));
    }

    lines.push(format!("route-map {} permit 10", SET_LOCAL_ROUTE_MAP));
    lines.push(format!(" set community {} additive", config.communities.local));

    for role in Relationship::ALL {
        lines.push(format!("route-map {} permit 10", import_route_map(role)));
        lines.push(format!(" set community {} additive", config.community_for(role)));
        lines.push(format!(" set local-preference {}", config.local_preference_for(role)));
    }

    for role in Relationship::ALL {
        let route_map = export_route_map(role);
        match export_policy(role) {
            ExportPolicy::PermitAll => {
                lines.push(format!("route-map {} permit 10", route_map));
            }
            ExportPolicy::CustomerOrLocalOnly => {
                lines.push(format!("route-map {} permit 10", route_map));
                lines.push(format!(" match community {}", EXPORTABLE_COMMUNITY_LIST));
                lines.push(format!("route-map {} deny 100", route_map));
            }
        }
    }

    lines
}
