//! IGP process blocks (RIPng / OSPFv3).

use crate::inventory::{AutonomousSystem, Igp, Inventory, Router};
use crate::policy::router_id;

/// Interfaces that run the IGP: loopbacks and intra-AS links.
pub fn igp_interfaces<'a>(inv: &Inventory, as_obj: &AutonomousSystem, router: &'a Router) -> Vec<&'a str> {
    router
        .interfaces_loopback_first()
        .into_iter()
        .filter(|iface| {
            iface.is_loopback()
                || iface
                    .neighbor
                    .as_deref()
                    .and_then(|neighbor| inv.router_to_as.asn_of(neighbor))
                    == Some(as_obj.asn)
        })
        .filter(|iface| iface.ipv6.is_some())
        .map(|iface| iface.name.as_str())
        .collect()
}

/// Name of the RIPng process of an AS
pub fn rip_process_name(asn: u32) -> String {
    format!("AS{}", asn)
}

/// IGP process definition for `router`.
pub fn process_block(as_obj: &AutonomousSystem, router: &Router) -> Vec<String> {
    match as_obj.igp {
        Igp::Rip => vec![format!("ipv6 router rip {}", rip_process_name(as_obj.asn))],
        Igp::Ospf => vec![
            format!("ipv6 router ospf {}", as_obj.asn),
            format!(" router-id {}", router_id(&router.name)),
        ],
    }
}

/// Per-interface command enabling the IGP
pub fn interface_activation(as_obj: &AutonomousSystem) -> String {
    match as_obj.igp {
        Igp::Rip => format!("ipv6 rip {} enable", rip_process_name(as_obj.asn)),
        Igp::Ospf => format!("ipv6 ospf {} area 0", as_obj.asn),
    }
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

    #[test]
    fn test_igp_runs_on_loopback_and_internal_links_only() {
        let inv = addressed(
            r#"{"AS": {
                "10": {"igp": "RIP", "routers": {
                    "R1": {"interfaces": {"g0": {"ngbr": "R2"}, "g1": {"ngbr": "R3", "relationship": "peer"}, "g2": {"ngbr": ""}}},
                    "R2": {"interfaces": {"g0": {"ngbr": "R1"}}}
                }},
                "20": {"igp": "OSPF", "routers": {
                    "R3": {"interfaces": {"g0": {"ngbr": "R1", "relationship": "peer"}}}
                }}
            }}"#,
        );
        let as10 = &inv.ases[&10];
        let r1 = inv.router("R1").unwrap();
        assert_eq!(igp_interfaces(&inv, as10, r1), vec!["Loopback0", "g0"]);

        let as20 = &inv.ases[&20];
        let r3 = inv.router("R3").unwrap();
        assert_eq!(igp_interfaces(&inv, as20, r3), vec!["Loopback0"]);
    }

    #[test]
    fn test_process_blocks() {
        let inv = addressed(
            r#"{"AS": {
                "10": {"igp": "RIP", "routers": {"R1": {"interfaces": {"Loopback0": {}}}}},
                "20": {"igp": "OSPF", "routers": {"R4": {"interfaces": {"Loopback0": {}}}}}
            }}"#,
        );
        let as10 = &inv.ases[&10];
        assert_eq!(process_block(as10, inv.router("R1").unwrap()), vec!["ipv6 router rip AS10"]);
        assert_eq!(interface_activation(as10), "ipv6 rip AS10 enable");

        let as20 = &inv.ases[&20];
        assert_eq!(
            process_block(as20, inv.router("R4").unwrap()),
            vec!["ipv6 router ospf 20", " router-id 4.4.4.4"]
        );
        assert_eq!(interface_activation(as20), "ipv6 ospf 20 area 0");
    }
}
