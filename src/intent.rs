use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Raw network intent as authored by the user.
///
/// All maps are ordered so that serialising the same intent twice yields
/// byte-identical JSON.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Intent {
    #[serde(rename = "AS", default)]
    pub autonomous_systems: BTreeMap<String, AsIntent>,
}

/// One autonomous system entry, keyed by its AS number in [`Intent`]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AsIntent {
    #[serde(default)]
    pub igp: String,
    #[serde(default)]
    pub routers: BTreeMap<String, RouterIntent>,
    /// Written into the filled intent for inspection; re-derived on load.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address_range: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loopback_range: Option<String>,
}

/// Router entry
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RouterIntent {
    #[serde(default)]
    pub interfaces: BTreeMap<String, InterfaceIntent>,
}

/// Interface entry. An empty `ngbr` means the interface is not part of a link.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InterfaceIntent {
    #[serde(default)]
    pub ngbr: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relationship: Option<String>,
    #[serde(default)]
    pub ipv6: String,
}

impl InterfaceIntent {
    /// Trimmed neighbor name, `None` when the interface has no neighbor.
    pub fn neighbor(&self) -> Option<&str> {
        let ngbr = self.ngbr.trim();
        if ngbr.is_empty() {
            None
        } else {
            Some(ngbr)
        }
    }

    /// Trimmed relationship tag, `None` when absent or blank.
    pub fn relationship_tag(&self) -> Option<&str> {
        self.relationship
            .as_deref()
            .map(str::trim)
            .filter(|tag| !tag.is_empty())
    }
}

impl Intent {
    /// Total number of routers declared across all ASes
    pub fn router_count(&self) -> usize {
        self.autonomous_systems
            .values()
            .map(|as_intent| as_intent.routers.len())
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal_intent() {
        let json = r#"{
            "AS": {
                "65001": {
                    "igp": "ospf",
                    "routers": {
                        "R1": { "interfaces": { "g0/0": { "ngbr": "R2" } } },
                        "R2": { "interfaces": { "g0/0": { "ngbr": "R1" } } }
                    }
                }
            }
        }"#;

        let intent: Intent = serde_json::from_str(json).unwrap();
        let as_intent = &intent.autonomous_systems["65001"];
        assert_eq!(as_intent.igp, "ospf");
        assert_eq!(intent.router_count(), 2);

        let iface = &as_intent.routers["R1"].interfaces["g0/0"];
        assert_eq!(iface.neighbor(), Some("R2"));
        assert_eq!(iface.relationship_tag(), None);
        assert!(iface.ipv6.is_empty());
    }

    #[test]
    fn test_blank_fields_read_as_absent() {
        let iface = InterfaceIntent {
            ngbr: "  ".into(),
            relationship: Some(" ".into()),
            ipv6: String::new(),
        };
        assert_eq!(iface.neighbor(), None);
        assert_eq!(iface.relationship_tag(), None);
    }

    #[test]
    fn test_serialisation_skips_unset_ranges() {
        let mut intent = Intent::default();
        intent
            .autonomous_systems
            .insert("1".into(), AsIntent { igp: "RIP".into(), ..Default::default() });

        let json = serde_json::to_string(&intent).unwrap();
        assert!(json.contains("\"AS\""));
        assert!(!json.contains("address_range"));
    }
}
