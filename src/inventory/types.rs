//! Typed inventory entities.
//!
//! These replace the raw, string-keyed intent with closed enumerations and
//! owned records. An [`Inventory`] is only ever produced by
//! [`build`](super::build), which enforces the structural invariants.

use crate::intent::{AsIntent, Intent, InterfaceIntent, RouterIntent};
use ipnet::Ipv6Net;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::net::Ipv6Addr;
use std::str::FromStr;

/// Name of the per-router loopback interface
pub const LOOPBACK_INTERFACE: &str = "Loopback0";

/// Interior gateway protocol run inside an AS
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Igp {
    Rip,
    Ospf,
}

impl FromStr for Igp {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "RIP" => Ok(Igp::Rip),
            "OSPF" => Ok(Igp::Ospf),
            other => Err(other.to_string()),
        }
    }
}

impl fmt::Display for Igp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Igp::Rip => write!(f, "RIP"),
            Igp::Ospf => write!(f, "OSPF"),
        }
    }
}

/// Business role of the local router on an inter-AS link.
///
/// `Customer` on R's interface means R buys transit from the neighbor; the
/// neighbor's role toward R is always [`Relationship::complement`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Relationship {
    Customer,
    Provider,
    Peer,
}

impl Relationship {
    pub const ALL: [Relationship; 3] = [
        Relationship::Customer,
        Relationship::Peer,
        Relationship::Provider,
    ];

    /// Role the other side of the link must declare.
    pub fn complement(self) -> Relationship {
        match self {
            Relationship::Customer => Relationship::Provider,
            Relationship::Provider => Relationship::Customer,
            Relationship::Peer => Relationship::Peer,
        }
    }

    /// Whether `self` and `other` may face each other across one link
    pub fn is_complementary(self, other: Relationship) -> bool {
        self.complement() == other
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Relationship::Customer => "customer",
            Relationship::Provider => "provider",
            Relationship::Peer => "peer",
        }
    }
}

impl FromStr for Relationship {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "customer" => Ok(Relationship::Customer),
            "provider" => Ok(Relationship::Provider),
            "peer" => Ok(Relationship::Peer),
            other => Err(other.to_string()),
        }
    }
}

impl fmt::Display for Relationship {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Router interface
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interface {
    pub name: String,
    pub neighbor: Option<String>,
    pub relationship: Option<Relationship>,
    pub ipv6: Option<Ipv6Net>,
}

impl Interface {
    /// Interface with no neighbor and no address.
    pub fn unlinked(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            neighbor: None,
            relationship: None,
            ipv6: None,
        }
    }

    pub fn is_loopback(&self) -> bool {
        self.name.to_lowercase().starts_with("loopback")
    }

    /// Host part of the assigned address
    pub fn address(&self) -> Option<Ipv6Addr> {
        self.ipv6.map(|net| net.addr())
    }
}

/// Router owned by exactly one AS
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Router {
    pub name: String,
    pub interfaces: BTreeMap<String, Interface>,
}

impl Router {
    /// Address of `Loopback0`, if assigned
    pub fn loopback(&self) -> Option<Ipv6Addr> {
        self.interfaces
            .get(LOOPBACK_INTERFACE)
            .and_then(Interface::address)
    }

    /// Loopback interfaces first, then the rest in name order.
    pub fn interfaces_loopback_first(&self) -> Vec<&Interface> {
        let mut ordered: Vec<&Interface> = self.interfaces.values().collect();
        ordered.sort_by_key(|iface| !iface.is_loopback());
        ordered
    }
}

/// Autonomous system with its derived address ranges
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AutonomousSystem {
    pub asn: u32,
    pub igp: Igp,
    pub address_range: Ipv6Net,
    pub loopback_range: Ipv6Net,
    pub routers: BTreeMap<String, Router>,
}

/// Writes the decimal digits of `value` into a hextet, so 233 becomes 0x233.
fn decimal_as_hextet(value: u8) -> u16 {
    let value = u16::from(value);
    (value / 100) * 0x100 + (value / 10 % 10) * 0x10 + value % 10
}

/// `2001:db8:<asn mod 256>::/48`
pub fn as_address_range(asn: u32) -> Ipv6Net {
    let hextet = decimal_as_hextet((asn % 256) as u8);
    Ipv6Net::new_assert(Ipv6Addr::new(0x2001, 0xdb8, hextet, 0, 0, 0, 0, 0), 48)
}

/// `2001:db8:<asn mod 256>:ffff::/64`
pub fn as_loopback_range(asn: u32) -> Ipv6Net {
    let hextet = decimal_as_hextet((asn % 256) as u8);
    Ipv6Net::new_assert(Ipv6Addr::new(0x2001, 0xdb8, hextet, 0xffff, 0, 0, 0, 0), 64)
}

impl AutonomousSystem {
    pub fn new(asn: u32, igp: Igp) -> Self {
        Self {
            asn,
            igp,
            address_range: as_address_range(asn),
            loopback_range: as_loopback_range(asn),
            routers: BTreeMap::new(),
        }
    }
}

/// Global `router -> asn` index.
///
/// Iteration follows insertion order, which [`build`](super::build) fixes to
/// AS-ascending, router-ascending. Address allocation consumes links in this
/// order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouterIndex {
    order: Vec<(String, u32)>,
    lookup: HashMap<String, u32>,
}

impl RouterIndex {
    /// Record `router` under `asn`; returns the previous owner on collision.
    pub fn insert(&mut self, router: &str, asn: u32) -> Result<(), u32> {
        if let Some(existing) = self.lookup.get(router) {
            return Err(*existing);
        }
        self.lookup.insert(router.to_string(), asn);
        self.order.push((router.to_string(), asn));
        Ok(())
    }

    pub fn asn_of(&self, router: &str) -> Option<u32> {
        self.lookup.get(router).copied()
    }

    pub fn contains(&self, router: &str) -> bool {
        self.lookup.contains_key(router)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// `(router, asn)` pairs in index order
    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> {
        self.order.iter().map(|(name, asn)| (name.as_str(), *asn))
    }
}

/// Validated, typed view of an intent
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inventory {
    pub ases: BTreeMap<u32, AutonomousSystem>,
    pub router_to_as: RouterIndex,
}

impl Inventory {
    pub fn router(&self, name: &str) -> Option<&Router> {
        let asn = self.router_to_as.asn_of(name)?;
        self.ases.get(&asn)?.routers.get(name)
    }

    pub(crate) fn router_mut(&mut self, name: &str) -> Option<&mut Router> {
        let asn = self.router_to_as.asn_of(name)?;
        self.ases.get_mut(&asn)?.routers.get_mut(name)
    }

    pub(crate) fn interface_mut(&mut self, router: &str, interface: &str) -> Option<&mut Interface> {
        self.router_mut(router)?.interfaces.get_mut(interface)
    }

    /// Every router in index order, together with its owning AS.
    pub fn routers(&self) -> impl Iterator<Item = (&AutonomousSystem, &Router)> {
        self.router_to_as.iter().filter_map(move |(name, asn)| {
            let as_obj = self.ases.get(&asn)?;
            as_obj.routers.get(name).map(|router| (as_obj, router))
        })
    }

    /// Convert back to the raw intent schema, including derived ranges and
    /// any assigned addresses.
    pub fn to_intent(&self) -> Intent {
        let autonomous_systems = self
            .ases
            .values()
            .map(|as_obj| {
                let routers = as_obj
                    .routers
                    .values()
                    .map(|router| {
                        let interfaces = router
                            .interfaces
                            .values()
                            .map(|iface| {
                                let raw = InterfaceIntent {
                                    ngbr: iface.neighbor.clone().unwrap_or_default(),
                                    relationship: iface.relationship.map(|rel| rel.to_string()),
                                    ipv6: iface.ipv6.map(|net| net.to_string()).unwrap_or_default(),
                                };
                                (iface.name.clone(), raw)
                            })
                            .collect();
                        (router.name.clone(), RouterIntent { interfaces })
                    })
                    .collect();

                let raw = AsIntent {
                    igp: as_obj.igp.to_string(),
                    routers,
                    address_range: Some(as_obj.address_range.to_string()),
                    loopback_range: Some(as_obj.loopback_range.to_string()),
                };
                (as_obj.asn.to_string(), raw)
            })
            .collect();

        Intent { autonomous_systems }
    }
}
