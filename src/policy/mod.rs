//! BGP policy compilation.
//!
//! Derives iBGP full-mesh sessions, eBGP neighbors and relationship-aware
//! route-maps for every router of an AS.

pub mod bgp;
pub mod tables;

pub use bgp::{compile, ebgp_neighbors, ibgp_peers, router_id, EbgpNeighbor, RouterPolicy};
pub use tables::{export_policy, policy_object_definitions, ExportPolicy};
