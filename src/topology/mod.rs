//! Network topology module.
//!
//! This module validates neighbor references and link reciprocity, and
//! derives the classified link lists consumed by address planning.

pub mod links;
pub mod validation;

// Re-export key types and functions for easier access
pub use links::{discover_links, find_reverse_interface, DiscoveredLinks, Endpoint, Link, LinkKind};
pub use validation::validate;
