//! Typed inventory model.
//!
//! This module turns the raw JSON intent into owned, typed entities
//! (autonomous systems, routers, interfaces) and the global router index
//! that fixes traversal order for every later stage.

pub mod builder;
pub mod types;

// Re-export commonly used types
pub use builder::build;
pub use types::{
    as_address_range, as_loopback_range, AutonomousSystem, Igp, Interface, Inventory,
    Relationship, Router, RouterIndex, LOOPBACK_INTERFACE,
};
