//! IPv6 address planning module.
//!
//! This module allocates point-to-point /64s for intra-AS and inter-AS links
//! and /128 loopbacks, and checks that every address the later stages rely
//! on has been assigned.

pub mod allocator;
pub mod as_manager;
pub mod registry;

// Re-export commonly used types
pub use allocator::{allocate, check_addresses};
pub use as_manager::{choose_ebgp_range, AsSubnetManager, SubnetCursor};
pub use registry::{PoolOwner, SubnetRegistry};
