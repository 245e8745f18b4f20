//! Error taxonomy for the topology and policy compiler.
//!
//! Every variant is fatal: the pipeline aborts at the point of detection and
//! never retries. Each variant carries the router, interface, neighbor or AS
//! needed to act on it without re-deriving pipeline state.

use ipnet::Ipv6Net;

/// Broad grouping of [`CompileError`] variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// The intent document is malformed.
    Structural,
    /// Neighbor references or link reciprocity are broken.
    Topology,
    /// Business relationships on inter-AS links are missing or inconsistent.
    Relationship,
    /// An address pool could not satisfy the request.
    Allocation,
    /// An internal invariant failed after a stage reported success.
    PostCondition,
}

/// Errors raised by the compiler pipeline
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CompileError {
    #[error("intent contains no autonomous systems")]
    EmptyAsSet,

    #[error("invalid AS number '{0}': expected a positive integer")]
    InvalidAsNumber(String),

    #[error("AS {0} is declared more than once")]
    DuplicateAs(u32),

    #[error("IGP '{0}' is not supported (expected RIP or OSPF)")]
    UnsupportedIgp(String),

    #[error("AS {0} has no routers")]
    EmptyRouterSet(u32),

    #[error("router {router} in AS {asn} has no interfaces")]
    EmptyInterfaceSet { asn: u32, router: String },

    #[error("router name '{router}' is used in both AS {first_asn} and AS {second_asn}")]
    RouterCollision {
        router: String,
        first_asn: u32,
        second_asn: u32,
    },

    #[error("{router}:{interface} has an invalid IPv6 address '{value}'")]
    InvalidAddress {
        router: String,
        interface: String,
        value: String,
    },

    #[error("{router}:{interface} names unknown neighbor '{neighbor}'")]
    UnknownNeighbor {
        router: String,
        interface: String,
        neighbor: String,
    },

    #[error("{router}:{interface} points to itself")]
    SelfLoop { router: String, interface: String },

    #[error("link is not reciprocal: {router}:{interface} -> {neighbor}, but no interface on {neighbor} points back")]
    NonReciprocalLink {
        router: String,
        interface: String,
        neighbor: String,
    },

    #[error("link is ambiguous: {router}:{interface} -> {neighbor}, but {count} interfaces on {neighbor} point back")]
    AmbiguousLink {
        router: String,
        interface: String,
        neighbor: String,
        count: usize,
    },

    #[error("invalid or missing relationship on {router}:{interface} (expected customer, provider or peer)")]
    InvalidRelationship { router: String, interface: String },

    #[error("inconsistent relationship across link {router}@{relationship} <-> {neighbor}@{other_relationship} (expected peer/peer or provider/customer)")]
    InconsistentRelationship {
        router: String,
        relationship: String,
        neighbor: String,
        other_relationship: String,
    },

    #[error("address pool {pool} ({range}) is exhausted")]
    AddressPoolExhausted { pool: String, range: Ipv6Net },

    #[error("loopback range {range} of AS {asn} has no host left")]
    LoopbackPoolExhausted { asn: u32, range: Ipv6Net },

    #[error("no /48 inside {superblock} is disjoint from every AS address range")]
    NoEbgpRangeAvailable { superblock: Ipv6Net },

    #[error("address range {range} of AS {asn} overlaps the range of AS {other_asn}")]
    OverlappingAddressRange {
        asn: u32,
        other_asn: u32,
        range: Ipv6Net,
    },

    #[error("{router}:{interface} has no IPv6 address after address planning")]
    MissingAddress { router: String, interface: String },

    #[error("reverse interface for {router}:{interface} -> {neighbor} vanished after validation")]
    LinkInconsistency {
        router: String,
        interface: String,
        neighbor: String,
    },

    #[error("subnet {subnet} allocated twice ({first} and {second})")]
    AddressConflict {
        subnet: Ipv6Net,
        first: String,
        second: String,
    },

    #[error("AS {0} is not part of the inventory")]
    UnknownAs(u32),
}

impl CompileError {
    /// Category this error belongs to.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::EmptyAsSet
            | Self::InvalidAsNumber(_)
            | Self::DuplicateAs(_)
            | Self::UnsupportedIgp(_)
            | Self::EmptyRouterSet(_)
            | Self::EmptyInterfaceSet { .. }
            | Self::RouterCollision { .. }
            | Self::InvalidAddress { .. } => ErrorCategory::Structural,
            Self::UnknownNeighbor { .. }
            | Self::SelfLoop { .. }
            | Self::NonReciprocalLink { .. }
            | Self::AmbiguousLink { .. } => ErrorCategory::Topology,
            Self::InvalidRelationship { .. } | Self::InconsistentRelationship { .. } => {
                ErrorCategory::Relationship
            }
            Self::AddressPoolExhausted { .. }
            | Self::LoopbackPoolExhausted { .. }
            | Self::NoEbgpRangeAvailable { .. }
            | Self::OverlappingAddressRange { .. } => ErrorCategory::Allocation,
            Self::MissingAddress { .. }
            | Self::LinkInconsistency { .. }
            | Self::AddressConflict { .. }
            | Self::UnknownAs(_) => ErrorCategory::PostCondition,
        }
    }

    /// True for errors that point at a pipeline bug rather than bad input.
    pub fn is_internal(&self) -> bool {
        self.category() == ErrorCategory::PostCondition
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categories() {
        assert_eq!(
            CompileError::UnsupportedIgp("ISIS".into()).category(),
            ErrorCategory::Structural
        );
        assert_eq!(
            CompileError::SelfLoop {
                router: "R1".into(),
                interface: "g0".into()
            }
            .category(),
            ErrorCategory::Topology
        );
        assert!(CompileError::MissingAddress {
            router: "R1".into(),
            interface: "Loopback0".into()
        }
        .is_internal());
        assert!(!CompileError::EmptyRouterSet(1).is_internal());
    }

    #[test]
    fn test_messages_name_the_offender() {
        let err = CompileError::InconsistentRelationship {
            router: "R2".into(),
            relationship: "customer".into(),
            neighbor: "R3".into(),
            other_relationship: "peer".into(),
        };
        assert!(err.to_string().contains("R2@customer <-> R3@peer"));

        let err = CompileError::UnsupportedIgp("ISIS".into());
        assert!(err.to_string().contains("ISIS"));
    }
}
