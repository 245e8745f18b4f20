//! # asnetgen - Intent compiler for multi-AS IPv6 networks
//!
//! This library turns a declarative description of autonomous systems,
//! routers and their links into a fully addressed topology and one
//! configuration file per router.
//!
//! ## Overview
//!
//! An intent file lists, per AS, the IGP to run and the routers with their
//! interfaces. Interfaces name their neighbor router and, across AS
//! boundaries, the business relationship the local router holds on that
//! link. Addresses may be left empty: the compiler fills them in
//! deterministically.
//!
//! ## Key Features
//!
//! - **Validation**: Structural checks, unknown neighbors, self loops, non
//!   reciprocal and ambiguous links
//! - **Relationships**: Customer/provider/peer tags must agree on both ends
//! - **Address Planning**: /64 per link, /128 per loopback, shared eBGP /48
//! - **IGP**: RIPng or OSPFv3 per AS, enabled on loopbacks and internal links
//! - **BGP**: iBGP full mesh over loopbacks, eBGP over link addresses, and
//!   Gao-Rexford style import/export route-maps
//! - **Reproducible**: The same intent always yields byte-identical output
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - `intent`: Serde model of the intent document
//! - `intent_loader`: Reading and writing intent files
//! - `inventory`: Typed, validated view of an intent
//! - `topology`: Link discovery and topology validation
//! - `relationships`: Relationship consistency across AS boundaries
//! - `ip`: Subnet pools, cursors and address allocation
//! - `policy_config`: Community and local-preference settings (YAML)
//! - `policy`: BGP session and route-map compilation
//! - `render`: Router configuration text
//! - `orchestrator`: End-to-end pipeline
//! - `errors`: The pipeline error type
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use asnetgen::orchestrator::{run, RunOptions};
//! use asnetgen::policy_config::PolicyConfig;
//!
//! let summary = run(&RunOptions {
//!     intent_path: "intent.json".into(),
//!     output_dir: "output".into(),
//!     filled_path: None,
//!     policy: PolicyConfig::default(),
//! })?;
//!
//! // intent_filled.json now holds every address, and
//! // output/AS<asn>/<router>_config.txt one file per router.
//! println!("{} configurations", summary.config_files.len());
//! # Ok::<(), color_eyre::eyre::Error>(())
//! ```
//!
//! ## Intent Format
//!
//! ```json
//! {"AS": {
//!   "65001": {"igp": "RIP", "routers": {
//!     "R1": {"interfaces": {"GigabitEthernet0/0": {"ngbr": "R2", "ipv6": ""}}},
//!     "R2": {"interfaces": {
//!       "GigabitEthernet0/0": {"ngbr": "R1", "ipv6": ""},
//!       "GigabitEthernet1/0": {"ngbr": "R3", "relationship": "provider", "ipv6": ""}
//!     }}
//!   }},
//!   "65002": {"igp": "OSPF", "routers": {
//!     "R3": {"interfaces": {
//!       "GigabitEthernet0/0": {"ngbr": "R2", "relationship": "customer", "ipv6": ""}
//!     }}
//!   }}
//! }}
//! ```
//!
//! ## Error Handling
//!
//! Pipeline stages return [`errors::CompileError`]. File handling and the
//! binary use `color_eyre` for error reporting with context.

pub mod errors;
pub mod intent;
pub mod intent_loader;
pub mod inventory;
pub mod ip;
pub mod orchestrator;
pub mod policy;
pub mod policy_config;
pub mod relationships;
pub mod render;
pub mod topology;
