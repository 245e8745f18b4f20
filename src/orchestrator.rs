//! Pipeline orchestrator.
//!
//! This module coordinates the overall compilation process, managing the
//! flow from intent validation through address planning to per-router
//! configuration files. Every stage rebuilds the inventory from an intent
//! document rather than sharing a mutable one.

use crate::errors::CompileError;
use crate::intent::Intent;
use crate::intent_loader::{filled_intent_path, load_intent, save_intent};
use crate::inventory::{build, Inventory};
use crate::ip::{allocate, check_addresses};
use crate::policy_config::PolicyConfig;
use crate::relationships::validate_relationships;
use crate::render::render_as;
use crate::topology::validate;
use color_eyre::eyre::WrapErr;
use color_eyre::Result;
use log::info;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Result of compiling an intent in memory
#[derive(Debug, Clone, PartialEq)]
pub struct Compilation {
    /// Intent with every address filled in
    pub filled: Intent,
    /// Rendered configuration per AS, then per router
    pub configs: BTreeMap<u32, BTreeMap<String, String>>,
}

impl Compilation {
    pub fn router_count(&self) -> usize {
        self.configs.values().map(BTreeMap::len).sum()
    }
}

/// Validate the raw intent and fill in every address.
pub fn fill_addresses(intent: &Intent) -> Result<Intent, CompileError> {
    let inventory = validate(build(intent)?)?;
    info!("loading intent: done");

    validate_relationships(intent)?;
    info!("checking relationships: done");

    let filled = allocate(inventory)?;
    info!("filling IPv6 addresses: done");
    Ok(filled.to_intent())
}

/// Rebuild the inventory from a filled intent and confirm that it is
/// complete.
pub fn load_filled(filled: &Intent) -> Result<Inventory, CompileError> {
    let inventory = validate(build(filled)?)?;
    check_addresses(&inventory)?;
    info!("all interfaces addressed and reciprocal: done");
    Ok(inventory)
}

/// Render every router of a filled intent.
pub fn render_configs(
    filled: &Intent,
    policy: &PolicyConfig,
) -> Result<BTreeMap<u32, BTreeMap<String, String>>, CompileError> {
    let inventory = build(filled)?;
    let mut configs = BTreeMap::new();
    for asn in inventory.ases.keys() {
        configs.insert(*asn, render_as(&inventory, *asn, policy)?);
    }
    info!("configurations generated: done");
    Ok(configs)
}

/// Run the whole pipeline in memory.
pub fn compile_intent(intent: &Intent, policy: &PolicyConfig) -> Result<Compilation, CompileError> {
    let filled = fill_addresses(intent)?;
    load_filled(&filled)?;
    let configs = render_configs(&filled, policy)?;
    Ok(Compilation { filled, configs })
}

/// Options for a full on-disk run
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub intent_path: PathBuf,
    pub output_dir: PathBuf,
    /// Where to write the filled intent; defaults to `<intent>_filled.json`
    pub filled_path: Option<PathBuf>,
    pub policy: PolicyConfig,
}

/// What a run produced
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub filled_path: PathBuf,
    pub config_files: Vec<PathBuf>,
}

/// Directory holding the configuration files of one AS
pub fn as_output_dir(output_dir: &Path, asn: u32) -> PathBuf {
    output_dir.join(format!("AS{}", asn))
}

/// Configuration file of one router
pub fn router_config_path(output_dir: &Path, asn: u32, router: &str) -> PathBuf {
    as_output_dir(output_dir, asn).join(format!("{}_config.txt", router))
}

/// Load the intent, persist the filled intent, and write one configuration
/// file per router.
///
/// Configuration files are only written once every router has rendered, so a
/// failing run leaves no partial configuration tree behind.
pub fn run(options: &RunOptions) -> Result<RunSummary> {
    let intent = load_intent(&options.intent_path)?;

    let filled = fill_addresses(&intent)?;
    let filled_path = options
        .filled_path
        .clone()
        .unwrap_or_else(|| filled_intent_path(&options.intent_path));
    save_intent(&filled, &filled_path)?;

    // Continue from what was written to disk, not from memory.
    let filled = load_intent(&filled_path)?;
    load_filled(&filled)?;
    let configs = render_configs(&filled, &options.policy)?;

    let mut config_files = Vec::new();
    for (asn, routers) in &configs {
        let as_dir = as_output_dir(&options.output_dir, *asn);
        fs::create_dir_all(&as_dir)
            .wrap_err_with(|| format!("Failed to create output directory '{}'", as_dir.display()))?;

        for (router, text) in routers {
            let path = router_config_path(&options.output_dir, *asn, router);
            fs::write(&path, text)
                .wrap_err_with(|| format!("Failed to write configuration '{}'", path.display()))?;
            config_files.push(path);
        }
    }

    info!(
        "Wrote {} router configurations under {:?}",
        config_files.len(),
        options.output_dir
    );
    Ok(RunSummary {
        filled_path,
        config_files,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCENARIO: &str = r#"{"AS": {
        "65001": {"igp": "RIP", "routers": {
            "R1": {"interfaces": {"g0": {"ngbr": "R2"}}},
            "R2": {"interfaces": {"g0": {"ngbr": "R1"}, "g1": {"ngbr": "R3", "relationship": "provider"}}}
        }},
        "65002": {"igp": "OSPF", "routers": {
            "R3": {"interfaces": {"g0": {"ngbr": "R2", "relationship": "customer"}}}
        }}
    }}"#;

    #[test]
    fn test_compile_intent() {
        let intent: Intent = serde_json::from_str(SCENARIO).unwrap();
        let compilation = compile_intent(&intent, &PolicyConfig::default()).unwrap();

        assert_eq!(compilation.router_count(), 3);
        assert!(compilation.configs[&65001]["R1"].contains("ipv6 router rip AS65001"));
        assert!(compilation.configs[&65002]["R3"].contains("ipv6 router ospf 65002"));

        let filled = &compilation.filled.autonomous_systems["65001"];
        assert_eq!(filled.routers["R1"].interfaces["g0"].ipv6, "2001:db8:233::1/64");
        assert_eq!(filled.routers["R1"].interfaces["Loopback0"].ipv6, "2001:db8:233:ffff::1/128");
    }

    #[test]
    fn test_relationship_errors_stop_before_allocation() {
        let intent: Intent = serde_json::from_str(&SCENARIO.replace("\"customer\"", "\"peer\"")).unwrap();
        let err = compile_intent(&intent, &PolicyConfig::default()).unwrap_err();
        assert!(matches!(err, CompileError::InconsistentRelationship { .. }));
    }

    #[test]
    fn test_output_paths() {
        let out = Path::new("/tmp/out");
        assert_eq!(as_output_dir(out, 65001), PathBuf::from("/tmp/out/AS65001"));
        assert_eq!(
            router_config_path(out, 65001, "R1"),
            PathBuf::from("/tmp/out/AS65001/R1_config.txt")
        );
    }
}
