//! Router configuration assembly.
//!
//! Turns the addressed inventory and the compiled BGP policy into plain
//! configuration text. No validation happens here: the input has already
//! passed every pipeline check.

pub mod igp;

use crate::errors::CompileError;
use crate::inventory::{AutonomousSystem, Inventory, Router};
use crate::policy::{compile, RouterPolicy};
use crate::policy_config::PolicyConfig;
use std::collections::BTreeMap;

/// Stanza separator
const SEPARATOR: &str = "!";

fn push_block(lines: &mut Vec<String>, block: impl IntoIterator<Item = String>) {
    lines.extend(block);
    lines.push(SEPARATOR.to_string());
}

/// Render the full configuration of one router.
pub fn render_router_config(
    inv: &Inventory,
    as_obj: &AutonomousSystem,
    router: &Router,
    policy: &RouterPolicy,
) -> String {
    let mut lines: Vec<String> = Vec::new();

    push_block(
        &mut lines,
        [
            "enable".to_string(),
            "configure terminal".to_string(),
            format!("hostname {}", router.name),
            "ipv6 unicast-routing".to_string(),
        ],
    );

    let mut process = igp::process_block(as_obj, router);
    process.push("exit".to_string());
    push_block(&mut lines, process);

    let igp_enabled = igp::igp_interfaces(inv, as_obj, router);
    let activation = igp::interface_activation(as_obj);
    for iface in router.interfaces_loopback_first() {
        let Some(address) = iface.ipv6 else {
            continue;
        };
        let mut stanza = vec![
            format!("interface {}", iface.name),
            " ipv6 enable".to_string(),
            format!(" ipv6 address {}", address),
        ];
        if igp_enabled.contains(&iface.name.as_str()) {
            stanza.push(format!(" {}", activation));
        }
        stanza.push(" no shutdown".to_string());
        stanza.push("exit".to_string());
        push_block(&mut lines, stanza);
    }

    push_block(&mut lines, policy.global.iter().cloned());
    push_block(&mut lines, policy.bgp.iter().cloned());

    lines.push("end".to_string());
    lines.push("write memory".to_string());

    let mut text = lines.join("\n");
    text.push('\n');
    text
}

/// Render every router of `asn`, keyed by router name.
pub fn render_as(
    inv: &Inventory,
    asn: u32,
    config: &PolicyConfig,
) -> Result<BTreeMap<String, String>, CompileError> {
    let as_obj = inv.ases.get(&asn).ok_or(CompileError::UnknownAs(asn))?;
    let policies = compile(inv, asn, config)?;

    as_obj
        .routers
        .values()
        .map(|router| {
            let policy = policies
                .get(&router.name)
                .ok_or_else(|| CompileError::MissingAddress {
                    router: router.name.clone(),
                    interface: crate::inventory::LOOPBACK_INTERFACE.to_string(),
                })?;
            Ok((router.name.clone(), render_router_config(inv, as_obj, router, policy)))
        })
        .collect()
}
