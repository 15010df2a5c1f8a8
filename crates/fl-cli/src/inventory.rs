//! Host list resolution
//!
//! Hosts come from the command line, from an inventory file, or both.
//! An inventory file lists one host per line; blank lines and `#`
//! comments are ignored.

use anyhow::{bail, Context, Result};
use std::collections::HashSet;
use std::path::Path;

use fl_core::HostId;

/// Parse inventory file contents
pub fn parse_inventory(content: &str) -> Vec<HostId> {
    content
        .lines()
        .map(|line| match line.split_once('#') {
            Some((before, _)) => before.trim(),
            None => line.trim(),
        })
        .filter(|line| !line.is_empty())
        .map(HostId::from)
        .collect()
}

/// Merge command-line hosts with an optional inventory file
///
/// Order is preserved and duplicates are dropped. An empty result is an
/// error.
pub fn resolve_hosts(args: &[String], inventory: Option<&Path>) -> Result<Vec<HostId>> {
    let mut hosts: Vec<HostId> = args.iter().map(|h| HostId::from(h.as_str())).collect();

    if let Some(path) = inventory {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read inventory {}", path.display()))?;
        hosts.extend(parse_inventory(&content));
    }

    let mut seen = HashSet::new();
    hosts.retain(|host| seen.insert(host.clone()));

    if hosts.is_empty() {
        bail!("No hosts given; pass them as arguments or with --inventory");
    }
    Ok(hosts)
}
