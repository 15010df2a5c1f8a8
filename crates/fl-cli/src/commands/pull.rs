//! Pull command implementation

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use fl_core::traits::Transport;
use fl_core::HostId;
use fl_orchestrator::{PullJob, SessionRegistry};

use super::connect_fleet;
use crate::output::{print_error, print_success};

/// Copy a remote file or tree from every host
///
/// With more than one host each gets its own target so pulls never
/// collide: `<dest>/<host>/` normally, `<dest>.<host>` with `exact`.
pub async fn pull_command<T: Transport>(
    registry: &mut SessionRegistry<T>,
    hosts: &[HostId],
    password: &str,
    user: Option<&str>,
    source: &str,
    destination: &Path,
    exact: bool,
) -> Result<bool> {
    let (targets, all_connected) = connect_fleet(registry, hosts, password, user).await;
    if targets.is_empty() {
        return Ok(false);
    }

    let mut settings = registry.settings();
    settings.exact_pull_filename = exact;
    registry.set_settings(settings);

    let mut jobs = Vec::with_capacity(targets.len());
    for host in &targets {
        let target = pull_target(destination, host, exact, targets.len() > 1);
        let dir = if exact { target.parent() } else { Some(target.as_path()) };
        if let Some(dir) = dir.filter(|d| !d.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(dir)
                .await
                .with_context(|| format!("Failed to create {}", dir.display()))?;
        }
        jobs.push(PullJob::new(host.clone(), source, target));
    }

    if !registry.pull(&jobs).await {
        print_error("Pull failed on one or more hosts");
        return Ok(false);
    }
    print_success(&format!(
        "Pulled {} from {} host(s) into {}",
        source,
        targets.len(),
        destination.display()
    ));
    Ok(all_connected)
}

/// Local target for one host's pull
fn pull_target(destination: &Path, host: &HostId, exact: bool, many: bool) -> PathBuf {
    match (exact, many) {
        (_, false) => destination.to_path_buf(),
        (false, true) => destination.join(host.file_stem()),
        (true, true) => {
            let mut name = destination.as_os_str().to_os_string();
            name.push(".");
            name.push(host.file_stem());
            PathBuf::from(name)
        }
    }
}
