//! Push command implementation

use std::path::PathBuf;

use fl_core::traits::Transport;
use fl_core::HostId;
use fl_orchestrator::{PushJob, SessionRegistry};

use super::connect_fleet;
use crate::output::{print_error, print_success};

/// Copy local files into a directory on every host
pub async fn push_command<T: Transport>(
    registry: &SessionRegistry<T>,
    hosts: &[HostId],
    password: &str,
    user: Option<&str>,
    files: &[PathBuf],
    destination: &str,
    overwrite: bool,
) -> bool {
    let (targets, all_connected) = connect_fleet(registry, hosts, password, user).await;
    if targets.is_empty() {
        return false;
    }

    let jobs: Vec<PushJob> = targets
        .iter()
        .map(|host| PushJob::new(host.clone(), files.to_vec(), destination, overwrite))
        .collect();

    if !registry.push(&jobs).await {
        print_error("Push failed on one or more hosts");
        return false;
    }
    print_success(&format!(
        "Pushed {} file(s) to {} on {} host(s)",
        files.len(),
        destination,
        targets.len()
    ));
    all_connected
}
