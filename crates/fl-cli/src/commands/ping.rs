//! Ping command implementation

use fl_core::traits::Transport;
use fl_core::HostId;
use fl_orchestrator::SessionRegistry;

use super::connect_requests;
use crate::output::format_reachability;

/// Try to log in to every host and print which ones answered
///
/// Returns whether every host was reachable.
pub async fn ping_command<T: Transport>(
    registry: &SessionRegistry<T>,
    hosts: &[HostId],
    password: &str,
    user: Option<&str>,
) -> bool {
    let requests = connect_requests(hosts, password, user);
    let results = registry.connect_results(&requests).await;
    let rows: Vec<(HostId, bool)> = hosts.iter().cloned().zip(results).collect();

    println!("{}", format_reachability(&rows));
    rows.iter().all(|(_, ok)| *ok)
}
