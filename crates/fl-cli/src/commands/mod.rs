//! CLI command implementations

mod exec;
mod ping;
mod pull;
mod push;

pub use exec::exec_command;
pub use ping::ping_command;
pub use pull::pull_command;
pub use push::push_command;

use fl_core::traits::Transport;
use fl_core::HostId;
use fl_orchestrator::{ConnectRequest, SessionRegistry};

use crate::output::print_error;

/// One connect request per host, all sharing the password and login user
pub(crate) fn connect_requests(
    hosts: &[HostId],
    password: &str,
    user: Option<&str>,
) -> Vec<ConnectRequest> {
    hosts
        .iter()
        .map(|host| {
            let request = ConnectRequest::new(host.clone(), password);
            match user {
                Some(user) => request.with_user(user),
                None => request,
            }
        })
        .collect()
}

/// Connect every host, reporting the ones that could not be reached
///
/// Returns the hosts that are connected afterwards, in the order given,
/// and whether all of them made it.
pub(crate) async fn connect_fleet<T: Transport>(
    registry: &SessionRegistry<T>,
    hosts: &[HostId],
    password: &str,
    user: Option<&str>,
) -> (Vec<HostId>, bool) {
    let requests = connect_requests(hosts, password, user);
    let all_connected = registry.connect_all(&requests).await;
    let connected: Vec<HostId> = hosts
        .iter()
        .filter(|host| registry.get(host).is_ok())
        .cloned()
        .collect();

    if !all_connected {
        for host in hosts.iter().filter(|h| !connected.contains(h)) {
            print_error(&format!("Could not connect to {}", host));
        }
    }
    (connected, all_connected)
}
