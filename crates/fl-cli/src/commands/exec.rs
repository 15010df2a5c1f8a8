//! Exec command implementation

use anyhow::{Context, Result};

use fl_core::config::Settings;
use fl_core::traits::Transport;
use fl_core::HostId;
use fl_orchestrator::{CommandJob, SessionRegistry};

use super::connect_fleet;
use crate::output::{format_host_output, print_error, print_success};

/// Run one command on every host
///
/// Output is printed per host, or appended to per-host log files when
/// `log_to_file` is set. Returns whether the whole fleet succeeded.
pub async fn exec_command<T: Transport>(
    registry: &mut SessionRegistry<T>,
    hosts: &[HostId],
    password: &str,
    user: Option<&str>,
    command: &str,
    log_to_file: bool,
) -> Result<bool> {
    let (targets, all_connected) = connect_fleet(registry, hosts, password, user).await;
    if targets.is_empty() {
        return Ok(false);
    }

    registry.set_settings(Settings {
        capture_to_file: log_to_file,
        capture_to_memory: !log_to_file,
        ..registry.settings()
    });

    let jobs: Vec<CommandJob> = targets
        .iter()
        .map(|host| CommandJob::new(host.clone(), command))
        .collect();
    let outputs = registry.execute(&jobs).await;
    if outputs.is_empty() {
        print_error("Command failed on one or more hosts");
        return Ok(false);
    }

    if log_to_file {
        print_success(&format!(
            "Output of {} host(s) appended under {}",
            outputs.len(),
            registry.config().capture_dir.display()
        ));
        return Ok(all_connected);
    }

    for (host, chunks) in &outputs {
        print!("{}", format_host_output(host, chunks));

        let session = registry
            .get(host)
            .with_context(|| format!("Session for {} vanished during exec", host))?;
        let session = session.lock().await;
        if !session.diagnostics().is_empty() {
            eprint!("{}", format_host_output(host, session.diagnostics()));
        }
    }
    Ok(all_connected)
}
