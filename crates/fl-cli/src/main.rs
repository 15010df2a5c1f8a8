//! flock CLI
//!
//! Fleet operations over SSH:
//! - ping: check which hosts accept our credentials
//! - exec: run a command everywhere and collect the output
//! - push / pull: copy files to or from every host

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use fl_core::config::{self, FleetConfig};
use fl_core::HostId;
use fl_orchestrator::{SessionRegistry, SshTransport};
use flock::commands;
use flock::inventory::resolve_hosts;
use flock::output::{print_error, print_warning};

#[derive(Parser)]
#[command(name = "flock")]
#[command(author, version, about = "Run commands and copy files across a fleet of SSH hosts")]
#[command(propagate_version = true)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// File listing one host per line
    #[arg(short, long, global = true)]
    inventory: Option<PathBuf>,

    /// Give up on a connect attempt after this many seconds
    #[arg(long, global = true, value_name = "SECS")]
    timeout: Option<u64>,

    /// Enable verbose output
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Hosts and credentials shared by every subcommand
#[derive(Args)]
struct Fleet {
    /// Hosts to target (address or address:port)
    hosts: Vec<String>,

    /// Password for every host
    #[arg(short, long, env = "FLOCK_PASSWORD", hide_env_values = true)]
    password: String,

    /// Login user (overrides the configured default)
    #[arg(short, long)]
    user: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Check which hosts can be reached and logged in to
    Ping {
        #[command(flatten)]
        fleet: Fleet,
    },

    /// Run a command on every host
    Exec {
        #[command(flatten)]
        fleet: Fleet,
        /// Append output to per-host log files instead of printing it
        #[arg(long)]
        log_to_file: bool,
        /// Command to run, after `--`
        #[arg(last = true, required = true)]
        command: Vec<String>,
    },

    /// Copy local files into a directory on every host
    Push {
        #[command(flatten)]
        fleet: Fleet,
        /// Remote destination directory
        #[arg(short, long)]
        dest: String,
        /// Leave files that already exist remotely untouched
        #[arg(long)]
        no_overwrite: bool,
        /// Local files to copy
        #[arg(short, long = "file", required = true)]
        files: Vec<PathBuf>,
    },

    /// Copy a remote file or directory from every host
    Pull {
        #[command(flatten)]
        fleet: Fleet,
        /// Remote file or directory
        #[arg(short, long)]
        source: String,
        /// Local destination directory (or file, with --exact)
        #[arg(short, long)]
        dest: PathBuf,
        /// Treat --dest as the exact file to write
        #[arg(long)]
        exact: bool,
    },
}

impl Commands {
    fn fleet(&self) -> &Fleet {
        match self {
            Commands::Ping { fleet }
            | Commands::Exec { fleet, .. }
            | Commands::Push { fleet, .. }
            | Commands::Pull { fleet, .. } => fleet,
        }
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    let log_level = match (cli.quiet, cli.verbose) {
        (true, _) => "error",
        (false, 0) => "warn",
        (false, 1) => "info",
        (false, 2) => "debug",
        (false, _) => "trace",
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| log_level.into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let mut fleet_config = load_fleet_config(cli.config.as_deref())?;
    if let Some(secs) = cli.timeout {
        fleet_config.connect_timeout = (secs > 0).then(|| Duration::from_secs(secs));
    }

    let fleet = cli.command.fleet();
    let hosts = match resolve_hosts(&fleet.hosts, cli.inventory.as_deref()) {
        Ok(hosts) => hosts,
        Err(e) => {
            print_error(&e.to_string());
            return Ok(ExitCode::FAILURE);
        }
    };

    let mut registry = SessionRegistry::new(SshTransport::new(), fleet_config);

    let outcome = tokio::select! {
        outcome = run(&mut registry, &cli.command, &hosts) => outcome,
        _ = tokio::signal::ctrl_c() => {
            print_warning("Interrupted, closing connections");
            Ok(false)
        }
    };

    registry.shutdown().await;

    match outcome {
        Ok(true) => Ok(ExitCode::SUCCESS),
        Ok(false) => Ok(ExitCode::FAILURE),
        Err(e) => {
            print_error(&format!("{:#}", e));
            Ok(ExitCode::FAILURE)
        }
    }
}

async fn run(
    registry: &mut SessionRegistry<SshTransport>,
    command: &Commands,
    hosts: &[HostId],
) -> Result<bool> {
    match command {
        Commands::Ping { fleet } => Ok(commands::ping_command(
            registry,
            hosts,
            &fleet.password,
            fleet.user.as_deref(),
        )
        .await),

        Commands::Exec {
            fleet,
            log_to_file,
            command,
        } => {
            commands::exec_command(
                registry,
                hosts,
                &fleet.password,
                fleet.user.as_deref(),
                &command.join(" "),
                *log_to_file,
            )
            .await
        }

        Commands::Push {
            fleet,
            dest,
            no_overwrite,
            files,
        } => Ok(commands::push_command(
            registry,
            hosts,
            &fleet.password,
            fleet.user.as_deref(),
            files,
            dest,
            !no_overwrite,
        )
        .await),

        Commands::Pull {
            fleet,
            source,
            dest,
            exact,
        } => {
            commands::pull_command(
                registry,
                hosts,
                &fleet.password,
                fleet.user.as_deref(),
                source,
                dest,
                *exact,
            )
            .await
        }
    }
}

/// Load the fleet configuration
///
/// An explicit path must exist; the default location is optional.
fn load_fleet_config(path: Option<&Path>) -> Result<FleetConfig> {
    match path {
        Some(path) => config::load_config(path)
            .with_context(|| format!("Failed to load config from {}", path.display())),
        None => {
            let default_path = config::default_config_path();
            if default_path.exists() {
                config::load_config(&default_path).with_context(|| {
                    format!("Failed to load config from {}", default_path.display())
                })
            } else {
                Ok(FleetConfig::default())
            }
        }
    }
}
