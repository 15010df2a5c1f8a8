//! Fleet configuration

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use super::serde_utils::optional_duration_secs;
use super::settings::{CaptureMode, Settings};

/// Configuration shared by every session in a fleet run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FleetConfig {
    /// User to log in as when a host has none of its own
    pub default_user: String,

    /// SSH port used when a host ID carries no port
    pub port: u16,

    /// Upper bound on a single connect attempt (unset: wait forever)
    #[serde(default, with = "optional_duration_secs")]
    pub connect_timeout: Option<Duration>,

    /// Directory holding per-host capture logs
    pub capture_dir: PathBuf,

    /// Behaviour toggles
    pub settings: Settings,
}

impl Default for FleetConfig {
    fn default() -> Self {
        Self {
            default_user: "root".to_string(),
            port: 22,
            connect_timeout: None,
            capture_dir: PathBuf::from("."),
            settings: Settings::default(),
        }
    }
}

impl FleetConfig {
    /// Capture mode implied by the current settings
    pub fn capture_mode(&self) -> CaptureMode {
        self.settings.capture_mode(self.capture_dir.clone())
    }
}
