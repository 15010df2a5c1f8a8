//! Behaviour toggles read by every session operation

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Process-wide switches, set once before the fleet is used
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Append command output to a per-host log file
    pub capture_to_file: bool,

    /// Keep command output in the session's in-memory buffer
    pub capture_to_memory: bool,

    /// When pulling, write to the destination path itself instead of
    /// deriving a name from the remote file
    pub exact_pull_filename: bool,
}

/// Where a session puts the output of a command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureMode {
    /// Output is drained and discarded
    None,
    /// Output is appended to `stdout_<host>` inside this directory
    File(PathBuf),
    /// Output replaces the session's capture buffer
    Memory,
}

impl CaptureMode {
    /// Whether output needs to be read from the channel at all
    pub fn is_capturing(&self) -> bool {
        !matches!(self, CaptureMode::None)
    }
}

impl Settings {
    /// Resolve the capture mode; file capture wins when both are enabled
    pub fn capture_mode(&self, capture_dir: impl Into<PathBuf>) -> CaptureMode {
        if self.capture_to_file {
            CaptureMode::File(capture_dir.into())
        } else if self.capture_to_memory {
            CaptureMode::Memory
        } else {
            CaptureMode::None
        }
    }
}
