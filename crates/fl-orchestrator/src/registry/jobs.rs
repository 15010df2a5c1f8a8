//! Per-host job descriptions for fleet-wide calls

use std::fmt;
use std::path::PathBuf;

use fl_core::HostId;

/// Credentials for connecting one host
#[derive(Clone)]
pub struct ConnectRequest {
    pub host: HostId,
    /// Login user; the fleet default when `None`
    pub user: Option<String>,
    pub password: String,
}

impl ConnectRequest {
    pub fn new(host: impl Into<HostId>, password: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            user: None,
            password: password.into(),
        }
    }

    /// Log in as `user` instead of the fleet default
    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }
}

impl fmt::Debug for ConnectRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectRequest")
            .field("host", &self.host)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// A command to run on one host
#[derive(Debug, Clone)]
pub struct CommandJob {
    pub host: HostId,
    pub command: String,
}

impl CommandJob {
    pub fn new(host: impl Into<HostId>, command: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            command: command.into(),
        }
    }
}

/// Local files to copy into a remote directory on one host
#[derive(Debug, Clone)]
pub struct PushJob {
    pub host: HostId,
    /// Local files, transferred in order
    pub sources: Vec<PathBuf>,
    /// Remote destination directory
    pub destination: String,
    /// Replace files that already exist remotely
    pub overwrite: bool,
}

impl PushJob {
    pub fn new(
        host: impl Into<HostId>,
        sources: Vec<PathBuf>,
        destination: impl Into<String>,
        overwrite: bool,
    ) -> Self {
        Self {
            host: host.into(),
            sources,
            destination: destination.into(),
            overwrite,
        }
    }
}

/// A remote file or tree to copy down from one host
#[derive(Debug, Clone)]
pub struct PullJob {
    pub host: HostId,
    /// Remote file or directory
    pub source: String,
    /// Local directory, or the target file itself when exact pull
    /// filenames are enabled
    pub destination: PathBuf,
}

impl PullJob {
    pub fn new(host: impl Into<HostId>, source: impl Into<String>, destination: impl Into<PathBuf>) -> Self {
        Self {
            host: host.into(),
            source: source.into(),
            destination: destination.into(),
        }
    }
}
