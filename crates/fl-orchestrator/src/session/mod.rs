//! Per-host session
//!
//! A [`Session`] is the unit of work for one host: it holds the
//! credentials, the live connection (if any) and the output captured from
//! the last command. Sessions are owned by the registry and driven one
//! operation at a time.

mod capture;
mod transfer;

pub use capture::CAPTURE_CHUNK_SIZE;
pub use transfer::TransferStats;

use bytes::Bytes;
use tracing::{debug, error, info, warn};

use fl_core::config::{CaptureMode, FleetConfig};
use fl_core::error::{ConnectionError, SessionError};
use fl_core::traits::{Connection, ExecChannel, ExecEvent, Transport};
use fl_core::types::ConnectionStatus;
use fl_core::{HostId, HostTarget};

/// Connection state and captured output for one host
pub struct Session<C: Connection> {
    host: HostId,
    user: Option<String>,
    password: String,
    /// `Some` exactly while the session is connected
    connection: Option<C>,
    output: Vec<Bytes>,
    diagnostics: Vec<Bytes>,
    last_exit_status: Option<u32>,
}

impl<C: Connection> Session<C> {
    /// Create a disconnected session
    ///
    /// `user` falls back to the fleet's default user at connect time.
    pub fn new(host: HostId, user: Option<String>, password: impl Into<String>) -> Self {
        Self {
            host,
            user,
            password: password.into(),
            connection: None,
            output: Vec::new(),
            diagnostics: Vec::new(),
            last_exit_status: None,
        }
    }

    /// Host this session talks to
    pub fn host(&self) -> &HostId {
        &self.host
    }

    /// Explicit login user, if one was given
    pub fn user(&self) -> Option<&str> {
        self.user.as_deref()
    }

    pub fn status(&self) -> ConnectionStatus {
        if self.connection.is_some() {
            ConnectionStatus::Connected
        } else {
            ConnectionStatus::Disconnected
        }
    }

    pub fn is_connected(&self) -> bool {
        self.connection.is_some()
    }

    /// Primary output of the last captured command, in 256-byte chunks
    pub fn output(&self) -> &[Bytes] {
        &self.output
    }

    /// Diagnostic output of the last captured command
    pub fn diagnostics(&self) -> &[Bytes] {
        &self.diagnostics
    }

    /// Exit status reported by the last command, if the remote sent one
    pub fn last_exit_status(&self) -> Option<u32> {
        self.last_exit_status
    }

    /// Drop any captured output
    pub fn clear_output(&mut self) {
        self.output.clear();
        self.diagnostics.clear();
    }

    /// Open and authenticate the connection
    pub async fn connect<T>(&mut self, transport: &T, config: &FleetConfig) -> Result<(), SessionError>
    where
        T: Transport<Conn = C>,
    {
        if self.connection.is_some() {
            return Err(SessionError::AlreadyConnected(self.host.to_string()));
        }

        let user = self
            .user
            .clone()
            .unwrap_or_else(|| config.default_user.clone());
        let target = HostTarget::new(self.host.clone(), config.port, user, self.password.clone());
        debug!("Connecting to {}:{} as {}", target.address, target.port, target.user);

        let connecting = transport.connect(&target);
        let result = match config.connect_timeout {
            Some(limit) => match tokio::time::timeout(limit, connecting).await {
                Ok(result) => result,
                Err(_) => Err(ConnectionError::Timeout(self.host.to_string())),
            },
            None => connecting.await,
        };

        match result {
            Ok(connection) => {
                self.connection = Some(connection);
                info!("Connected to {}", self.host);
                Ok(())
            }
            Err(e) => {
                error!("Failed to connect to {}: {}", self.host, e);
                Err(e.into())
            }
        }
    }

    /// Close the connection; a no-op when already disconnected
    pub async fn disconnect(&mut self) {
        let Some(connection) = self.connection.take() else {
            return;
        };
        match connection.disconnect().await {
            Ok(()) => info!("Disconnected from {}", self.host),
            Err(e) => warn!("Error while disconnecting from {}: {}", self.host, e),
        }
    }

    /// Run a command
    ///
    /// When `capture` is active both output streams are drained until the
    /// remote closes the channel; otherwise the command is started and the
    /// channel released right away. In memory mode the previous output is
    /// replaced. Capture problems are logged and never fail the command.
    pub async fn execute(&mut self, command: &str, capture: &CaptureMode) -> Result<(), SessionError> {
        let connection = self.connection()?;
        let mut channel = connection.exec(command).await?;
        debug!("Running on {}: {}", self.host, command);

        if let Err(e) = channel.eof().await {
            debug!("Failed to send EOF to {}: {}", self.host, e);
        }

        if let CaptureMode::Memory = capture {
            self.clear_output();
        }

        let mut stdout = Vec::new();
        let mut stderr = Vec::new();
        if capture.is_capturing() {
            while let Some(event) = channel.recv().await {
                match event {
                    ExecEvent::Stdout(data) => capture::split_into(&mut stdout, data),
                    ExecEvent::Stderr(data) => capture::split_into(&mut stderr, data),
                    ExecEvent::ExitStatus(code) => {
                        debug!("{} exited with status {}", self.host, code);
                        self.last_exit_status = Some(code);
                    }
                }
            }
        }

        if let Err(e) = channel.close().await {
            debug!("Failed to close channel on {}: {}", self.host, e);
        }

        match capture {
            CaptureMode::None => {}
            CaptureMode::Memory => {
                self.output = stdout;
                self.diagnostics = stderr;
            }
            CaptureMode::File(dir) => {
                let path = capture::capture_path(dir, &self.host);
                if let Err(e) = capture::append(&path, &stdout, &stderr).await {
                    warn!("Failed to write capture log {}: {}", path.display(), e);
                }
            }
        }
        Ok(())
    }

    /// Check whether a remote path exists
    pub async fn exists(&self, path: &str) -> Result<bool, SessionError> {
        Ok(self.connection()?.exists(path).await?)
    }

    fn connection(&self) -> Result<&C, SessionError> {
        self.connection
            .as_ref()
            .ok_or_else(|| SessionError::NotConnected(self.host.to_string()))
    }
}

impl<C: Connection> std::fmt::Debug for Session<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("host", &self.host)
            .field("user", &self.user)
            .field("status", &self.status())
            .field("output_chunks", &self.output.len())
            .finish()
    }
}
