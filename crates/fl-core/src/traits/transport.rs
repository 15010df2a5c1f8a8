//! Transport traits
//!
//! The SSH library sits behind these traits. The orchestrator only needs
//! to connect, run commands, open a byte stream for the copy protocol and
//! probe for remote files; everything else (key exchange, encryption,
//! host keys) stays inside the implementation.

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncWrite};

use super::channel::ExecChannel;
use crate::error::ConnectionError;
use crate::types::HostTarget;

/// Opens authenticated connections to hosts
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    /// The connection type produced by this transport
    type Conn: Connection;

    /// Connect and authenticate with the target's password
    ///
    /// On authentication failure the implementation releases the
    /// underlying connection before returning
    /// `ConnectionError::AuthenticationFailed`.
    async fn connect(&self, target: &HostTarget) -> Result<Self::Conn, ConnectionError>;
}

/// One authenticated connection to a host
#[async_trait]
pub trait Connection: Send + Sync + 'static {
    /// Channel type running a single remote command
    type Exec: ExecChannel;

    /// Duplex byte stream carrying a copy-protocol exchange
    type Copy: AsyncRead + AsyncWrite + Unpin + Send + 'static;

    /// Open a channel and start `command` on it
    async fn exec(&self, command: &str) -> Result<Self::Exec, ConnectionError>;

    /// Open a channel running `command` and expose it as a byte stream
    async fn copy(&self, command: &str) -> Result<Self::Copy, ConnectionError>;

    /// Check whether a remote path exists
    async fn exists(&self, path: &str) -> Result<bool, ConnectionError>;

    /// Close the connection
    async fn disconnect(&self) -> Result<(), ConnectionError>;
}
