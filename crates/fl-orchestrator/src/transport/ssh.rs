//! russh implementation of the transport traits
//!
//! Each host gets one SSH connection. Commands and copy streams run on
//! their own session channels over it, and the existence probe opens a
//! short-lived SFTP subsystem channel.

use async_trait::async_trait;
use bytes::Bytes;
use russh::client::{self, Config, Handle, Msg};
use russh::{Channel, ChannelMsg, ChannelStream, Disconnect};
use russh_keys::key::PublicKey;
use russh_sftp::client::SftpSession;
use std::sync::Arc;

use fl_core::error::ConnectionError;
use fl_core::traits::{Connection, ExecChannel, ExecEvent, Transport};
use fl_core::{HostId, HostTarget};

/// Extended data type carrying a command's diagnostic output
const SSH_EXTENDED_DATA_STDERR: u32 = 1;

/// Opens password-authenticated SSH connections
pub struct SshTransport {
    config: Arc<Config>,
}

impl SshTransport {
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    /// Use custom russh client settings (keepalive, inactivity timeout, ...)
    pub fn with_config(config: Config) -> Self {
        Self {
            config: Arc::new(config),
        }
    }
}

impl Default for SshTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for SshTransport {
    type Conn = SshConnection;

    async fn connect(&self, target: &HostTarget) -> Result<SshConnection, ConnectionError> {
        tracing::debug!("Connecting to {}:{}", target.address, target.port);
        let mut handle = client::connect(
            Arc::clone(&self.config),
            (target.address.as_str(), target.port),
            AcceptAnyHostKey {
                host: target.host.clone(),
            },
        )
        .await
        .map_err(|e| ConnectionError::ConnectionRefused(format!("{}: {}", target.host, e)))?;

        tracing::debug!("Authenticating to {} as '{}'", target.host, target.user);
        let authenticated = handle
            .authenticate_password(&target.user, &target.password)
            .await
            .map_err(|e| ConnectionError::ConnectionLost(format!("{}: {}", target.host, e)))?;

        if !authenticated {
            if let Err(e) = handle
                .disconnect(Disconnect::ByApplication, "authentication failed", "en")
                .await
            {
                tracing::debug!("Failed to close rejected connection to {}: {}", target.host, e);
            }
            return Err(ConnectionError::AuthenticationFailed(format!(
                "{}@{}",
                target.user, target.host
            )));
        }

        Ok(SshConnection {
            host: target.host.clone(),
            handle,
        })
    }
}

/// Client handler that trusts every server key
///
/// Host keys are not verified. Fleets are often rebuilt faster than their
/// keys can be provisioned, so flock accepts the man-in-the-middle exposure
/// this implies. Only use it on networks where that exposure is acceptable.
struct AcceptAnyHostKey {
    host: HostId,
}

#[async_trait]
impl client::Handler for AcceptAnyHostKey {
    type Error = russh::Error;

    async fn check_server_key(
        &mut self,
        server_public_key: &PublicKey,
    ) -> Result<bool, Self::Error> {
        tracing::debug!(
            "Accepting host key {} for {} without verification",
            server_public_key.fingerprint(),
            self.host
        );
        Ok(true)
    }
}

/// One authenticated SSH connection
pub struct SshConnection {
    host: HostId,
    handle: Handle<AcceptAnyHostKey>,
}

impl SshConnection {
    async fn open_channel(&self) -> Result<Channel<Msg>, ConnectionError> {
        self.handle
            .channel_open_session()
            .await
            .map_err(|e| ConnectionError::Channel(format!("{}: {}", self.host, e)))
    }
}

#[async_trait]
impl Connection for SshConnection {
    type Exec = SshExecChannel;
    type Copy = ChannelStream<Msg>;

    async fn exec(&self, command: &str) -> Result<SshExecChannel, ConnectionError> {
        let channel = self.open_channel().await?;
        channel
            .exec(true, command)
            .await
            .map_err(|e| ConnectionError::Channel(format!("{}: {}", self.host, e)))?;
        Ok(SshExecChannel { channel })
    }

    async fn copy(&self, command: &str) -> Result<ChannelStream<Msg>, ConnectionError> {
        let channel = self.open_channel().await?;
        channel
            .exec(true, command)
            .await
            .map_err(|e| ConnectionError::Channel(format!("{}: {}", self.host, e)))?;
        Ok(channel.into_stream())
    }

    async fn exists(&self, path: &str) -> Result<bool, ConnectionError> {
        let channel = self.open_channel().await?;
        channel
            .request_subsystem(true, "sftp")
            .await
            .map_err(|e| ConnectionError::Probe(format!("{}: {}", self.host, e)))?;
        let sftp = SftpSession::new(channel.into_stream())
            .await
            .map_err(|e| ConnectionError::Probe(format!("{}: {}", self.host, e)))?;
        sftp.try_exists(path)
            .await
            .map_err(|e| ConnectionError::Probe(format!("{}:{}: {}", self.host, path, e)))
    }

    async fn disconnect(&self) -> Result<(), ConnectionError> {
        self.handle
            .disconnect(Disconnect::ByApplication, "", "en")
            .await
            .map_err(|e| ConnectionError::ConnectionLost(format!("{}: {}", self.host, e)))
    }
}

/// A session channel running one command
pub struct SshExecChannel {
    channel: Channel<Msg>,
}

#[async_trait]
impl ExecChannel for SshExecChannel {
    async fn recv(&mut self) -> Option<ExecEvent> {
        loop {
            match self.channel.wait().await? {
                ChannelMsg::Data { ref data } => {
                    return Some(ExecEvent::Stdout(Bytes::copy_from_slice(data)))
                }
                ChannelMsg::ExtendedData { ref data, ext } if ext == SSH_EXTENDED_DATA_STDERR => {
                    return Some(ExecEvent::Stderr(Bytes::copy_from_slice(data)))
                }
                ChannelMsg::ExitStatus { exit_status } => {
                    return Some(ExecEvent::ExitStatus(exit_status))
                }
                _ => {}
            }
        }
    }

    async fn eof(&mut self) -> Result<(), ConnectionError> {
        self.channel
            .eof()
            .await
            .map_err(|e| ConnectionError::Channel(e.to_string()))
    }

    async fn close(&mut self) -> Result<(), ConnectionError> {
        self.channel
            .close()
            .await
            .map_err(|e| ConnectionError::Channel(e.to_string()))
    }
}
