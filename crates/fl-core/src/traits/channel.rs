//! Command channel trait

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::ConnectionError;

/// Output observed on a command channel
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecEvent {
    /// Data on the primary output stream
    Stdout(Bytes),
    /// Data on the diagnostic output stream
    Stderr(Bytes),
    /// Remote process exit status
    ExitStatus(u32),
}

/// A logical channel running one remote command
#[async_trait]
pub trait ExecChannel: Send + 'static {
    /// Next output event; `None` once the remote has closed the channel
    async fn recv(&mut self) -> Option<ExecEvent>;

    /// Signal end of input to the remote process
    async fn eof(&mut self) -> Result<(), ConnectionError>;

    /// Tear down the channel
    async fn close(&mut self) -> Result<(), ConnectionError>;
}
