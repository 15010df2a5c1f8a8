//! Core error types for flock

use fl_protocol::ProtocolError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by the transport while talking to one host
#[derive(Error, Debug)]
pub enum ConnectionError {
    /// The host rejected our credentials
    #[error("Authentication failed for {0}")]
    AuthenticationFailed(String),

    /// TCP or SSH handshake failed
    #[error("Connection refused: {0}")]
    ConnectionRefused(String),

    /// Connection dropped while in use
    #[error("Connection lost: {0}")]
    ConnectionLost(String),

    /// Connect attempt exceeded the configured timeout
    #[error("Connection to {0} timed out")]
    Timeout(String),

    /// Opening or driving a channel failed
    #[error("Channel error: {0}")]
    Channel(String),

    /// Remote file probe failed
    #[error("Remote probe failed: {0}")]
    Probe(String),
}

/// Session-related errors
#[derive(Error, Debug)]
pub enum SessionError {
    /// No session registered for this host
    #[error("Session not found: {0}")]
    NotFound(String),

    /// A session for this host is already registered
    #[error("{0} is already connected")]
    AlreadyExists(String),

    /// Operation requires a connected session
    #[error("Not connected to {0}")]
    NotConnected(String),

    /// Session is connected already
    #[error("Session for {0} is already connected")]
    AlreadyConnected(String),

    /// A local path cannot be transferred
    #[error("Invalid path: {0}")]
    InvalidPath(PathBuf),

    /// Transport failure
    #[error(transparent)]
    Connection(#[from] ConnectionError),

    /// Copy protocol failure
    #[error("Transfer failed: {0}")]
    Transfer(#[from] ProtocolError),

    /// Local I/O failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Config file not found
    #[error("Config file not found: {0}")]
    NotFound(PathBuf),

    /// Invalid configuration
    #[error("Invalid config: {0}")]
    Invalid(String),

    /// TOML parse error
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),

    /// TOML serialize error
    #[error("TOML serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
}
