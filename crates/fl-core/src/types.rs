//! Core domain types

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier for a host in the fleet: an address, optionally with `:port`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct HostId(pub String);

impl HostId {
    /// Create a new host ID
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the raw ID string
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Split into address and explicit port, if one is given
    ///
    /// Bracketed IPv6 (`[::1]:2222`) is supported; a bare IPv6 address is
    /// never split.
    pub fn address_and_port(&self) -> (&str, Option<u16>) {
        let s = self.0.as_str();
        if let Some(rest) = s.strip_prefix('[') {
            if let Some((addr, tail)) = rest.split_once(']') {
                let port = tail.strip_prefix(':').and_then(|p| p.parse().ok());
                return (addr, port);
            }
        }
        match s.split_once(':') {
            Some((addr, port)) if !port.contains(':') => match port.parse() {
                Ok(port) => (addr, Some(port)),
                Err(_) => (s, None),
            },
            _ => (s, None),
        }
    }

    /// File-name-safe form used for per-host capture logs
    pub fn file_stem(&self) -> String {
        self.0
            .chars()
            .map(|c| match c {
                '/' | '\\' | ':' => '_',
                c => c,
            })
            .collect()
    }
}

impl fmt::Display for HostId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for HostId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for HostId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Everything the transport needs to open one authenticated connection
#[derive(Clone)]
pub struct HostTarget {
    /// Host this connection is for
    pub host: HostId,
    /// Address to dial
    pub address: String,
    /// SSH port
    pub port: u16,
    /// Login user
    pub user: String,
    /// Password credential
    pub password: String,
}

impl HostTarget {
    /// Resolve a target from a host ID, falling back to the default port
    pub fn new(host: HostId, default_port: u16, user: String, password: String) -> Self {
        let (address, port) = host.address_and_port();
        Self {
            address: address.to_string(),
            port: port.unwrap_or(default_port),
            host,
            user,
            password,
        }
    }
}

impl fmt::Debug for HostTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostTarget")
            .field("host", &self.host)
            .field("address", &self.address)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Connection status for a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectionStatus {
    /// Session holds a live connection
    Connected,
    /// Session has no connection
    Disconnected,
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionStatus::Connected => write!(f, "connected"),
            ConnectionStatus::Disconnected => write!(f, "disconnected"),
        }
    }
}
