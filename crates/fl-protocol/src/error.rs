//! Protocol error types

use thiserror::Error;

/// Errors that can occur while speaking the SCP protocol
#[derive(Error, Debug)]
pub enum ProtocolError {
    /// A control record could not be parsed
    #[error("Invalid control record: {0}")]
    InvalidRecord(String),

    /// A record started with a byte that is not part of the protocol
    #[error("Unexpected byte 0x{0:02x} at start of record")]
    UnexpectedByte(u8),

    /// A filename is not safe to announce or create
    #[error("Invalid file name: {0:?}")]
    InvalidName(String),

    /// A control record exceeded the maximum length
    #[error("Record too long: exceeds maximum of {max} bytes")]
    RecordTooLong { max: usize },

    /// The peer closed the stream in the middle of an exchange
    #[error("Unexpected end of stream")]
    UnexpectedEof,

    /// A well-formed record arrived where a different one was required
    #[error("Unexpected record: {0}")]
    UnexpectedRecord(String),

    /// The peer reported a non-fatal error
    #[error("Remote warning: {0}")]
    RemoteWarning(String),

    /// The peer reported a fatal error
    #[error("Remote error: {0}")]
    RemoteError(String),

    /// Bytes written for a file differ from the announced size
    #[error("Size mismatch: announced {expected} bytes, wrote {actual}")]
    SizeMismatch { expected: u64, actual: u64 },

    /// An operation was called out of protocol order
    #[error("Invalid state: {0}")]
    InvalidState(&'static str),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
