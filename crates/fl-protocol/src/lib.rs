//! fl-protocol: SCP remote-copy protocol for flock
//!
//! This crate implements both ends of the classic `scp` wire protocol as
//! spoken over an SSH exec channel: the push side talks to a remote
//! `scp -t` sink, the pull side talks to a remote `scp -f` source.

pub mod codec;
pub mod error;
pub mod message;
pub mod sink;
pub mod source;

pub use codec::{ControlCodec, Record, MAX_RECORD_LEN};
pub use error::ProtocolError;
pub use message::{Control, Status, DEFAULT_FILE_MODE};
pub use sink::ScpSink;
pub use source::{ScpEvent, ScpSource};

/// Size of each data chunk moved during push and pull (16 KiB)
pub const TRANSFER_CHUNK_SIZE: usize = 16 * 1024;

/// Remote command that starts an SCP sink receiving into `dest`
pub fn sink_command(dest: &str) -> String {
    format!("scp -r -t {}", shell_quote(dest))
}

/// Remote command that starts an SCP source sending `source`
pub fn source_command(source: &str) -> String {
    format!("scp -r -f {}", shell_quote(source))
}

/// Single-quote a path for the remote shell
fn shell_quote(path: &str) -> String {
    format!("'{}'", path.replace('\'', r"'\''"))
}
