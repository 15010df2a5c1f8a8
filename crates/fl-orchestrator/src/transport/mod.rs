//! SSH transport backed by russh

mod ssh;

pub use ssh::{SshConnection, SshExecChannel, SshTransport};
