//! Core trait definitions

mod channel;
mod transport;

pub use channel::{ExecChannel, ExecEvent};
pub use transport::{Connection, Transport};
