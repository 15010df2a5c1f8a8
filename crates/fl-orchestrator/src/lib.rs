//! fl-orchestrator: fleet orchestration over SSH
//!
//! A [`SessionRegistry`] owns one [`Session`] per host and fans fleet-wide
//! operations (connect, command execution, push, pull) out to one task per
//! host, folding the per-host outcomes into a single fleet result.

pub mod registry;
pub mod session;
pub mod transport;

pub use registry::{
    CommandJob, ConnectRequest, FleetResult, PullJob, PushJob, SessionRegistry, SharedSession,
};
pub use session::{Session, TransferStats, CAPTURE_CHUNK_SIZE};
pub use transport::{SshConnection, SshTransport};
