//! fl-core: Core abstractions and configuration for flock
//!
//! This crate provides the shared types, error taxonomy, settings and
//! transport traits used by the orchestrator and the CLI.

pub mod config;
pub mod error;
pub mod time;
pub mod traits;
pub mod types;

pub use types::{HostId, HostTarget};
