//! flock: command-line front end for fleet orchestration
//!
//! Provides the `flock` CLI for checking reachability, running commands
//! and copying files across many SSH hosts at once.

pub mod commands;
pub mod inventory;
pub mod output;
