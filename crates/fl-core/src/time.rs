//! Time utilities for flock

use chrono::{DateTime, Local};

/// Format a time the way `ctime(3)` does, e.g. `Thu Oct  2 14:03:11 2025`
pub fn ctime(at: DateTime<Local>) -> String {
    at.format("%a %b %e %H:%M:%S %Y").to_string()
}

/// Header line written before each command's output in a capture log
pub fn capture_header() -> String {
    format!("[{}]\n", ctime(Local::now()))
}
