//! Output formatting utilities for the CLI
//!
//! Tables for per-host results, raw command output blocks and colored
//! status messages.

use bytes::Bytes;
use tabled::{settings::Style, Table, Tabled};

use fl_core::HostId;

/// Format per-host reachability as an ASCII table
pub fn format_reachability(results: &[(HostId, bool)]) -> String {
    if results.is_empty() {
        return "No hosts".to_string();
    }

    #[derive(Tabled)]
    struct ReachRow {
        #[tabled(rename = "HOST")]
        host: String,
        #[tabled(rename = "STATUS")]
        status: &'static str,
    }

    let rows: Vec<ReachRow> = results
        .iter()
        .map(|(host, ok)| ReachRow {
            host: host.to_string(),
            status: if *ok { "reachable" } else { "unreachable" },
        })
        .collect();

    Table::new(rows).with(Style::rounded()).to_string()
}

/// Format one host's captured output under a header line
///
/// Chunks are joined verbatim; invalid UTF-8 is replaced rather than
/// rejected.
pub fn format_host_output(host: &HostId, chunks: &[Bytes]) -> String {
    let body: Vec<u8> = chunks.iter().flat_map(|c| c.iter().copied()).collect();
    let text = String::from_utf8_lossy(&body);

    let mut out = format!("── {} ──\n", host);
    out.push_str(&text);
    if !text.is_empty() && !text.ends_with('\n') {
        out.push('\n');
    }
    out
}

/// Print a success message in green with a checkmark prefix
pub fn print_success(msg: &str) {
    use crossterm::style::{Color, Print, ResetColor, SetForegroundColor};

    let mut stdout = std::io::stdout();
    let _ = crossterm::execute!(
        stdout,
        SetForegroundColor(Color::Green),
        Print("✓ "),
        ResetColor,
        Print(msg),
        Print("\n")
    );
}

/// Print an error message in red with an X prefix
///
/// Outputs to stderr.
pub fn print_error(msg: &str) {
    use crossterm::style::{Color, Print, ResetColor, SetForegroundColor};

    let mut stderr = std::io::stderr();
    let _ = crossterm::execute!(
        stderr,
        SetForegroundColor(Color::Red),
        Print("✗ "),
        ResetColor,
        Print(msg),
        Print("\n")
    );
}

/// Print a warning message in yellow
pub fn print_warning(msg: &str) {
    use crossterm::style::{Color, Print, ResetColor, SetForegroundColor};

    let mut stderr = std::io::stderr();
    let _ = crossterm::execute!(
        stderr,
        SetForegroundColor(Color::Yellow),
        Print("⚠ "),
        ResetColor,
        Print(msg),
        Print("\n")
    );
}

pub fn print_info(msg: &str) {
    use crossterm::style::{Color, Print, ResetColor, SetForegroundColor};

    let mut stdout = std::io::stdout();
    let _ = crossterm::execute!(
        stdout,
        SetForegroundColor(Color::Cyan),
        Print("ℹ "),
        ResetColor,
        Print(msg),
        Print("\n")
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reachability_table() {
        let table = format_reachability(&[
            (HostId::from("web1"), true),
            (HostId::from("web2"), false),
        ]);
        assert!(table.contains("HOST"));
        assert!(table.contains("web1"));
        assert!(table.contains("unreachable"));
    }

    #[test]
    fn test_reachability_empty() {
        assert_eq!(format_reachability(&[]), "No hosts");
    }

    #[test]
    fn test_host_output_joins_chunks() {
        let out = format_host_output(
            &HostId::from("db1"),
            &[Bytes::from_static(b"load "), Bytes::from_static(b"0.01")],
        );
        assert_eq!(out, "── db1 ──\nload 0.01\n");
    }

    #[test]
    fn test_host_output_lossy() {
        let out = format_host_output(&HostId::from("db1"), &[Bytes::from_static(b"\xffok\n")]);
        assert!(out.ends_with("ok\n"));
    }
}
