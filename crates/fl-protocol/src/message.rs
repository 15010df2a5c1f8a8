//! Control records and status acknowledgements
//!
//! Control records are single newline-terminated lines:
//! - `C<mode> <size> <name>`: a regular file follows
//! - `D<mode> 0 <name>`: enter a directory
//! - `E`: leave the current directory
//! - `T<mtime> 0 <atime> 0`: timestamps for the next file or directory
//!
//! Status acknowledgements are a single byte: `0x00` for success, or
//! `0x01`/`0x02` followed by a message line for a warning/fatal error.

use bytes::{BufMut, BytesMut};

use crate::error::ProtocolError;

/// Mode announced for pushed files (owner read/write/execute)
pub const DEFAULT_FILE_MODE: u32 = 0o700;

/// Status byte for success
pub(crate) const STATUS_OK: u8 = 0x00;
/// Status byte for a non-fatal error
pub(crate) const STATUS_WARNING: u8 = 0x01;
/// Status byte for a fatal error
pub(crate) const STATUS_FATAL: u8 = 0x02;

/// A control record describing what follows on the stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Control {
    /// Regular file of `size` bytes
    File { mode: u32, size: u64, name: String },
    /// Start of a directory
    Dir { mode: u32, name: String },
    /// End of the current directory
    EndDir,
    /// Modification and access times (seconds since epoch)
    Time { mtime: u64, atime: u64 },
}

/// An acknowledgement or error report
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Status {
    /// Request accepted
    Ok,
    /// Non-fatal error with message
    Warning(String),
    /// Fatal error with message
    Fatal(String),
}

impl Control {
    /// Encode the record including its trailing newline
    pub fn encode(&self, dst: &mut BytesMut) -> Result<(), ProtocolError> {
        let line = match self {
            Control::File { mode, size, name } => {
                validate_name(name)?;
                format!("C{:04o} {} {}\n", mode & 0o7777, size, name)
            }
            Control::Dir { mode, name } => {
                validate_name(name)?;
                format!("D{:04o} 0 {}\n", mode & 0o7777, name)
            }
            Control::EndDir => "E\n".to_string(),
            Control::Time { mtime, atime } => format!("T{} 0 {} 0\n", mtime, atime),
        };
        dst.extend_from_slice(line.as_bytes());
        Ok(())
    }

    /// Parse a record line without its trailing newline
    pub fn parse(line: &str) -> Result<Self, ProtocolError> {
        let mut chars = line.chars();
        match chars.next() {
            Some('C') => {
                let (mode, size, name) = parse_entry(chars.as_str(), line)?;
                Ok(Control::File { mode, size, name })
            }
            Some('D') => {
                let (mode, _, name) = parse_entry(chars.as_str(), line)?;
                Ok(Control::Dir { mode, name })
            }
            Some('E') if line.len() == 1 => Ok(Control::EndDir),
            Some('T') => {
                let fields: Vec<&str> = chars.as_str().split(' ').collect();
                if fields.len() != 4 {
                    return Err(ProtocolError::InvalidRecord(line.to_string()));
                }
                let mtime = parse_number(fields[0], line)?;
                let atime = parse_number(fields[2], line)?;
                Ok(Control::Time { mtime, atime })
            }
            _ => Err(ProtocolError::InvalidRecord(line.to_string())),
        }
    }
}

impl Status {
    /// Encode the status byte, with message line for errors
    pub fn encode(&self, dst: &mut BytesMut) {
        match self {
            Status::Ok => dst.put_u8(STATUS_OK),
            Status::Warning(msg) => {
                dst.put_u8(STATUS_WARNING);
                dst.extend_from_slice(msg.as_bytes());
                dst.put_u8(b'\n');
            }
            Status::Fatal(msg) => {
                dst.put_u8(STATUS_FATAL);
                dst.extend_from_slice(msg.as_bytes());
                dst.put_u8(b'\n');
            }
        }
    }

    /// Convert into a result, mapping errors to `ProtocolError`
    pub fn into_result(self) -> Result<(), ProtocolError> {
        match self {
            Status::Ok => Ok(()),
            Status::Warning(msg) => Err(ProtocolError::RemoteWarning(msg)),
            Status::Fatal(msg) => Err(ProtocolError::RemoteError(msg)),
        }
    }
}

/// Check that a name can travel in a single record and names one entry
pub fn validate_name(name: &str) -> Result<(), ProtocolError> {
    if name.is_empty()
        || name == "."
        || name == ".."
        || name.contains('/')
        || name.contains('\n')
    {
        return Err(ProtocolError::InvalidName(name.to_string()));
    }
    Ok(())
}

/// Parse `<mode> <size> <name>`; the name may contain spaces
fn parse_entry(rest: &str, line: &str) -> Result<(u32, u64, String), ProtocolError> {
    let mut parts = rest.splitn(3, ' ');
    let mode = parts
        .next()
        .and_then(|m| u32::from_str_radix(m, 8).ok())
        .ok_or_else(|| ProtocolError::InvalidRecord(line.to_string()))?;
    let size = parse_number(parts.next().unwrap_or(""), line)?;
    let name = parts
        .next()
        .ok_or_else(|| ProtocolError::InvalidRecord(line.to_string()))?
        .to_string();
    validate_name(&name)?;
    Ok((mode, size, name))
}

fn parse_number(field: &str, line: &str) -> Result<u64, ProtocolError> {
    field
        .parse()
        .map_err(|_| ProtocolError::InvalidRecord(line.to_string()))
}
