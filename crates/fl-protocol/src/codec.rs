//! Tokio codec for SCP control records and status bytes
//!
//! File contents are not framed: after a `C` record is accepted the raw
//! bytes follow on the stream. Callers drain those themselves and only use
//! the codec for the records in between.

use bytes::{Buf, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use crate::error::ProtocolError;
use crate::message::{Control, Status, STATUS_FATAL, STATUS_OK, STATUS_WARNING};

/// Maximum length of a single control or status line
pub const MAX_RECORD_LEN: usize = 8192;

/// A decoded unit from the stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Record {
    /// A control record
    Control(Control),
    /// A status acknowledgement
    Status(Status),
}

/// Codec for encoding/decoding SCP records
#[derive(Debug, Default)]
pub struct ControlCodec;

impl ControlCodec {
    /// Create a new codec
    pub fn new() -> Self {
        Self
    }
}

/// Split off one newline-terminated line, without the newline
fn take_line(src: &mut BytesMut) -> Result<Option<BytesMut>, ProtocolError> {
    match src.iter().position(|b| *b == b'\n') {
        Some(pos) => {
            let line = src.split_to(pos);
            src.advance(1);
            Ok(Some(line))
        }
        None if src.len() > MAX_RECORD_LEN => Err(ProtocolError::RecordTooLong {
            max: MAX_RECORD_LEN,
        }),
        None => Ok(None),
    }
}

impl Decoder for ControlCodec {
    type Item = Record;
    type Error = ProtocolError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        let first = match src.first() {
            Some(b) => *b,
            None => return Ok(None),
        };

        match first {
            STATUS_OK => {
                src.advance(1);
                Ok(Some(Record::Status(Status::Ok)))
            }
            STATUS_WARNING | STATUS_FATAL => {
                // Leave the status byte in place until the message is complete
                let mut probe = src.clone();
                probe.advance(1);
                let Some(message) = take_line(&mut probe)? else {
                    return Ok(None);
                };
                let consumed = src.len() - probe.len();
                src.advance(consumed);
                let message = String::from_utf8_lossy(&message).into_owned();

                let status = if first == STATUS_WARNING {
                    Status::Warning(message)
                } else {
                    Status::Fatal(message)
                };
                Ok(Some(Record::Status(status)))
            }
            b'C' | b'D' | b'E' | b'T' => match take_line(src)? {
                // Names are written to disk as given, so they must decode exactly
                Some(line) => match std::str::from_utf8(&line) {
                    Ok(line) => Ok(Some(Record::Control(Control::parse(line)?))),
                    Err(_) => Err(ProtocolError::InvalidName(
                        String::from_utf8_lossy(&line).into_owned(),
                    )),
                },
                None => Ok(None),
            },
            other => Err(ProtocolError::UnexpectedByte(other)),
        }
    }
}

impl Encoder<Control> for ControlCodec {
    type Error = ProtocolError;

    fn encode(&mut self, item: Control, dst: &mut BytesMut) -> Result<(), Self::Error> {
        item.encode(dst)
    }
}

impl Encoder<Status> for ControlCodec {
    type Error = ProtocolError;

    fn encode(&mut self, item: Status, dst: &mut BytesMut) -> Result<(), Self::Error> {
        item.encode(dst);
        Ok(())
    }
}
