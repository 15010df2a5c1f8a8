//! Push side of the protocol, talking to a remote `scp -t`
//!
//! Every announced file must be followed by exactly the announced number
//! of bytes; writing more, or finishing early, is rejected locally before
//! the remote sees a malformed stream.

use bytes::BytesMut;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio_util::codec::{Decoder, Encoder};

use crate::codec::{ControlCodec, Record};
use crate::error::ProtocolError;
use crate::message::{Control, Status};

/// File announced to the sink and not yet completed
#[derive(Debug)]
struct PendingFile {
    name: String,
    expected: u64,
    written: u64,
}

/// Writer half of an SCP transfer
pub struct ScpSink<S> {
    stream: S,
    codec: ControlCodec,
    buffer: BytesMut,
    pending: Option<PendingFile>,
}

impl<S> ScpSink<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Wrap a stream connected to a remote `scp -t`
    pub fn new(stream: S) -> Self {
        Self {
            stream,
            codec: ControlCodec::new(),
            buffer: BytesMut::with_capacity(256),
            pending: None,
        }
    }

    /// Wait for the sink's initial ready acknowledgement
    pub async fn ready(&mut self) -> Result<(), ProtocolError> {
        self.expect_ok().await
    }

    /// Announce a file and wait for the sink to accept it
    pub async fn send_file(&mut self, name: &str, size: u64, mode: u32) -> Result<(), ProtocolError> {
        if self.pending.is_some() {
            return Err(ProtocolError::InvalidState("previous file not finished"));
        }

        let mut out = BytesMut::new();
        self.codec.encode(
            Control::File {
                mode,
                size,
                name: name.to_string(),
            },
            &mut out,
        )?;
        self.stream.write_all(&out).await?;
        self.stream.flush().await?;
        self.expect_ok().await?;

        tracing::debug!("Sink accepted {} ({} bytes)", name, size);
        self.pending = Some(PendingFile {
            name: name.to_string(),
            expected: size,
            written: 0,
        });
        Ok(())
    }

    /// Write one chunk of the current file's contents
    pub async fn write_chunk(&mut self, data: &[u8]) -> Result<(), ProtocolError> {
        let (expected, actual) = match &self.pending {
            Some(p) => (p.expected, p.written + data.len() as u64),
            None => return Err(ProtocolError::InvalidState("no file announced")),
        };
        if actual > expected {
            return Err(ProtocolError::SizeMismatch { expected, actual });
        }

        self.stream.write_all(data).await?;

        if let Some(p) = self.pending.as_mut() {
            p.written = actual;
        }
        Ok(())
    }

    /// Complete the current file and wait for the sink's acknowledgement
    pub async fn finish_file(&mut self) -> Result<(), ProtocolError> {
        let pending = self
            .pending
            .take()
            .ok_or(ProtocolError::InvalidState("no file announced"))?;
        if pending.written != pending.expected {
            return Err(ProtocolError::SizeMismatch {
                expected: pending.expected,
                actual: pending.written,
            });
        }

        let mut out = BytesMut::new();
        self.codec.encode(Status::Ok, &mut out)?;
        self.stream.write_all(&out).await?;
        self.stream.flush().await?;
        self.expect_ok().await?;

        tracing::debug!("Sink stored {}", pending.name);
        Ok(())
    }

    /// Close our side of the stream
    pub async fn shutdown(&mut self) -> Result<(), ProtocolError> {
        self.stream.shutdown().await?;
        Ok(())
    }

    /// Give back the underlying stream
    pub fn into_inner(self) -> S {
        self.stream
    }

    async fn expect_ok(&mut self) -> Result<(), ProtocolError> {
        loop {
            if let Some(record) = self.codec.decode(&mut self.buffer)? {
                return match record {
                    Record::Status(status) => status.into_result(),
                    Record::Control(control) => {
                        Err(ProtocolError::UnexpectedRecord(format!("{:?}", control)))
                    }
                };
            }

            if self.stream.read_buf(&mut self.buffer).await? == 0 {
                return Err(ProtocolError::UnexpectedEof);
            }
        }
    }
}
