//! Pull side of the protocol, talking to a remote `scp -f`
//!
//! The remote source drives the exchange: it announces files and
//! directories, and we acknowledge each one. [`ScpSource::next_event`]
//! turns the stream into a sequence of [`ScpEvent`]s; a `NewFile` event
//! must be accepted, drained and finished before asking for the next one.

use bytes::{Buf, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio_util::codec::{Decoder, Encoder};

use crate::codec::{ControlCodec, Record};
use crate::error::ProtocolError;
use crate::message::{Control, Status};

/// An event produced by the remote source
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScpEvent {
    /// A file follows; accept it and read `size` bytes
    NewFile { name: String, size: u64, mode: u32 },
    /// Descend into a new directory
    NewDir { name: String, mode: u32 },
    /// Leave the current directory
    EndDir,
    /// Timestamps for the next entry
    Time { mtime: u64, atime: u64 },
    /// Non-fatal problem reported by the remote
    Warning(String),
    /// Fatal problem reported by the remote
    Error(String),
    /// The remote finished sending
    EndOfStream,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Idle,
    Announced { size: u64 },
    Receiving { remaining: u64 },
}

/// Reader half of an SCP transfer
pub struct ScpSource<S> {
    stream: S,
    codec: ControlCodec,
    buffer: BytesMut,
    state: State,
}

impl<S> ScpSource<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Wrap a stream connected to a remote `scp -f`
    pub fn new(stream: S) -> Self {
        Self {
            stream,
            codec: ControlCodec::new(),
            buffer: BytesMut::with_capacity(8192),
            state: State::Idle,
        }
    }

    /// Tell the remote source we are ready to receive
    pub async fn start(&mut self) -> Result<(), ProtocolError> {
        self.send_ok().await
    }

    /// Wait for the next event from the remote source
    pub async fn next_event(&mut self) -> Result<ScpEvent, ProtocolError> {
        if self.state != State::Idle {
            return Err(ProtocolError::InvalidState("previous file not finished"));
        }

        loop {
            if let Some(record) = self.codec.decode(&mut self.buffer)? {
                return self.handle_record(record).await;
            }

            if self.stream.read_buf(&mut self.buffer).await? == 0 {
                if self.buffer.is_empty() {
                    return Ok(ScpEvent::EndOfStream);
                }
                return Err(ProtocolError::UnexpectedEof);
            }
        }
    }

    async fn handle_record(&mut self, record: Record) -> Result<ScpEvent, ProtocolError> {
        match record {
            Record::Control(Control::File { mode, size, name }) => {
                self.state = State::Announced { size };
                Ok(ScpEvent::NewFile { name, size, mode })
            }
            Record::Control(Control::Dir { mode, name }) => {
                self.send_ok().await?;
                Ok(ScpEvent::NewDir { name, mode })
            }
            Record::Control(Control::EndDir) => {
                self.send_ok().await?;
                Ok(ScpEvent::EndDir)
            }
            Record::Control(Control::Time { mtime, atime }) => {
                self.send_ok().await?;
                Ok(ScpEvent::Time { mtime, atime })
            }
            Record::Status(Status::Warning(msg)) => Ok(ScpEvent::Warning(msg)),
            Record::Status(Status::Fatal(msg)) => Ok(ScpEvent::Error(msg)),
            Record::Status(Status::Ok) => Err(ProtocolError::UnexpectedRecord(
                "stray acknowledgement".to_string(),
            )),
        }
    }

    /// Accept the announced file; its contents follow
    pub async fn accept(&mut self) -> Result<(), ProtocolError> {
        let State::Announced { size } = self.state else {
            return Err(ProtocolError::InvalidState("no file announced"));
        };
        self.send_ok().await?;
        self.state = State::Receiving { remaining: size };
        Ok(())
    }

    /// Read up to `out.len()` bytes of the current file
    ///
    /// Returns 0 once the announced size has been fully read.
    pub async fn read_chunk(&mut self, out: &mut [u8]) -> Result<usize, ProtocolError> {
        let State::Receiving { remaining } = self.state else {
            return Err(ProtocolError::InvalidState("no file being received"));
        };
        if remaining == 0 || out.is_empty() {
            return Ok(0);
        }

        let want = (out.len() as u64).min(remaining) as usize;
        let n = if self.buffer.is_empty() {
            let n = self.stream.read(&mut out[..want]).await?;
            if n == 0 {
                return Err(ProtocolError::UnexpectedEof);
            }
            n
        } else {
            let n = want.min(self.buffer.len());
            out[..n].copy_from_slice(&self.buffer[..n]);
            self.buffer.advance(n);
            n
        };

        self.state = State::Receiving {
            remaining: remaining - n as u64,
        };
        Ok(n)
    }

    /// Consume the source's end-of-file status and acknowledge it
    pub async fn finish_file(&mut self) -> Result<(), ProtocolError> {
        match self.state {
            State::Receiving { remaining: 0 } => {}
            State::Receiving { .. } => {
                return Err(ProtocolError::InvalidState("file not fully read"))
            }
            _ => return Err(ProtocolError::InvalidState("no file being received")),
        }

        let status = loop {
            if let Some(record) = self.codec.decode(&mut self.buffer)? {
                match record {
                    Record::Status(status) => break status,
                    Record::Control(control) => {
                        return Err(ProtocolError::UnexpectedRecord(format!("{:?}", control)))
                    }
                }
            }
            if self.stream.read_buf(&mut self.buffer).await? == 0 {
                return Err(ProtocolError::UnexpectedEof);
            }
        };

        status.into_result()?;
        self.send_ok().await?;
        self.state = State::Idle;
        Ok(())
    }

    /// Close our side of the stream
    pub async fn shutdown(&mut self) -> Result<(), ProtocolError> {
        self.stream.shutdown().await?;
        Ok(())
    }

    async fn send_ok(&mut self) -> Result<(), ProtocolError> {
        let mut out = BytesMut::with_capacity(1);
        self.codec.encode(Status::Ok, &mut out)?;
        self.stream.write_all(&out).await?;
        self.stream.flush().await?;
        Ok(())
    }
}
