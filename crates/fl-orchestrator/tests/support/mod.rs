//! In-memory transport for exercising sessions and the registry
//!
//! Each fake host has a password, canned command output, a tiny remote
//! filesystem fed by pushes and a scripted byte stream played back to
//! pulls. Copy channels are backed by `tokio::io::duplex` with a task
//! playing the remote `scp` end.

#![allow(dead_code)]

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{duplex, AsyncReadExt, AsyncWriteExt, DuplexStream};
use tokio_util::codec::Decoder;

use fl_core::error::ConnectionError;
use fl_core::traits::{Connection, ExecChannel, ExecEvent, Transport};
use fl_core::{HostId, HostTarget};
use fl_protocol::{Control, ControlCodec, Record};

/// Remote files keyed by full path
pub type RemoteFs = Arc<Mutex<BTreeMap<String, Vec<u8>>>>;

#[derive(Clone)]
pub struct FakeHost {
    password: String,
    stdout: Vec<Bytes>,
    stderr: Vec<Bytes>,
    exit_status: u32,
    fs: RemoteFs,
    pull_script: Vec<u8>,
    connect_delay: Option<Duration>,
    panic_on_exec: bool,
}

impl FakeHost {
    pub fn new(password: &str) -> Self {
        Self {
            password: password.to_string(),
            stdout: Vec::new(),
            stderr: Vec::new(),
            exit_status: 0,
            fs: Arc::new(Mutex::new(BTreeMap::new())),
            pull_script: Vec::new(),
            connect_delay: None,
            panic_on_exec: false,
        }
    }

    /// Output produced by every command, one event per element
    pub fn with_output(mut self, stdout: &[&'static [u8]], stderr: &[&'static [u8]]) -> Self {
        self.stdout = stdout.iter().map(|d| Bytes::from_static(d)).collect();
        self.stderr = stderr.iter().map(|d| Bytes::from_static(d)).collect();
        self
    }

    pub fn with_exit_status(mut self, code: u32) -> Self {
        self.exit_status = code;
        self
    }

    pub fn with_file(self, path: &str, contents: &[u8]) -> Self {
        self.fs
            .lock()
            .unwrap()
            .insert(path.to_string(), contents.to_vec());
        self
    }

    /// Bytes a remote `scp -f` sends, whatever the requested source
    pub fn with_pull_script(mut self, script: &[u8]) -> Self {
        self.pull_script = script.to_vec();
        self
    }

    pub fn with_connect_delay(mut self, delay: Duration) -> Self {
        self.connect_delay = Some(delay);
        self
    }

    pub fn panicking_on_exec(mut self) -> Self {
        self.panic_on_exec = true;
        self
    }

    /// Handle onto this host's remote filesystem
    pub fn fs(&self) -> RemoteFs {
        Arc::clone(&self.fs)
    }
}

#[derive(Default)]
pub struct FakeTransport {
    hosts: HashMap<HostId, FakeHost>,
    attempts: Arc<AtomicUsize>,
    disconnects: Arc<AtomicUsize>,
    logins: Arc<Mutex<Vec<(HostId, String, u16)>>>,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_host(mut self, host: &str, fake: FakeHost) -> Self {
        self.hosts.insert(HostId::from(host), fake);
        self
    }

    /// Connect attempts seen so far
    pub fn attempts(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.attempts)
    }

    /// Connections closed so far
    pub fn disconnects(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.disconnects)
    }

    /// `(host, user, port)` of every successful login
    pub fn logins(&self) -> Arc<Mutex<Vec<(HostId, String, u16)>>> {
        Arc::clone(&self.logins)
    }
}

#[async_trait]
impl Transport for FakeTransport {
    type Conn = FakeConnection;

    async fn connect(&self, target: &HostTarget) -> Result<FakeConnection, ConnectionError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);

        let host = self
            .hosts
            .get(&target.host)
            .ok_or_else(|| ConnectionError::ConnectionRefused(target.host.to_string()))?;
        if let Some(delay) = host.connect_delay {
            tokio::time::sleep(delay).await;
        }
        if host.password != target.password {
            return Err(ConnectionError::AuthenticationFailed(target.host.to_string()));
        }

        self.logins
            .lock()
            .unwrap()
            .push((target.host.clone(), target.user.clone(), target.port));
        Ok(FakeConnection {
            host: host.clone(),
            disconnects: Arc::clone(&self.disconnects),
        })
    }
}

pub struct FakeConnection {
    host: FakeHost,
    disconnects: Arc<AtomicUsize>,
}

#[async_trait]
impl Connection for FakeConnection {
    type Exec = FakeExec;
    type Copy = DuplexStream;

    async fn exec(&self, _command: &str) -> Result<FakeExec, ConnectionError> {
        if self.host.panic_on_exec {
            panic!("remote exploded");
        }
        let mut events: VecDeque<ExecEvent> = VecDeque::new();
        events.extend(self.host.stdout.iter().cloned().map(ExecEvent::Stdout));
        events.extend(self.host.stderr.iter().cloned().map(ExecEvent::Stderr));
        events.push_back(ExecEvent::ExitStatus(self.host.exit_status));
        Ok(FakeExec { events })
    }

    async fn copy(&self, command: &str) -> Result<DuplexStream, ConnectionError> {
        let (local, remote) = duplex(64 * 1024);
        if let Some(dest) = command.strip_prefix("scp -r -t ") {
            let dest = dest.trim_matches('\'').to_string();
            tokio::spawn(remote_sink(remote, dest, self.host.fs()));
        } else if command.starts_with("scp -r -f ") {
            tokio::spawn(remote_source(remote, self.host.pull_script.clone()));
        } else {
            return Err(ConnectionError::Channel(format!("unexpected command: {}", command)));
        }
        Ok(local)
    }

    async fn exists(&self, path: &str) -> Result<bool, ConnectionError> {
        Ok(self.host.fs.lock().unwrap().contains_key(path))
    }

    async fn disconnect(&self) -> Result<(), ConnectionError> {
        self.disconnects.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

pub struct FakeExec {
    events: VecDeque<ExecEvent>,
}

#[async_trait]
impl ExecChannel for FakeExec {
    async fn recv(&mut self) -> Option<ExecEvent> {
        self.events.pop_front()
    }

    async fn eof(&mut self) -> Result<(), ConnectionError> {
        Ok(())
    }

    async fn close(&mut self) -> Result<(), ConnectionError> {
        self.events.clear();
        Ok(())
    }
}

/// Play a remote `scp -t`, storing every received file under `dest`
async fn remote_sink(mut stream: DuplexStream, dest: String, fs: RemoteFs) -> std::io::Result<()> {
    let mut buf = BytesMut::new();
    stream.write_all(&[0]).await?;

    while let Some(record) = decode_record(&mut stream, &mut buf).await? {
        let Record::Control(Control::File { size, name, .. }) = record else {
            return Ok(());
        };
        stream.write_all(&[0]).await?;

        let size = size as usize;
        while buf.len() < size + 1 {
            if stream.read_buf(&mut buf).await? == 0 {
                return Ok(());
            }
        }
        let contents = buf.split_to(size).to_vec();
        let _done = buf.split_to(1);

        let path = format!("{}/{}", dest.trim_end_matches('/'), name);
        fs.lock().unwrap().insert(path, contents);
        stream.write_all(&[0]).await?;
    }
    Ok(())
}

/// Play a remote `scp -f`: send the script, then swallow acks until closed
async fn remote_source(mut stream: DuplexStream, script: Vec<u8>) -> std::io::Result<()> {
    stream.write_all(&script).await?;
    stream.shutdown().await?;
    let mut acks = Vec::new();
    stream.read_to_end(&mut acks).await?;
    Ok(())
}

/// Next record off the stream, `None` once the peer has gone away
async fn decode_record(
    stream: &mut DuplexStream,
    buf: &mut BytesMut,
) -> std::io::Result<Option<Record>> {
    let mut codec = ControlCodec::new();
    loop {
        match codec.decode(buf) {
            Ok(Some(record)) => return Ok(Some(record)),
            Ok(None) => {}
            Err(_) => return Ok(None),
        }
        if stream.read_buf(buf).await? == 0 {
            return Ok(None);
        }
    }
}
