//! File transfer over the copy protocol
//!
//! Both directions open a dedicated channel running the remote `scp`
//! helper. The copy stream is shut down exactly once however the
//! transfer ends.

use std::path::{Path, PathBuf};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, info, warn};

use fl_core::error::SessionError;
use fl_core::traits::Connection;
use fl_core::HostId;
use fl_protocol::{
    sink_command, source_command, ProtocolError, ScpEvent, ScpSink, ScpSource, DEFAULT_FILE_MODE,
    TRANSFER_CHUNK_SIZE,
};

use super::Session;

/// What a push or pull moved
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransferStats {
    /// Files written on the receiving side
    pub files: usize,
    /// Files left alone because they already existed remotely
    pub skipped: usize,
    /// Payload bytes moved
    pub bytes: u64,
}

impl<C: Connection> Session<C> {
    /// Copy local files into a remote directory
    ///
    /// With `overwrite` off, each file whose `<destination>/<name>`
    /// already exists remotely is skipped.
    pub async fn push(
        &mut self,
        sources: &[PathBuf],
        destination: &str,
        overwrite: bool,
    ) -> Result<TransferStats, SessionError> {
        let connection = self.connection()?;
        let stream = connection.copy(&sink_command(destination)).await?;
        let mut sink = ScpSink::new(stream);

        let result = push_files(connection, &mut sink, sources, destination, overwrite).await;
        if let Err(e) = sink.shutdown().await {
            debug!("Failed to close copy channel on {}: {}", self.host, e);
        }

        let stats = result?;
        info!(
            "Pushed {} file(s), {} bytes to {}:{} ({} skipped)",
            stats.files, stats.bytes, self.host, destination, stats.skipped
        );
        Ok(stats)
    }

    /// Copy a remote file or directory tree into a local directory
    ///
    /// When `exact_name` is given every received file is written to that
    /// path instead of `<destination>/<name>`.
    pub async fn pull(
        &mut self,
        source: &str,
        destination: &Path,
        exact_name: Option<&Path>,
    ) -> Result<TransferStats, SessionError> {
        let connection = self.connection()?;
        let stream = connection.copy(&source_command(source)).await?;
        let mut scp = ScpSource::new(stream);

        let result = pull_files(&mut scp, &self.host, destination, exact_name).await;
        if let Err(e) = scp.shutdown().await {
            debug!("Failed to close copy channel on {}: {}", self.host, e);
        }

        let stats = result?;
        info!(
            "Pulled {} file(s), {} bytes from {}:{}",
            stats.files, stats.bytes, self.host, source
        );
        Ok(stats)
    }
}

async fn push_files<C, S>(
    connection: &C,
    sink: &mut ScpSink<S>,
    sources: &[PathBuf],
    destination: &str,
    overwrite: bool,
) -> Result<TransferStats, SessionError>
where
    C: Connection,
    S: AsyncRead + AsyncWrite + Unpin,
{
    sink.ready().await?;

    let mut stats = TransferStats::default();
    let mut buf = vec![0u8; TRANSFER_CHUNK_SIZE];

    for path in sources {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| SessionError::InvalidPath(path.clone()))?;

        if !overwrite && connection.exists(&remote_join(destination, name)).await? {
            info!("{} already exists in {}, skipping", name, destination);
            stats.skipped += 1;
            continue;
        }

        let mut file = tokio::fs::File::open(path).await?;
        let metadata = file.metadata().await?;
        if !metadata.is_file() {
            return Err(SessionError::InvalidPath(path.clone()));
        }
        let size = metadata.len();

        sink.send_file(name, size, DEFAULT_FILE_MODE).await?;
        let mut remaining = size;
        while remaining > 0 {
            let want = remaining.min(buf.len() as u64) as usize;
            file.read_exact(&mut buf[..want]).await?;
            sink.write_chunk(&buf[..want]).await?;
            remaining -= want as u64;
        }
        sink.finish_file().await?;

        stats.files += 1;
        stats.bytes += size;
    }

    Ok(stats)
}

async fn pull_files<S>(
    scp: &mut ScpSource<S>,
    host: &HostId,
    destination: &Path,
    exact_name: Option<&Path>,
) -> Result<TransferStats, SessionError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    scp.start().await?;

    let mut stats = TransferStats::default();
    let mut buf = vec![0u8; TRANSFER_CHUNK_SIZE];
    let mut dir = destination.to_path_buf();
    let mut depth = 0usize;

    loop {
        match scp.next_event().await? {
            ScpEvent::NewFile { name, size, .. } => {
                let target = match exact_name {
                    Some(path) => path.to_path_buf(),
                    None => dir.join(&name),
                };
                let mut file = tokio::fs::File::create(&target).await?;
                scp.accept().await?;

                // Partial contents stay on disk when the transfer breaks off
                let received = receive_file(scp, &mut file, &mut buf).await;
                file.flush().await?;
                received?;
                scp.finish_file().await?;

                debug!("Received {} ({} bytes) into {}", name, size, target.display());
                stats.files += 1;
                stats.bytes += size;
            }
            ScpEvent::NewDir { name, .. } => {
                dir.push(&name);
                depth += 1;
                // Everything lands on the exact target, so the tree is not recreated
                if exact_name.is_none() {
                    tokio::fs::create_dir_all(&dir).await?;
                }
            }
            ScpEvent::EndDir => {
                if depth == 0 {
                    let unbalanced = "end of directory outside any directory".to_string();
                    return Err(ProtocolError::UnexpectedRecord(unbalanced).into());
                }
                dir.pop();
                depth -= 1;
            }
            ScpEvent::Time { .. } => {}
            ScpEvent::Warning(msg) => warn!("Remote warning from {}: {}", host, msg),
            ScpEvent::Error(msg) => return Err(ProtocolError::RemoteError(msg).into()),
            ScpEvent::EndOfStream => return Ok(stats),
        }
    }
}

async fn receive_file<S>(
    scp: &mut ScpSource<S>,
    file: &mut tokio::fs::File,
    buf: &mut [u8],
) -> Result<(), SessionError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    loop {
        let n = scp.read_chunk(buf).await?;
        if n == 0 {
            return Ok(());
        }
        file.write_all(&buf[..n]).await?;
    }
}

/// Join a remote directory and a file name with exactly one separator
fn remote_join(dir: &str, name: &str) -> String {
    if dir.ends_with('/') {
        format!("{}{}", dir, name)
    } else {
        format!("{}/{}", dir, name)
    }
}
