//! Command output capture

use bytes::Bytes;
use std::path::{Path, PathBuf};
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;

use fl_core::time::capture_header;
use fl_core::HostId;

/// Largest piece of output stored as one capture chunk
pub const CAPTURE_CHUNK_SIZE: usize = 256;

/// Append `data` to `chunks` in pieces of at most [`CAPTURE_CHUNK_SIZE`]
pub(crate) fn split_into(chunks: &mut Vec<Bytes>, mut data: Bytes) {
    while data.len() > CAPTURE_CHUNK_SIZE {
        chunks.push(data.split_to(CAPTURE_CHUNK_SIZE));
    }
    if !data.is_empty() {
        chunks.push(data);
    }
}

/// Log file collecting one host's output
pub(crate) fn capture_path(dir: &Path, host: &HostId) -> PathBuf {
    dir.join(format!("stdout_{}", host.file_stem()))
}

/// Append a timestamped entry: header, primary output, then diagnostics
pub(crate) async fn append(path: &Path, stdout: &[Bytes], stderr: &[Bytes]) -> std::io::Result<()> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .await?;

    file.write_all(capture_header().as_bytes()).await?;
    for chunk in stdout.iter().chain(stderr) {
        file.write_all(chunk).await?;
    }
    file.flush().await
}
