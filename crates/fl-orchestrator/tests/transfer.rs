//! Push and pull through the copy protocol against the in-memory transport

mod support;

use std::path::{Path, PathBuf};

use fl_core::config::FleetConfig;
use fl_core::error::SessionError;
use fl_core::HostId;
use fl_orchestrator::{Session, TransferStats};
use fl_protocol::ProtocolError;

use support::{FakeConnection, FakeHost, FakeTransport};

async fn connected(host: FakeHost) -> Session<FakeConnection> {
    let transport = FakeTransport::new().with_host("web1", host);
    let mut session = Session::new(HostId::from("web1"), None, "pw");
    session
        .connect(&transport, &FleetConfig::default())
        .await
        .unwrap();
    session
}

fn local_file(dir: &Path, name: &str, contents: &[u8]) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, contents).unwrap();
    path
}

#[tokio::test]
async fn test_push_large_file_arrives_intact() {
    let dir = tempfile::tempdir().unwrap();
    let payload: Vec<u8> = (0..20000u32).map(|i| (i % 251) as u8).collect();
    let file = local_file(dir.path(), "blob.bin", &payload);

    let host = FakeHost::new("pw");
    let fs = host.fs();
    let mut session = connected(host).await;

    let stats = session.push(&[file], "/srv/drop", true).await.unwrap();

    assert_eq!(
        stats,
        TransferStats {
            files: 1,
            skipped: 0,
            bytes: 20000
        }
    );
    assert_eq!(fs.lock().unwrap()["/srv/drop/blob.bin"], payload);
}

#[tokio::test]
async fn test_push_names_with_spaces() {
    let dir = tempfile::tempdir().unwrap();
    let a = local_file(dir.path(), "quarterly report.csv", b"a,b\n");
    let b = local_file(dir.path(), "notes.txt", b"");

    let host = FakeHost::new("pw");
    let fs = host.fs();
    let mut session = connected(host).await;

    let stats = session.push(&[a, b], "/srv/drop/", true).await.unwrap();

    assert_eq!(stats.files, 2);
    let fs = fs.lock().unwrap();
    assert_eq!(fs["/srv/drop/quarterly report.csv"], b"a,b\n");
    assert!(fs["/srv/drop/notes.txt"].is_empty());
}

#[tokio::test]
async fn test_push_without_overwrite_skips_existing() {
    let dir = tempfile::tempdir().unwrap();
    let old = local_file(dir.path(), "app.conf", b"new contents");
    let fresh = local_file(dir.path(), "extra.conf", b"extra");

    let host = FakeHost::new("pw").with_file("/etc/app/app.conf", b"old contents");
    let fs = host.fs();
    let mut session = connected(host).await;

    let stats = session
        .push(&[old, fresh], "/etc/app", false)
        .await
        .unwrap();

    assert_eq!(stats.files, 1);
    assert_eq!(stats.skipped, 1);
    let fs = fs.lock().unwrap();
    assert_eq!(fs["/etc/app/app.conf"], b"old contents");
    assert_eq!(fs["/etc/app/extra.conf"], b"extra");
}

#[tokio::test]
async fn test_push_with_overwrite_replaces_existing() {
    let dir = tempfile::tempdir().unwrap();
    let file = local_file(dir.path(), "app.conf", b"new contents");

    let host = FakeHost::new("pw").with_file("/etc/app/app.conf", b"old contents");
    let fs = host.fs();
    let mut session = connected(host).await;

    session.push(&[file], "/etc/app", true).await.unwrap();

    assert_eq!(fs.lock().unwrap()["/etc/app/app.conf"], b"new contents");
}

#[tokio::test]
async fn test_push_missing_local_file_aborts() {
    let dir = tempfile::tempdir().unwrap();
    let present = local_file(dir.path(), "a.txt", b"a");
    let missing = dir.path().join("missing.txt");
    let after = local_file(dir.path(), "b.txt", b"b");

    let host = FakeHost::new("pw");
    let fs = host.fs();
    let mut session = connected(host).await;

    let err = session
        .push(&[present, missing, after], "/tmp", true)
        .await
        .unwrap_err();

    assert!(matches!(err, SessionError::Io(_)));
    let fs = fs.lock().unwrap();
    assert!(fs.contains_key("/tmp/a.txt"));
    assert!(!fs.contains_key("/tmp/b.txt"));
}

#[tokio::test]
async fn test_push_rejects_directories() {
    let dir = tempfile::tempdir().unwrap();
    let mut session = connected(FakeHost::new("pw")).await;

    let err = session
        .push(&[dir.path().to_path_buf()], "/tmp", true)
        .await
        .unwrap_err();

    assert!(matches!(err, SessionError::InvalidPath(_)));
}

#[tokio::test]
async fn test_pull_single_file() {
    let dir = tempfile::tempdir().unwrap();
    let host = FakeHost::new("pw").with_pull_script(b"C0644 6 hosts\nlocal\n\x00");
    let mut session = connected(host).await;

    let stats = session.pull("/etc/hosts", dir.path(), None).await.unwrap();

    assert_eq!(stats.files, 1);
    assert_eq!(std::fs::read(dir.path().join("hosts")).unwrap(), b"local\n");
}

#[tokio::test]
async fn test_pull_large_file_in_chunks() {
    let dir = tempfile::tempdir().unwrap();
    let mut script = b"C0600 40000 dump.sql\n".to_vec();
    script.extend(std::iter::repeat(b'q').take(40000));
    script.push(0);
    let mut session = connected(FakeHost::new("pw").with_pull_script(&script)).await;

    let stats = session.pull("/var/dump.sql", dir.path(), None).await.unwrap();

    assert_eq!(stats.bytes, 40000);
    let pulled = std::fs::read(dir.path().join("dump.sql")).unwrap();
    assert_eq!(pulled.len(), 40000);
    assert!(pulled.iter().all(|&b| b == b'q'));
}

#[tokio::test]
async fn test_pull_directory_tree() {
    let dir = tempfile::tempdir().unwrap();
    let host = FakeHost::new("pw").with_pull_script(
        b"D0755 0 logs\nC0644 2 a.log\na\n\x00D0755 0 old\nC0644 2 b.log\nb\n\x00E\nE\n",
    );
    let mut session = connected(host).await;

    let stats = session.pull("/var/logs", dir.path(), None).await.unwrap();

    assert_eq!(stats.files, 2);
    assert_eq!(std::fs::read(dir.path().join("logs/a.log")).unwrap(), b"a\n");
    assert_eq!(std::fs::read(dir.path().join("logs/old/b.log")).unwrap(), b"b\n");
}

#[tokio::test]
async fn test_pull_with_exact_name() {
    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("web1-hosts");
    let host = FakeHost::new("pw").with_pull_script(b"C0644 3 hosts\nabc\x00");
    let mut session = connected(host).await;

    session
        .pull("/etc/hosts", dir.path(), Some(&target))
        .await
        .unwrap();

    assert_eq!(std::fs::read(&target).unwrap(), b"abc");
    assert!(!dir.path().join("hosts").exists());
}

#[tokio::test]
async fn test_pull_tree_with_exact_name_creates_no_directories() {
    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("latest.log");
    let host = FakeHost::new("pw").with_pull_script(
        b"D0755 0 logs\nC0644 2 a.log\na\n\x00D0755 0 old\nC0644 2 b.log\nb\n\x00E\nE\n",
    );
    let mut session = connected(host).await;

    let stats = session
        .pull("/var/logs", dir.path(), Some(&target))
        .await
        .unwrap();

    assert_eq!(stats.files, 2);
    assert_eq!(std::fs::read(&target).unwrap(), b"b\n");
    assert!(!dir.path().join("logs").exists());
}

#[tokio::test]
async fn test_pull_nothing_succeeds() {
    let dir = tempfile::tempdir().unwrap();
    let mut session = connected(FakeHost::new("pw")).await;

    let stats = session.pull("/empty", dir.path(), None).await.unwrap();

    assert_eq!(stats, TransferStats::default());
}

#[tokio::test]
async fn test_pull_warning_does_not_stop() {
    let dir = tempfile::tempdir().unwrap();
    let host = FakeHost::new("pw")
        .with_pull_script(b"\x01scp: /srv/sock: not a regular file\nC0644 1 a\nx\x00");
    let mut session = connected(host).await;

    let stats = session.pull("/srv", dir.path(), None).await.unwrap();

    assert_eq!(stats.files, 1);
    assert_eq!(std::fs::read(dir.path().join("a")).unwrap(), b"x");
}

#[tokio::test]
async fn test_pull_error_after_files_fails() {
    let dir = tempfile::tempdir().unwrap();
    let host = FakeHost::new("pw")
        .with_pull_script(b"C0644 3 a\nabc\x00\x02scp: /srv/b: Permission denied\n");
    let mut session = connected(host).await;

    let err = session.pull("/srv", dir.path(), None).await.unwrap_err();

    assert!(matches!(
        err,
        SessionError::Transfer(ProtocolError::RemoteError(ref msg)) if msg.contains("Permission denied")
    ));
    // Files received before the error stay on disk
    assert_eq!(std::fs::read(dir.path().join("a")).unwrap(), b"abc");
}

#[tokio::test]
async fn test_pull_truncated_file_leaves_partial() {
    let dir = tempfile::tempdir().unwrap();
    let host = FakeHost::new("pw").with_pull_script(b"C0644 10 big\nhel");
    let mut session = connected(host).await;

    let err = session.pull("/srv/big", dir.path(), None).await.unwrap_err();

    assert!(matches!(
        err,
        SessionError::Transfer(ProtocolError::UnexpectedEof)
    ));
    assert_eq!(std::fs::read(dir.path().join("big")).unwrap(), b"hel");
}
