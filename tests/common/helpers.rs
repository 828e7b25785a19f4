#![allow(dead_code)]

use futures::future::{BoxFuture, FutureExt};
use persevere::download::{ArchiveSignature, Summary};
use persevere::downloader::{DownloaderBuilder, PowerHint, Sleeper};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver};

// Common test constants
pub const TEST_URL: &str = "https://example.com/file.bin";
pub const TEST_USER_AGENT: &str = "persevere-test-agent";
pub const COMPLETION_TIMEOUT: Duration = Duration::from_secs(10);

/// Install a subscriber once so `RUST_LOG=persevere=debug` shows the engine logs.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Creates a temporary directory for testing purposes
pub fn create_temp_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temporary directory")
}

/// Creates a temporary file with the given content
pub fn create_temp_file(dir: &Path, filename: &str, content: &[u8]) -> PathBuf {
    let file_path = dir.join(filename);
    fs::write(&file_path, content).expect("Failed to write temporary file");
    file_path
}

/// Creates test file content of specified size
pub fn create_test_content(size: usize) -> Vec<u8> {
    (0..size).map(|i| (i % 251) as u8).collect()
}

/// Creates content starting with the ZIP local file header
pub fn create_zip_content(size: usize) -> Vec<u8> {
    let mut content = ArchiveSignature::ZIP_MAGIC.to_vec();
    content.extend(create_test_content(size.saturating_sub(content.len())));
    content
}

/// Asserts that a file exists at the given path
pub fn assert_file_exists(path: &Path) {
    assert!(path.exists(), "File should exist at path: {:?}", path);
}

/// Asserts that no file exists at the given path
pub fn assert_file_missing(path: &Path) {
    assert!(!path.exists(), "File should not exist at path: {:?}", path);
}

/// Asserts that a file has the expected size
pub fn assert_file_size(path: &Path, expected_size: u64) {
    let metadata = fs::metadata(path).expect("Failed to get file metadata");
    assert_eq!(
        metadata.len(),
        expected_size,
        "File size mismatch at path: {:?}",
        path
    );
}

/// Sleeper recording every requested wait and returning at once.
#[derive(Default)]
pub struct RecordingSleeper {
    waits: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    pub fn waits(&self) -> Vec<Duration> {
        self.waits.lock().unwrap().clone()
    }
}

impl Sleeper for RecordingSleeper {
    fn sleep(&self, duration: Duration) -> BoxFuture<'static, ()> {
        self.waits.lock().unwrap().push(duration);
        futures::future::ready(()).boxed()
    }
}

/// Power hint counting its transitions.
#[derive(Default)]
pub struct CountingPowerHint {
    pub acquired: AtomicUsize,
    pub released: AtomicUsize,
}

impl PowerHint for CountingPowerHint {
    fn acquire(&self) {
        self.acquired.fetch_add(1, Ordering::SeqCst);
    }

    fn release(&self) {
        self.released.fetch_add(1, Ordering::SeqCst);
    }
}

/// Builder storing into `dir`, with instant backoff and a completion channel.
pub fn test_builder(
    dir: &Path,
    sleeper: Arc<RecordingSleeper>,
) -> (DownloaderBuilder, UnboundedReceiver<Summary>) {
    let (tx, rx) = unbounded_channel();
    let builder = DownloaderBuilder::new()
        .directory(dir.to_path_buf())
        .user_agent(TEST_USER_AGENT)
        .sleeper(sleeper)
        .on_complete(move |summary| {
            let _ = tx.send(summary.clone());
        });
    (builder, rx)
}

/// Wait for the next terminal summary.
pub async fn next_summary(rx: &mut UnboundedReceiver<Summary>) -> Summary {
    tokio::time::timeout(COMPLETION_TIMEOUT, rx.recv())
        .await
        .expect("Timed out waiting for a download to terminate")
        .expect("Completion channel closed")
}

/// Serve every request with a body shorter than its declared `Content-Length`
/// and close the connection. Returns the base URL.
pub async fn spawn_short_body_server(declared: u64, body: Vec<u8>) -> String {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test listener");
    let addr = listener.local_addr().expect("Listener has no address");

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let body = body.clone();
            tokio::spawn(async move {
                let mut request = Vec::new();
                let mut buf = [0u8; 1024];
                while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                    match socket.read(&mut buf).await {
                        Ok(0) | Err(_) => return,
                        Ok(n) => request.extend_from_slice(&buf[..n]),
                    }
                }
                let head = format!(
                    "HTTP/1.1 200 OK\r\nContent-Type: application/octet-stream\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                    declared
                );
                let _ = socket.write_all(head.as_bytes()).await;
                let _ = socket.write_all(&body).await;
                let _ = socket.flush().await;
                let _ = socket.shutdown().await;
            });
        }
    });

    format!("http://{}", addr)
}
