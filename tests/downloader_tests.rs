//! Tests for the downloader facade and its builder.

use persevere::downloader::{
    DownloaderBuilder, DownloaderConfig, DEFAULT_CONCURRENT_DOWNLOADS, DEFAULT_MAX_ATTEMPTS,
};
use persevere::download::ArchiveSignature;
use persevere::http::{DEFAULT_MAX_REDIRECTS, DEFAULT_USER_AGENT};
use persevere::Error;

use reqwest::header::{HeaderValue, ACCEPT, AUTHORIZATION};
use std::sync::Arc;
use std::time::Duration;

mod common;
use common::helpers::*;

#[test]
fn test_config_defaults() {
    let config = DownloaderConfig::default();
    assert_eq!(config.concurrent_downloads, DEFAULT_CONCURRENT_DOWNLOADS);
    assert_eq!(config.concurrent_downloads, 3);
    assert_eq!(config.max_attempts, DEFAULT_MAX_ATTEMPTS);
    assert_eq!(config.backoff_step, Duration::from_millis(2000));
    assert_eq!(config.max_redirects, DEFAULT_MAX_REDIRECTS);
    assert_eq!(config.connect_timeout, Duration::from_secs(15));
    assert_eq!(config.read_timeout, Duration::from_secs(15));
    assert_eq!(config.chunk_size, 16 * 1024);
    assert_eq!(config.user_agent, DEFAULT_USER_AGENT);
    assert!(config.reject_html);
    assert!(config.archive_signature.is_none());
    assert!(!config.scan_exclusion_marker);
    assert!(!config.style_options.is_enabled());
    assert!(config.on_complete.is_none());
}

#[test]
fn test_builder_options() {
    let dir = create_temp_dir();
    let builder = DownloaderBuilder::new()
        .directory(dir.path().to_path_buf())
        .concurrent_downloads(5)
        .max_attempts(7)
        .backoff_step(Duration::from_millis(10))
        .max_redirects(4)
        .chunk_size(1024)
        .reject_html(false)
        .archive_signature(ArchiveSignature::zip())
        .header(AUTHORIZATION, HeaderValue::from_static("Bearer token"))
        .header(ACCEPT, HeaderValue::from_static("*/*"));

    let config = builder.config();
    assert_eq!(config.max_redirects, 4);
    assert_eq!(config.chunk_size, 1024);
    assert!(!config.reject_html);
    assert_eq!(config.headers.as_ref().map(|h| h.len()), Some(2));

    let downloader = builder.build().unwrap();
    assert_eq!(downloader.directory(), dir.path());
    assert_eq!(downloader.concurrent_downloads(), 5);
    assert_eq!(downloader.max_attempts(), 7);
}

#[test]
fn test_visible_builder_enables_progress() {
    assert!(DownloaderBuilder::visible().config().style_options.is_enabled());
    assert!(!DownloaderBuilder::new().config().style_options.is_enabled());
}

#[test]
fn test_zero_limits_are_clamped() {
    let downloader = DownloaderBuilder::new()
        .concurrent_downloads(0)
        .max_attempts(0)
        .build()
        .unwrap();
    assert_eq!(downloader.concurrent_downloads(), 1);
    assert_eq!(downloader.max_attempts(), 1);
}

#[tokio::test]
async fn test_submit_rejects_invalid_input() {
    let dir = create_temp_dir();
    let (builder, _rx) = test_builder(dir.path(), Arc::default());
    let downloader = builder.build().unwrap();

    assert!(matches!(
        downloader.submit("", TEST_URL),
        Err(Error::InvalidName(_))
    ));
    assert!(matches!(
        downloader.submit("../escape.bin", TEST_URL),
        Err(Error::InvalidName(_))
    ));
    assert!(matches!(
        downloader.submit("file.bin", "ftp://example.com/file.bin"),
        Err(Error::InvalidUrl(_))
    ));
    assert!(matches!(
        downloader.submit("file.bin", "not a url"),
        Err(Error::InvalidUrl(_))
    ));
    assert!(downloader.active_downloads().is_empty());
}

#[test]
fn test_submit_outside_runtime_fails() {
    let downloader = DownloaderBuilder::new().build().unwrap();
    assert!(matches!(
        downloader.submit("file.bin", TEST_URL),
        Err(Error::Internal(_))
    ));
    assert!(!downloader.is_active("file.bin"));
}

#[tokio::test]
async fn test_clones_share_registry() {
    let dir = create_temp_dir();
    let (builder, mut rx) = test_builder(dir.path(), Arc::default());
    let downloader = builder
        .connect_timeout(Duration::from_millis(200))
        .max_attempts(1)
        .build()
        .unwrap();
    let clone = downloader.clone();

    // Port 9 (discard) is closed on test machines: the attempt fails fast.
    let id = downloader
        .submit("shared.bin", "http://127.0.0.1:9/shared.bin")
        .unwrap();
    assert_eq!(clone.submit("shared.bin", "http://127.0.0.1:9/other").unwrap(), id);

    next_summary(&mut rx).await;
    assert!(!clone.is_active("shared.bin"));
}

#[tokio::test]
async fn test_invalid_names_are_never_active() {
    let downloader = DownloaderBuilder::new().build().unwrap();
    assert!(!downloader.is_active(""));
    assert!(!downloader.cancel(&"x.bin".try_into().unwrap()));
    assert!(matches!(
        downloader.delete_artifact("a/b").await,
        Err(Error::InvalidName(_))
    ));
}

#[test]
fn test_debug_output() {
    let downloader = DownloaderBuilder::new().build().unwrap();
    let debug = format!("{:?}", downloader);
    assert!(debug.contains("Downloader"));
    assert!(debug.contains("concurrent_downloads"));
}
