//! Configuration structures and defaults for the downloader.
//!
//! [`DownloaderConfig`] holds every knob of a [`Downloader`](super::Downloader).
//! It is normally assembled through the
//! [`DownloaderBuilder`](super::DownloaderBuilder).
//!
//! # Examples
//!
//! ## Using Callbacks
//!
//! ```rust
//! use persevere::downloader::CompletionCallback;
//! use persevere::download::{Status, Summary};
//!
//! let callback: CompletionCallback = Box::new(|summary: &Summary| {
//!     match summary.status() {
//!         Status::Success => println!("✓ Downloaded: {}", summary.id()),
//!         Status::Fail(msg) => println!("✗ Failed: {} - {}", summary.id(), msg),
//!         Status::Exhausted(msg) => println!("⚠ Gave up: {} - {}", summary.id(), msg),
//!         Status::Cancelled => println!("- Cancelled: {}", summary.id()),
//!     }
//! });
//! ```

use super::power::{NoopPowerHint, PowerHint};
use super::retry::{Sleeper, TokioSleeper, DEFAULT_BACKOFF_STEP, DEFAULT_MAX_ATTEMPTS};
use crate::download::{ArchiveSignature, Summary, DEFAULT_CHUNK_SIZE};
use crate::http::{DEFAULT_MAX_REDIRECTS, DEFAULT_TIMEOUT, DEFAULT_USER_AGENT};
use crate::progress::StyleOptions;

use reqwest::header::HeaderMap;
use std::env::current_dir;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Callback type for task completion events.
pub type CompletionCallback = Box<dyn Fn(&Summary) + Send + Sync>;

/// Default size of the worker pool.
pub const DEFAULT_CONCURRENT_DOWNLOADS: usize = 3;

/// Configuration structure for the downloader
#[derive(Clone)]
pub struct DownloaderConfig {
    /// Directory where partial and final files are stored.
    pub directory: PathBuf,
    /// Number of tasks transferring at the same time.
    pub concurrent_downloads: usize,
    /// Attempts per task, including the first one.
    pub max_attempts: u32,
    /// Linear backoff step between attempts.
    pub backoff_step: Duration,
    /// Requests one attempt may issue while following redirects.
    pub max_redirects: usize,
    pub connect_timeout: Duration,
    pub read_timeout: Duration,
    /// Largest slice written between two cancellation checks.
    pub chunk_size: usize,
    pub user_agent: String,
    /// Custom HTTP headers.
    pub headers: Option<HeaderMap>,
    pub proxy: Option<reqwest::Proxy>,
    /// Refuse HTML responses before reading their body.
    pub reject_html: bool,
    /// Signature every artifact must carry before it is committed.
    pub archive_signature: Option<ArchiveSignature>,
    /// Drop a `.nomedia` marker in the download directory.
    pub scan_exclusion_marker: bool,
    /// Downloader style options.
    pub style_options: StyleOptions,
    /// Callback for when each task terminates.
    pub on_complete: Option<Arc<CompletionCallback>>,
    pub sleeper: Arc<dyn Sleeper>,
    pub power_hint: Arc<dyn PowerHint>,
}

impl std::fmt::Debug for DownloaderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DownloaderConfig")
            .field("directory", &self.directory)
            .field("concurrent_downloads", &self.concurrent_downloads)
            .field("max_attempts", &self.max_attempts)
            .field("backoff_step", &self.backoff_step)
            .field("max_redirects", &self.max_redirects)
            .field("connect_timeout", &self.connect_timeout)
            .field("read_timeout", &self.read_timeout)
            .field("chunk_size", &self.chunk_size)
            .field("user_agent", &self.user_agent)
            .field("headers", &self.headers)
            .field("proxy", &self.proxy.is_some())
            .field("reject_html", &self.reject_html)
            .field("archive_signature", &self.archive_signature)
            .field("scan_exclusion_marker", &self.scan_exclusion_marker)
            .field("style_options", &self.style_options)
            .field("on_complete", &self.on_complete.is_some())
            .finish()
    }
}

impl Default for DownloaderConfig {
    fn default() -> Self {
        Self {
            directory: current_dir().unwrap_or_default(),
            concurrent_downloads: DEFAULT_CONCURRENT_DOWNLOADS,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            backoff_step: DEFAULT_BACKOFF_STEP,
            max_redirects: DEFAULT_MAX_REDIRECTS,
            connect_timeout: DEFAULT_TIMEOUT,
            read_timeout: DEFAULT_TIMEOUT,
            chunk_size: DEFAULT_CHUNK_SIZE,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            headers: None,
            proxy: None,
            reject_html: true,
            archive_signature: None,
            scan_exclusion_marker: false,
            style_options: StyleOptions::hidden(),
            on_complete: None,
            sleeper: Arc::new(TokioSleeper),
            power_hint: Arc::new(NoopPowerHint),
        }
    }
}
