//! Builder pattern implementation for creating Downloader instances.
//!
//! # Examples
//!
//! ## Basic Builder Usage
//!
//! ```rust
//! use persevere::downloader::DownloaderBuilder;
//! use std::path::PathBuf;
//!
//! # fn example() -> Result<(), persevere::Error> {
//! let downloader = DownloaderBuilder::new()
//!     .directory(PathBuf::from("./downloads"))
//!     .concurrent_downloads(2)
//!     .max_attempts(5)
//!     .build()?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Validating APK Artifacts
//!
//! ```rust
//! use persevere::download::{ArchiveSignature, Status};
//! use persevere::downloader::DownloaderBuilder;
//!
//! # fn example() -> Result<(), persevere::Error> {
//! let downloader = DownloaderBuilder::new()
//!     .archive_signature(ArchiveSignature::zip())
//!     .scan_exclusion_marker(true)
//!     .on_complete(|summary| {
//!         if let Status::Fail(msg) = summary.status() {
//!             eprintln!("{} failed: {}", summary.id(), msg);
//!         }
//!     })
//!     .build()?;
//! # Ok(())
//! # }
//! ```

use super::config::DownloaderConfig;
use super::downloader::Downloader;
use super::power::PowerHint;
use super::retry::Sleeper;
use crate::download::{ArchiveSignature, Summary};
use crate::error::Result;
use crate::progress::StyleOptions;

use reqwest::header::{HeaderMap, HeaderValue, IntoHeaderName};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// A builder used to create a [`Downloader`].
///
/// ```rust
/// # fn main() -> Result<(), persevere::Error> {
/// use persevere::downloader::DownloaderBuilder;
///
/// let d = DownloaderBuilder::new().max_attempts(5).directory("downloads".into()).build()?;
/// # Ok(())
/// # }
/// ```
#[derive(Default)]
pub struct DownloaderBuilder {
    config: DownloaderConfig,
}

impl DownloaderBuilder {
    /// Creates a builder with the default options. Progress bars are hidden.
    pub fn new() -> Self {
        DownloaderBuilder::default()
    }

    /// Convenience function to show the progress bars.
    pub fn visible() -> Self {
        let mut builder = DownloaderBuilder::default();
        builder.config.style_options = StyleOptions::default();
        builder
    }

    /// Sets the directory where to store the downloads.
    pub fn directory(mut self, directory: PathBuf) -> Self {
        self.config.directory = directory;
        self
    }

    /// Set the number of tasks allowed to transfer at the same time.
    pub fn concurrent_downloads(mut self, concurrent_downloads: usize) -> Self {
        self.config.concurrent_downloads = concurrent_downloads;
        self
    }

    /// Set the number of attempts per task.
    pub fn max_attempts(mut self, max_attempts: u32) -> Self {
        self.config.max_attempts = max_attempts;
        self
    }

    /// Set the backoff step: the wait before attempt `n` is `(n - 1) * step`.
    pub fn backoff_step(mut self, step: Duration) -> Self {
        self.config.backoff_step = step;
        self
    }

    /// Set the number of requests one attempt may issue while following redirects.
    pub fn max_redirects(mut self, max_redirects: usize) -> Self {
        self.config.max_redirects = max_redirects;
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout = timeout;
        self
    }

    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.config.read_timeout = timeout;
        self
    }

    /// Set the largest slice written between two cancellation checks.
    pub fn chunk_size(mut self, chunk_size: usize) -> Self {
        self.config.chunk_size = chunk_size;
        self
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.user_agent = user_agent.into();
        self
    }

    pub fn proxy(mut self, proxy: reqwest::Proxy) -> Self {
        self.config.proxy = Some(proxy);
        self
    }

    /// Refuse (or accept) responses whose content type is HTML.
    pub fn reject_html(mut self, reject: bool) -> Self {
        self.config.reject_html = reject;
        self
    }

    /// Require every artifact to carry `signature` before it is committed.
    pub fn archive_signature(mut self, signature: ArchiveSignature) -> Self {
        self.config.archive_signature = Some(signature);
        self
    }

    /// Drop a `.nomedia` marker in the download directory.
    pub fn scan_exclusion_marker(mut self, enabled: bool) -> Self {
        self.config.scan_exclusion_marker = enabled;
        self
    }

    /// Set the downloader style options.
    pub fn style_options(mut self, style_options: StyleOptions) -> Self {
        self.config.style_options = style_options;
        self
    }

    /// Set callback for when each task terminates.
    ///
    /// The callback runs once per task, after the task has left the
    /// registry, whatever the outcome.
    pub fn on_complete<F>(mut self, callback: F) -> Self
    where
        F: Fn(&Summary) + Send + Sync + 'static,
    {
        self.config.on_complete = Some(Arc::new(Box::new(callback)));
        self
    }

    /// Replace the timer used for backoff waits.
    pub fn sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.config.sleeper = sleeper;
        self
    }

    pub fn power_hint(mut self, power_hint: Arc<dyn PowerHint>) -> Self {
        self.config.power_hint = power_hint;
        self
    }

    /// Helper method to get or create a new HeaderMap.
    fn new_header(&self) -> HeaderMap {
        match self.config.headers {
            Some(ref h) => h.to_owned(),
            _ => HeaderMap::new(),
        }
    }

    /// Add the http headers.
    ///
    /// You can call `.headers()` multiple times and all `HeaderMap` will be merged into a single one.
    ///
    /// See also [`header()`].
    ///
    /// [`header()`]: DownloaderBuilder::header
    pub fn headers(mut self, headers: HeaderMap) -> Self {
        let mut new = self.new_header();
        new.extend(headers);

        self.config.headers = Some(new);
        self
    }

    /// Add the http header
    ///
    /// ```
    /// use reqwest::header::{self, HeaderValue};
    /// use persevere::downloader::DownloaderBuilder;
    ///
    /// let auth = HeaderValue::from_static("Basic aGk6MTIzNDU2Cg==");
    ///
    /// let builder = DownloaderBuilder::new()
    ///     .header(header::AUTHORIZATION, auth)
    ///     .header(header::ACCEPT, HeaderValue::from_static("*/*"));
    /// ```
    pub fn header<K: IntoHeaderName>(mut self, name: K, value: HeaderValue) -> Self {
        let mut new = self.new_header();

        new.insert(name, value);

        self.config.headers = Some(new);
        self
    }

    /// Get a reference to the configuration assembled so far.
    pub fn config(&self) -> &DownloaderConfig {
        &self.config
    }

    /// Create the [`Downloader`] with the specified options.
    ///
    /// Fails when the HTTP client cannot be constructed.
    pub fn build(self) -> Result<Downloader> {
        Downloader::new(self.config)
    }
}
