//! In-memory record of one logical download.
//!
//! A [`DownloadTask`] lives in the registry from `submit` until its attempt
//! sequence terminates. Its identity is the target name, exposed as a
//! [`TaskId`].
//!
//! # Examples
//!
//! ```rust
//! use persevere::download::{DownloadTask, TaskId};
//! use std::convert::TryFrom;
//! use std::path::Path;
//!
//! let id = TaskId::try_from("app-release.apk")?;
//! let url = persevere::download::parse_url("https://example.com/app.apk")?;
//! let task = DownloadTask::new(id, url, Path::new("/tmp/downloads"));
//!
//! assert_eq!(task.partial_path(), Path::new("/tmp/downloads/app-release.apk.tmp"));
//! assert_eq!(task.progress(), 0);
//! assert!(!task.is_cancelled());
//! # Ok::<(), persevere::Error>(())
//! ```

use crate::error::Error;

use reqwest::Url;
use std::convert::TryFrom;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU8, Ordering};
use tokio_util::sync::CancellationToken;

/// Suffix of the staging file next to the final artifact.
pub const PARTIAL_SUFFIX: &str = ".tmp";

/// Identity of a download: its logical (and final file) name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(String);

impl TaskId {
    /// Get the name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for TaskId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<&str> for TaskId {
    type Error = Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        validate_name(value)?;
        Ok(TaskId(value.to_string()))
    }
}

impl TryFrom<String> for TaskId {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        validate_name(&value)?;
        Ok(TaskId(value))
    }
}

/// Check that a name can be used as a plain file name in the download directory.
pub fn validate_name(name: &str) -> Result<(), Error> {
    if name.trim().is_empty() {
        return Err(Error::InvalidName("the name is empty".into()));
    }
    if name == "." || name == ".." {
        return Err(Error::InvalidName(format!(
            "\"{}\" is not a file name",
            name
        )));
    }
    if name.contains(['/', '\\', '\0']) {
        return Err(Error::InvalidName(format!(
            "\"{}\" must not contain path separators",
            name
        )));
    }
    Ok(())
}

/// Parse a source URL, accepting only HTTP and HTTPS.
pub fn parse_url(value: &str) -> Result<Url, Error> {
    let url = Url::parse(value)
        .map_err(|e| Error::InvalidUrl(format!("the url \"{}\" cannot be parsed: {}", value, e)))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        scheme => Err(Error::InvalidUrl(format!(
            "the url \"{}\" uses unsupported scheme \"{}\"",
            value, scheme
        ))),
    }
}

/// Represents a download in flight.
#[derive(Debug)]
pub struct DownloadTask {
    /// Logical name, also the final file name.
    id: TaskId,
    /// URL the download was requested with. Redirects never rewrite it.
    url: Url,
    /// Integer percentage, 0 to 100.
    progress: AtomicU8,
    /// Cancellation flag, set at most once.
    cancel: CancellationToken,
    partial_path: PathBuf,
    final_path: PathBuf,
}

impl DownloadTask {
    /// Creates a new [`DownloadTask`] storing its files under `directory`.
    pub fn new(id: TaskId, url: Url, directory: &Path) -> Self {
        let partial_path = directory.join(format!("{}{}", id.as_str(), PARTIAL_SUFFIX));
        let final_path = directory.join(id.as_str());
        Self {
            id,
            url,
            progress: AtomicU8::new(0),
            cancel: CancellationToken::new(),
            partial_path,
            final_path,
        }
    }

    pub fn id(&self) -> &TaskId {
        &self.id
    }

    pub fn name(&self) -> &str {
        self.id.as_str()
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn partial_path(&self) -> &Path {
        &self.partial_path
    }

    pub fn final_path(&self) -> &Path {
        &self.final_path
    }

    /// Current progress percentage.
    pub fn progress(&self) -> u8 {
        self.progress.load(Ordering::Acquire)
    }

    /// Set the progress percentage, capped at 100.
    pub fn set_progress(&self, percent: u8) {
        self.progress.store(percent.min(100), Ordering::Release);
    }

    /// Record the progress for `bytes` out of a known `total`.
    ///
    /// Does nothing when the total is unknown or zero.
    pub fn record_bytes(&self, bytes: u64, total: Option<u64>) {
        if let Some(total) = total.filter(|t| *t > 0) {
            self.set_progress(percent_of(bytes, total));
        }
    }

    /// Request cancellation. Calling it more than once has no further effect.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Token observed by the attempt sequence at its suspension points.
    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }
}

/// `floor(bytes * 100 / total)`, capped at 100.
pub(crate) fn percent_of(bytes: u64, total: u64) -> u8 {
    if total == 0 {
        return 0;
    }
    let percent = (u128::from(bytes) * 100) / u128::from(total);
    percent.min(100) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task() -> DownloadTask {
        let url = parse_url("https://example.com/file.zip").unwrap();
        DownloadTask::new(
            TaskId::try_from("file.zip").unwrap(),
            url,
            Path::new("/data"),
        )
    }

    #[test]
    fn test_paths() {
        let t = task();
        assert_eq!(t.final_path(), Path::new("/data/file.zip"));
        assert_eq!(t.partial_path(), Path::new("/data/file.zip.tmp"));
        assert_ne!(t.final_path(), t.partial_path());
    }

    #[test]
    fn test_validate_name() {
        assert!(validate_name("app.apk").is_ok());
        assert!(validate_name("").is_err());
        assert!(validate_name("   ").is_err());
        assert!(validate_name("..").is_err());
        assert!(validate_name("../etc/passwd").is_err());
        assert!(validate_name("dir\\file").is_err());
    }

    #[test]
    fn test_parse_url() {
        assert!(parse_url("https://example.com/a.apk").is_ok());
        assert!(parse_url("http://example.com/a.apk").is_ok());
        assert!(matches!(
            parse_url("ftp://example.com/a.apk"),
            Err(Error::InvalidUrl(_))
        ));
        assert!(matches!(parse_url("not a url"), Err(Error::InvalidUrl(_))));
    }

    #[test]
    fn test_progress_floor_and_cap() {
        assert_eq!(percent_of(0, 1000), 0);
        assert_eq!(percent_of(999, 1000), 99);
        assert_eq!(percent_of(1000, 1000), 100);
        assert_eq!(percent_of(5000, 1000), 100);
        assert_eq!(percent_of(10, 0), 0);

        let t = task();
        t.record_bytes(512, Some(1024));
        assert_eq!(t.progress(), 50);
        t.record_bytes(2048, None);
        assert_eq!(t.progress(), 50);
    }

    #[test]
    fn test_cancel_is_sticky() {
        let t = task();
        assert!(!t.is_cancelled());
        t.cancel();
        t.cancel();
        assert!(t.is_cancelled());
        assert!(t.cancellation().is_cancelled());
    }
}
