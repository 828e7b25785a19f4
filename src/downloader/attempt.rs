//! One attempt of a task.
//!
//! An attempt is a restart-safe transaction over the partial file: it reads
//! how many bytes are already there, negotiates a range, streams the body
//! and validates the result. It never touches the final file.

use crate::download::{
    check_length, negotiate, reject_error_page, ArchiveSignature, DownloadTask, RangeRequest,
    StreamTransfer,
};
use crate::error::{Error, Result};
use crate::http::resolve;
use crate::storage::Storage;
use crate::utils::{content_range, content_type, declared_length};

use indicatif::ProgressBar;
use reqwest::Url;
use reqwest_middleware::ClientWithMiddleware;
use tracing::debug;

/// Record of a successful attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attempt {
    /// 1-based attempt number.
    pub number: u32,
    /// URL that served the body, after redirects.
    pub url: Url,
    /// Bytes found in the partial file before the attempt.
    pub existing: u64,
    /// `true` when the server honoured the range request.
    pub resuming: bool,
    /// Declared total length, when known.
    pub total: Option<u64>,
    /// Bytes written by this attempt.
    pub transferred: u64,
    /// Length of the partial file after the attempt.
    pub length: u64,
}

/// Everything an attempt needs, borrowed from the downloader.
pub(crate) struct AttemptContext<'a> {
    pub client: &'a ClientWithMiddleware,
    pub storage: &'a Storage,
    pub task: &'a DownloadTask,
    pub bar: &'a ProgressBar,
    pub max_redirects: usize,
    pub chunk_size: usize,
    pub reject_html: bool,
    pub signature: Option<&'a ArchiveSignature>,
}

impl AttemptContext<'_> {
    /// Run attempt `number` against the original URL of the task.
    pub(crate) async fn run(&self, number: u32) -> Result<Attempt> {
        let task = self.task;
        let cancel = task.cancellation();
        let existing = self.storage.partial_len(task.name()).await?;
        let range = RangeRequest::from_existing(existing);
        debug!(
            "Attempt {} for {} with {} bytes on disk",
            number,
            task.name(),
            existing
        );

        let resolved = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(Error::Cancelled),
            resolved = resolve(self.client, task.url(), range, self.max_redirects) => resolved?,
        };

        let headers = resolved.response.headers();
        let plan = negotiate(
            resolved.response.status(),
            declared_length(headers),
            content_range(headers),
            range,
        )?;
        // Error statuses stay retryable even when served as an HTML page.
        if self.reject_html {
            reject_error_page(content_type(headers))?;
        }
        if plan.truncates() {
            task.set_progress(0);
            if existing > 0 {
                debug!("Server ignored the range for {}, restarting", task.name());
            }
        }

        let url = resolved.url;
        let written = StreamTransfer {
            path: task.partial_path(),
            plan,
            chunk_size: self.chunk_size,
            task,
            bar: self.bar,
        }
        .run(resolved.response.bytes_stream())
        .await?;

        let length = self.storage.partial_len(task.name()).await?;
        check_length(length, plan.total)?;

        if let Some(signature) = self.signature {
            signature.verify_or_discard(task.partial_path()).await?;
        }

        Ok(Attempt {
            number,
            url,
            existing,
            resuming: plan.resuming,
            total: plan.total,
            transferred: written - plan.write_offset,
            length,
        })
    }
}
