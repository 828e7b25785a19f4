//! Low-level streaming into the partial file.
//!
//! [`StreamTransfer`] copies a body stream into the partial file in slices
//! of at most `chunk_size` bytes. The cancellation token is checked at
//! every slice boundary. It is also raced against every wait on the
//! network, so a stalled read is dropped and the connection torn down.

use super::range::Negotiated;
use super::task::DownloadTask;
use crate::error::{Error, Result};

use futures::{Stream, StreamExt};
use indicatif::ProgressBar;
use std::path::Path;
use tokio::fs::{File, OpenOptions};
use tokio::io::{AsyncSeekExt, AsyncWriteExt, SeekFrom};
use tracing::debug;

/// Default slice size, matching a 16 KiB copy buffer.
pub const DEFAULT_CHUNK_SIZE: usize = 16 * 1024;

/// One copy of a response body into a partial file.
pub struct StreamTransfer<'a> {
    /// Partial file to write.
    pub path: &'a Path,
    /// Offset and total decided by the range negotiation.
    pub plan: Negotiated,
    /// Largest slice written between two cancellation checks.
    pub chunk_size: usize,
    /// Task receiving progress and providing the cancellation token.
    pub task: &'a DownloadTask,
    /// Byte-level progress bar; hidden unless progress display is enabled.
    pub bar: &'a ProgressBar,
}

impl StreamTransfer<'_> {
    /// Copy `stream` into the partial file and return its final length.
    ///
    /// The file is flushed and synced to storage before this returns
    /// successfully. On cancellation or a failing body the bytes already
    /// written are flushed and kept for a later resume before the error
    /// ([`Error::Cancelled`] or the body error) is returned.
    pub async fn run<S, B, E>(self, stream: S) -> Result<u64>
    where
        S: Stream<Item = std::result::Result<B, E>>,
        B: AsRef<[u8]>,
        E: Into<Error>,
    {
        let mut file = self.open().await?;
        let cancel = self.task.cancellation();
        let chunk_size = self.chunk_size.max(1);
        let mut written = self.plan.write_offset;

        self.task.record_bytes(written, self.plan.total);
        self.bar.set_length(self.plan.total.unwrap_or(0));
        self.bar.set_position(written);

        debug!("Retrieving chunks into {:?} from offset {}", self.path, written);
        futures::pin_mut!(stream);
        loop {
            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => None,
                next = stream.next() => Some(next),
            };
            let item = match next {
                None => return Self::interrupted(file, Error::Cancelled).await,
                Some(None) => break,
                Some(Some(item)) => item,
            };
            let bytes = match item {
                Ok(bytes) => bytes,
                Err(e) => return Self::interrupted(file, e.into()).await,
            };

            for slice in bytes.as_ref().chunks(chunk_size) {
                if cancel.is_cancelled() {
                    return Self::interrupted(file, Error::Cancelled).await;
                }
                file.write_all(slice).await?;
                written += slice.len() as u64;
                self.task.record_bytes(written, self.plan.total);
                self.bar.set_position(written);
            }
        }

        file.flush().await?;
        file.sync_all().await?;
        drop(file);

        debug!("Stream finished with {} bytes in {:?}", written, self.path);
        Ok(written)
    }

    /// Open the partial file positioned at the negotiated offset.
    async fn open(&self) -> Result<File> {
        let mut file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(self.path)
            .await?;

        if self.plan.truncates() {
            file.set_len(0).await?;
        } else {
            // Drop any stray bytes past the offset the server agreed to.
            file.set_len(self.plan.write_offset).await?;
            file.seek(SeekFrom::Start(self.plan.write_offset)).await?;
        }
        Ok(file)
    }

    /// Settle everything written so far, then fail with `error`.
    async fn interrupted(mut file: File, error: Error) -> Result<u64> {
        file.flush().await?;
        file.sync_all().await?;
        Err(error)
    }
}
