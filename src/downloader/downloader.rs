//! Core downloader implementation.
//!
//! A [`Downloader`] owns the task registry, the worker pool and the HTTP
//! client. [`Downloader::submit`] returns as soon as the task is
//! registered; the attempt sequence then runs on its own Tokio task.
//!
//! # Examples
//!
//! ```rust,no_run
//! use persevere::download::State;
//! use persevere::downloader::DownloaderBuilder;
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), persevere::Error> {
//! let downloader = DownloaderBuilder::new().directory("downloads".into()).build()?;
//! let id = downloader.submit("app.apk", "https://example.com/app.apk")?;
//!
//! loop {
//!     let status = downloader.status(&id).await;
//!     if status.state != State::Running {
//!         println!("{} finished as {}", id, status.state);
//!         break;
//!     }
//!     println!("{}: {}%", id, status.progress);
//!     tokio::time::sleep(Duration::from_millis(500)).await;
//! }
//! # Ok(())
//! # }
//! ```

use super::attempt::AttemptContext;
use super::config::DownloaderConfig;
use super::registry::{Registration, TaskRegistry};
use super::retry::{Backoff, Outcome, RetryController};
use crate::download::{
    parse_url, validate_name, ArchiveSignature, DownloadTask, Status, Summary, TaskId, TaskStatus,
};
use crate::error::{Error, Result};
use crate::http::{create_http_client, HttpClientConfig};
use crate::progress::ProgressDisplay;
use crate::storage::Storage;

use indicatif::ProgressBar;
use reqwest_middleware::ClientWithMiddleware;
use std::convert::TryFrom;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::Semaphore;
use tracing::{debug, info, info_span, warn, Instrument};

/// Number of readability checks made by [`Downloader::verify_artifact`].
pub const VERIFY_CHECKS: u32 = 5;

/// Pause between two readability checks.
pub const VERIFY_INTERVAL: Duration = Duration::from_millis(200);

/// Represents the download controller.
///
/// Cloning is cheap; clones share the same registry and worker pool.
#[derive(Clone)]
pub struct Downloader {
    inner: Arc<Inner>,
}

struct Inner {
    config: DownloaderConfig,
    client: ClientWithMiddleware,
    storage: Storage,
    registry: TaskRegistry,
    permits: Arc<Semaphore>,
    retry: RetryController,
    progress: ProgressDisplay,
}

impl fmt::Debug for Downloader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Downloader")
            .field("config", &self.inner.config)
            .field("registry", &self.inner.registry)
            .finish()
    }
}

impl Downloader {
    /// Creates a new Downloader with the given configuration.
    pub(crate) fn new(config: DownloaderConfig) -> Result<Self> {
        let client = create_http_client(HttpClientConfig {
            proxy: config.proxy.clone(),
            headers: config.headers.clone(),
            user_agent: config.user_agent.clone(),
            connect_timeout: config.connect_timeout,
            read_timeout: config.read_timeout,
        })
        .map_err(|e| Error::Internal(format!("unable to build the HTTP client: {}", e)))?;

        let storage = Storage::new(config.directory.clone())
            .with_scan_exclusion_marker(config.scan_exclusion_marker);
        let registry = TaskRegistry::new(config.power_hint.clone());
        let permits = Arc::new(Semaphore::new(config.concurrent_downloads.max(1)));
        let retry = RetryController::new(config.max_attempts, Backoff::linear(config.backoff_step));
        let progress = ProgressDisplay::new(config.style_options.clone());

        Ok(Self {
            inner: Arc::new(Inner {
                config,
                client,
                storage,
                registry,
                permits,
                retry,
                progress,
            }),
        })
    }

    /// Gets the directory where files are stored.
    pub fn directory(&self) -> &Path {
        self.inner.storage.directory()
    }

    /// Gets the number of tasks allowed to transfer at the same time.
    pub fn concurrent_downloads(&self) -> usize {
        self.inner.config.concurrent_downloads.max(1)
    }

    /// Gets the number of attempts per task.
    pub fn max_attempts(&self) -> u32 {
        self.inner.retry.max_attempts()
    }

    pub fn config(&self) -> &DownloaderConfig {
        &self.inner.config
    }

    /// Start downloading `url` into the file `name`.
    ///
    /// Returns at once. When a task with the same name is already active,
    /// its id is returned and nothing new is started. Must be called from
    /// within a Tokio runtime.
    pub fn submit(&self, name: &str, url: &str) -> Result<TaskId> {
        let id = TaskId::try_from(name)?;
        let url = parse_url(url)?;
        let handle = Handle::try_current()
            .map_err(|e| Error::Internal(format!("no Tokio runtime to run the download: {}", e)))?;

        let task = DownloadTask::new(id.clone(), url, self.inner.storage.directory());
        match self.inner.registry.register(task) {
            Registration::Existing(_) => {
                debug!("{} is already being downloaded", id);
            }
            Registration::Created(task) => {
                info!("Queued {} from {}", id, task.url());
                let this = self.clone();
                handle.spawn(this.drive(task));
            }
        }
        Ok(id)
    }

    /// Report the state of `id`.
    ///
    /// Once no task is active under that name, the answer is derived from
    /// the final file alone.
    pub async fn status(&self, id: &TaskId) -> TaskStatus {
        if let Some(task) = self.inner.registry.get(id) {
            return match task.is_cancelled() {
                true => TaskStatus::failed(task.progress()),
                false => TaskStatus::running(task.progress()),
            };
        }

        match self.inner.storage.artifact_len(id.as_str()).await {
            Ok(Some(len)) if len > 0 => TaskStatus::successful(),
            Ok(_) => TaskStatus::failed(0),
            Err(e) => {
                warn!("Unable to inspect the artifact of {}: {}", id, e);
                TaskStatus::failed(0)
            }
        }
    }

    /// Request cancellation of the active task `id`.
    ///
    /// Returns `false` when no task is active under that name.
    pub fn cancel(&self, id: &TaskId) -> bool {
        match self.inner.registry.get(id) {
            Some(task) => {
                info!("Cancelling {}", id);
                task.cancel();
                true
            }
            None => false,
        }
    }

    /// Remove the final file of `name`, if any.
    pub async fn delete_artifact(&self, name: &str) -> Result<()> {
        validate_name(name)?;
        self.inner.storage.delete_artifact(name).await
    }

    /// Hand over the final file of `name` once it is readable and intact.
    ///
    /// Waits up to [`VERIFY_CHECKS`] × [`VERIFY_INTERVAL`] for the file to
    /// become readable, then checks its archive signature: the configured
    /// one, or the ZIP signature when none is configured. A file failing the
    /// check is deleted.
    pub async fn verify_artifact(&self, name: &str) -> Result<PathBuf> {
        validate_name(name)?;
        let path = self.inner.storage.final_path(name);

        let mut readable = false;
        for check in 1..=VERIFY_CHECKS {
            if tokio::fs::File::open(&path).await.is_ok() {
                readable = true;
                break;
            }
            if check < VERIFY_CHECKS {
                self.inner.config.sleeper.sleep(VERIFY_INTERVAL).await;
            }
        }
        if !readable {
            return Err(Error::MissingArtifact(path));
        }

        let path = tokio::fs::canonicalize(&path).await?;
        let zip = ArchiveSignature::zip();
        let signature = self.inner.config.archive_signature.as_ref().unwrap_or(&zip);
        signature.verify_or_discard(&path).await?;
        Ok(path)
    }

    /// Returns `true` while a task named `name` is active.
    pub fn is_active(&self, name: &str) -> bool {
        TaskId::try_from(name)
            .map(|id| self.inner.registry.contains(&id))
            .unwrap_or(false)
    }

    /// Names of the active tasks.
    pub fn active_downloads(&self) -> Vec<TaskId> {
        self.inner.registry.ids()
    }

    /// Run a task from queueing to removal.
    async fn drive(self, task: Arc<DownloadTask>) {
        let span = info_span!("download", name = %task.name());
        async move {
            let bar = self.inner.progress.add_task(task.name());
            let summary = self.run_sequence(&task, &bar).await;

            self.inner.registry.remove(&task);
            self.inner.progress.finish_task(bar);

            match summary.status() {
                Status::Success => info!(
                    "Downloaded {} ({} bytes, {} attempt(s))",
                    summary.id(),
                    summary.size(),
                    summary.attempts()
                ),
                Status::Fail(reason) => warn!("Failed {}: {}", summary.id(), reason),
                Status::Exhausted(reason) => warn!(
                    "Gave up on {} after {} attempt(s): {}",
                    summary.id(),
                    summary.attempts(),
                    reason
                ),
                Status::Cancelled => info!("Cancelled {}", summary.id()),
            }

            if let Some(ref callback) = self.inner.config.on_complete {
                callback(&summary);
            }
        }
        .instrument(span)
        .await
    }

    /// Wait for a worker slot, run the attempts and commit on success.
    async fn run_sequence(&self, task: &DownloadTask, bar: &ProgressBar) -> Summary {
        let inner = &self.inner;
        let cancel = task.cancellation();

        let permit = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Summary::new(task.id().clone(), 0),
            permit = inner.permits.clone().acquire_owned() => permit,
        };
        let _permit = match permit {
            Ok(permit) => permit,
            Err(e) => return Summary::new(task.id().clone(), 0).fail(e),
        };
        debug!("Worker slot acquired");

        let ctx = AttemptContext {
            client: &inner.client,
            storage: &inner.storage,
            task,
            bar,
            max_redirects: inner.config.max_redirects,
            chunk_size: inner.config.chunk_size,
            reject_html: inner.config.reject_html,
            signature: inner.config.archive_signature.as_ref(),
        };
        let ctx = &ctx;

        let outcome = inner
            .retry
            .run(cancel, inner.config.sleeper.as_ref(), move |n| async move {
                ctx.storage.prepare().await?;
                ctx.run(n).await
            })
            .await;

        let summary = Summary::new(task.id().clone(), outcome.attempts());
        match outcome {
            Outcome::Success { value, .. } => {
                debug!(
                    "Attempt {} wrote {} bytes (resumed from {}) from {}",
                    value.number, value.transferred, value.existing, value.url
                );
                if task.is_cancelled() {
                    return summary;
                }
                match inner.storage.commit(task.name()).await {
                    Ok(size) => {
                        task.set_progress(100);
                        summary.with_size(size).with_status(Status::Success)
                    }
                    Err(e) => summary.fail(e),
                }
            }
            Outcome::Exhausted { error, .. } => summary.exhausted(error),
            Outcome::Failed { error, .. } => summary.fail(error),
            Outcome::Cancelled { .. } => summary,
        }
    }
}
