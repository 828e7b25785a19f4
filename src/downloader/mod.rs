//! Downloader module containing the task registry and its orchestration.
//!
//! # Overview
//!
//! - `downloader` - The [`Downloader`] facade: submit, status, cancel
//! - `builder` - [`DownloaderBuilder`] for configuring a downloader
//! - `config` - Configuration structures and callback types
//! - `registry` - Deduplicating map of active tasks
//! - `retry` - The attempt state machine and its backoff
//! - `attempt` - One attempt: redirects, range, transfer, validation
//! - `power` - Advisory power hint while downloads are active
//!
//! # Examples
//!
//! ```rust,no_run
//! use persevere::download::Status;
//! use persevere::downloader::DownloaderBuilder;
//!
//! # async fn example() -> Result<(), persevere::Error> {
//! let downloader = DownloaderBuilder::new()
//!     .directory("./downloads".into())
//!     .on_complete(|summary| {
//!         if summary.status() == &Status::Success {
//!             println!("{} is ready", summary.id());
//!         }
//!     })
//!     .build()?;
//!
//! let first = downloader.submit("app.apk", "https://example.com/app.apk")?;
//! // Same name while active: no second download.
//! let second = downloader.submit("app.apk", "https://example.com/app.apk")?;
//! assert_eq!(first, second);
//! # Ok(())
//! # }
//! ```

pub mod attempt;
pub mod builder;
pub mod config;
pub mod downloader;
pub mod power;
pub mod registry;
pub mod retry;

pub use attempt::Attempt;
pub use builder::DownloaderBuilder;
pub use config::{CompletionCallback, DownloaderConfig, DEFAULT_CONCURRENT_DOWNLOADS};
pub use downloader::{Downloader, VERIFY_CHECKS, VERIFY_INTERVAL};
pub use power::{NoopPowerHint, PowerHint};
pub use registry::{Registration, TaskRegistry};
pub use retry::{
    Backoff, Outcome, RetryController, RetryState, Sleeper, TokioSleeper, DEFAULT_BACKOFF_STEP,
    DEFAULT_MAX_ATTEMPTS,
};
