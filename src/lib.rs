//! Persevere is a crate providing resumable, crash-tolerant downloads of
//! single files via HTTP(S).
//!
//! Every download is a named task. Bytes land in `<name>.tmp` and are only
//! renamed to `<name>` once the transfer is complete and validated, so an
//! interrupted process leaves a partial file the next attempt resumes from.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use persevere::downloader::DownloaderBuilder;
//! use persevere::Error;
//! use std::path::PathBuf;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Error> {
//! let downloader = DownloaderBuilder::new()
//!     .directory(PathBuf::from("output"))
//!     .build()?;
//! let id = downloader.submit(
//!     "reqwest-0.11.9.zip",
//!     "https://github.com/seanmonstar/reqwest/archive/refs/tags/v0.11.9.zip",
//! )?;
//! println!("{:?}", downloader.status(&id).await);
//! # Ok(())
//! # }
//! ```
//!
//! # Module Organization
//!
//! - [`download`] - Per-task building blocks: range negotiation, streaming, validation
//! - [`downloader`] - The [`Downloader`], its builder, registry and retry controller
//! - [`error`] - Centralized error handling with the [`Error`] enum
//! - [`http`] - HTTP client and manual redirect resolution
//! - [`progress`] - Progress bar styling and display management
//! - [`storage`] - Partial/final file layout and the atomic commit
//! - [`utils`] - Header parsing helpers

pub mod download;
pub mod downloader;
pub mod error;
pub mod http;
pub mod progress;
pub mod storage;
pub mod utils;

pub use download::{State, Status, Summary, TaskId, TaskStatus};
pub use downloader::{Downloader, DownloaderBuilder};
pub use error::{Error, Result};
pub use http::{create_http_client, HttpClientConfig};
pub use progress::{ProgressBarOpts, StyleOptions};
pub use storage::Storage;
