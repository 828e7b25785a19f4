//! Download module containing the per-download building blocks.
//!
//! Everything here works on a single task and a single attempt. The
//! orchestration across attempts lives in [`crate::downloader`].
//!
//! # Overview
//!
//! - [`task`] - The in-memory [`DownloadTask`] record and its [`TaskId`]
//! - [`range`] - Byte-range negotiation for resuming partial files
//! - [`stream`] - Cancellable streaming of a body into the partial file
//! - [`validate`] - Content-type guard, length check and archive signatures
//! - [`summary`] - Status reporting and terminal summaries
//!
//! # Examples
//!
//! ## Negotiating a resume
//!
//! ```rust
//! use persevere::download::{negotiate, RangeRequest};
//! use reqwest::StatusCode;
//!
//! let request = RangeRequest::from_existing(1024);
//! assert_eq!(request.header_value().as_deref(), Some("bytes=1024-"));
//!
//! let plan = negotiate(StatusCode::PARTIAL_CONTENT, Some(1024), None, request)?;
//! assert_eq!(plan.write_offset, 1024);
//! assert_eq!(plan.total, Some(2048));
//! # Ok::<(), persevere::Error>(())
//! ```

pub mod range;
pub mod stream;
pub mod summary;
pub mod task;
pub mod validate;

pub use range::{negotiate, Negotiated, RangeRequest};
pub use stream::{StreamTransfer, DEFAULT_CHUNK_SIZE};
pub use summary::{State, Status, Summary, TaskStatus};
pub use task::{parse_url, validate_name, DownloadTask, TaskId, PARTIAL_SUFFIX};
pub use validate::{check_length, reject_error_page, ArchiveSignature};
