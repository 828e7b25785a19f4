//! Error handling for persevere.
//!
//! Every failure an attempt can hit is a variant of [`Error`]. The retry
//! controller only needs to know which class a failure belongs to, which
//! [`Error::is_permanent`] and [`Error::is_cancelled`] answer.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can happen when using persevere.
#[derive(Error, Debug)]
pub enum Error {
    /// Error from an underlying system.
    ///
    /// Typically raised when the HTTP client cannot be constructed.
    #[error("Internal error: {0}")]
    Internal(String),

    /// The URL cannot be parsed or is not an HTTP(S) URL.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// The logical name cannot be used as a file name in the download directory.
    #[error("Invalid name: {0}")]
    InvalidName(String),

    /// I/O Error.
    ///
    /// Wraps failures while creating, writing, syncing or renaming the
    /// partial and final files.
    #[error("I/O error: {source}")]
    IOError {
        #[from]
        source: io::Error,
    },

    /// Error from the Reqwest library.
    ///
    /// Connection failures, timeouts and body read errors end up here.
    #[error("Reqwest Error: {source}")]
    Reqwest {
        #[from]
        source: reqwest::Error,
    },

    /// Error raised by the middleware stack wrapping the HTTP client.
    #[error("Middleware Error: {source}")]
    Middleware {
        #[from]
        source: reqwest_middleware::Error,
    },

    /// The server kept redirecting past the hop limit.
    #[error("Too many redirects (limit: {limit})")]
    TooManyRedirects { limit: usize },

    /// A redirect status came without a usable `Location` header.
    #[error("Redirect status {status} without a Location header")]
    MissingLocation { status: u16 },

    /// The server answered with a client or server error.
    #[error("HTTP error status {status}")]
    HttpStatus { status: u16 },

    /// The server answered with a status the range negotiation cannot use.
    #[error("Unexpected HTTP status {status}")]
    UnexpectedStatus { status: u16 },

    /// The response declares an HTML (error page) body where a binary artifact is expected.
    #[error("Refusing content type {0}")]
    ContentType(String),

    /// The bytes on disk do not match the declared length.
    #[error("Length mismatch: expected {expected} bytes, got {actual}")]
    LengthMismatch { expected: u64, actual: u64 },

    /// The artifact failed its signature check and was deleted.
    #[error("Corrupt artifact: {0}")]
    CorruptArtifact(PathBuf),

    /// The file to commit or hand over does not exist.
    #[error("Missing artifact: {0}")]
    MissingArtifact(PathBuf),

    /// The task was cancelled by the caller.
    #[error("Download cancelled")]
    Cancelled,
}

impl Error {
    /// Returns `true` when retrying the same source cannot help.
    ///
    /// Permanent errors stop the attempt sequence immediately.
    pub fn is_permanent(&self) -> bool {
        matches!(
            self,
            Error::InvalidUrl(_)
                | Error::InvalidName(_)
                | Error::ContentType(_)
                | Error::CorruptArtifact(_)
                | Error::MissingArtifact(_)
        )
    }

    /// Returns `true` when the error stems from a cancellation request.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Cancelled)
    }
}

/// Result type alias for operations that can fail with a persevere error.
pub type Result<T> = std::result::Result<T, Error>;
