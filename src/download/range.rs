//! Byte-range negotiation.
//!
//! Before an attempt the negotiator decides whether to ask for a range,
//! based on how many bytes the partial file already holds. Once the
//! response arrives it decides whether the transfer resumes at that offset
//! or restarts from zero.

use crate::error::{Error, Result};
use crate::utils::parse_content_range_start;

use reqwest::StatusCode;

/// Range request derived from the partial file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeRequest {
    existing: u64,
}

impl RangeRequest {
    /// Build the request for a partial file of `existing` bytes.
    pub fn from_existing(existing: u64) -> Self {
        Self { existing }
    }

    /// Bytes already on disk.
    pub fn existing(&self) -> u64 {
        self.existing
    }

    /// Value of the `Range` header, or `None` when there is nothing to resume.
    pub fn header_value(&self) -> Option<String> {
        (self.existing > 0).then(|| format!("bytes={}-", self.existing))
    }
}

/// How the body of a response must be written to the partial file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Negotiated {
    /// Position of the first body byte in the partial file.
    pub write_offset: u64,
    /// Full artifact length, when the server declared one.
    pub total: Option<u64>,
    /// `true` when the server confirmed the range.
    pub resuming: bool,
}

impl Negotiated {
    /// Returns `true` when existing partial bytes must be discarded.
    pub fn truncates(&self) -> bool {
        !self.resuming
    }
}

/// Interpret a non-redirect response against the range request.
///
/// `content_length` is the declared length of this response body and
/// `content_range` the raw `Content-Range` header, if any.
pub fn negotiate(
    status: StatusCode,
    content_length: Option<u64>,
    content_range: Option<&str>,
    request: RangeRequest,
) -> Result<Negotiated> {
    if status.as_u16() >= 400 {
        return Err(Error::HttpStatus {
            status: status.as_u16(),
        });
    }

    let existing = request.existing();
    match status {
        StatusCode::PARTIAL_CONTENT => {
            // A range starting anywhere but our offset would corrupt the file.
            if let Some(start) = content_range.and_then(parse_content_range_start) {
                if start != existing {
                    return Err(Error::UnexpectedStatus {
                        status: status.as_u16(),
                    });
                }
            }
            Ok(Negotiated {
                write_offset: existing,
                total: content_length.map(|len| len + existing),
                resuming: true,
            })
        }
        // Either a fresh download or a server that ignored the range.
        StatusCode::OK => Ok(Negotiated {
            write_offset: 0,
            total: content_length,
            resuming: false,
        }),
        other => Err(Error::UnexpectedStatus {
            status: other.as_u16(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_range_header() {
        assert_eq!(RangeRequest::from_existing(0).header_value(), None);
        assert_eq!(
            RangeRequest::from_existing(512).header_value(),
            Some("bytes=512-".to_string())
        );
    }

    #[test]
    fn test_partial_content_resumes() {
        let n = negotiate(
            StatusCode::PARTIAL_CONTENT,
            Some(1536),
            Some("bytes 512-2047/2048"),
            RangeRequest::from_existing(512),
        )
        .unwrap();
        assert_eq!(
            n,
            Negotiated {
                write_offset: 512,
                total: Some(2048),
                resuming: true
            }
        );
        assert!(!n.truncates());
    }

    #[test]
    fn test_partial_content_without_length() {
        let n = negotiate(
            StatusCode::PARTIAL_CONTENT,
            None,
            None,
            RangeRequest::from_existing(100),
        )
        .unwrap();
        assert_eq!(n.total, None);
        assert_eq!(n.write_offset, 100);
    }

    #[test]
    fn test_partial_content_wrong_offset_is_rejected() {
        let err = negotiate(
            StatusCode::PARTIAL_CONTENT,
            Some(100),
            Some("bytes 0-99/612"),
            RangeRequest::from_existing(512),
        )
        .unwrap_err();
        assert!(matches!(err, Error::UnexpectedStatus { status: 206 }));
    }

    #[test]
    fn test_ok_with_existing_restarts() {
        let n = negotiate(
            StatusCode::OK,
            Some(2048),
            None,
            RangeRequest::from_existing(512),
        )
        .unwrap();
        assert_eq!(n.write_offset, 0);
        assert_eq!(n.total, Some(2048));
        assert!(n.truncates());
    }

    #[test]
    fn test_ok_fresh() {
        let n = negotiate(StatusCode::OK, None, None, RangeRequest::from_existing(0)).unwrap();
        assert_eq!(n.write_offset, 0);
        assert_eq!(n.total, None);
    }

    #[test]
    fn test_error_statuses() {
        let req = RangeRequest::from_existing(0);
        assert!(matches!(
            negotiate(StatusCode::NOT_FOUND, None, None, req),
            Err(Error::HttpStatus { status: 404 })
        ));
        assert!(matches!(
            negotiate(StatusCode::RANGE_NOT_SATISFIABLE, None, None, req),
            Err(Error::HttpStatus { status: 416 })
        ));
        assert!(matches!(
            negotiate(StatusCode::NO_CONTENT, None, None, req),
            Err(Error::UnexpectedStatus { status: 204 })
        ));
    }
}
