//! Header extraction utilities.
//!
//! This module reads the length and range headers that drive range
//! negotiation and integrity checks. Everything works on a [`HeaderMap`] so
//! it can be exercised without a live response.

use reqwest::header::{HeaderMap, CONTENT_LENGTH, CONTENT_RANGE, CONTENT_TYPE};

/// Extract the declared body length from the `Content-Length` header.
///
/// Returns `None` when the header is missing or is not an u64, which is
/// the "unknown length" case of the engine.
///
/// # Example
///
/// ```rust
/// use persevere::utils::declared_length;
/// use reqwest::header::{HeaderMap, HeaderValue, CONTENT_LENGTH};
///
/// let mut headers = HeaderMap::new();
/// headers.insert(CONTENT_LENGTH, HeaderValue::from_static("1024"));
/// assert_eq!(declared_length(&headers), Some(1024));
/// ```
pub fn declared_length(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(CONTENT_LENGTH)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse::<u64>().ok())
}

/// Get the raw `Content-Range` header value, if any.
pub fn content_range(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(CONTENT_RANGE)
        .and_then(|value| value.to_str().ok())
}

/// Get the raw `Content-Type` header value, if any.
pub fn content_type(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
}

/// Parse Content-Range header to extract total size.
///
/// Content-Range header format: "bytes start-end/total"
///
/// # Example
///
/// ```rust
/// use persevere::utils::parse_content_range_total;
///
/// let total = parse_content_range_total("bytes 0-1023/2048");
/// assert_eq!(total, Some(2048));
/// ```
pub fn parse_content_range_total(content_range: &str) -> Option<u64> {
    content_range
        .split('/')
        .next_back()
        .and_then(|size| size.trim().parse::<u64>().ok())
}

/// Parse Content-Range header to extract the first byte position.
///
/// # Example
///
/// ```rust
/// use persevere::utils::parse_content_range_start;
///
/// assert_eq!(parse_content_range_start("bytes 200-1023/1024"), Some(200));
/// assert_eq!(parse_content_range_start("bytes */1024"), None);
/// ```
pub fn parse_content_range_start(content_range: &str) -> Option<u64> {
    let range = content_range.trim().strip_prefix("bytes")?.trim_start();
    range
        .split('-')
        .next()
        .and_then(|start| start.trim().parse::<u64>().ok())
}
