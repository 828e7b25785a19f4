//! Manual redirect resolution.
//!
//! Each hop re-issues a `GET` with the same `Range` header, so a resume
//! survives CDN redirects. The hop budget is per attempt.

use crate::download::RangeRequest;
use crate::error::{Error, Result};

use reqwest::header::{HeaderMap, LOCATION, RANGE};
use reqwest::{Response, StatusCode, Url};
use reqwest_middleware::ClientWithMiddleware;
use tracing::debug;

/// Default number of requests one attempt may issue.
pub const DEFAULT_MAX_REDIRECTS: usize = 10;

/// Final, non-redirect response of a redirect chain.
#[derive(Debug)]
pub struct Resolved {
    pub response: Response,
    /// URL that produced the response.
    pub url: Url,
    /// Number of requests issued, including the final one.
    pub requests: usize,
}

/// Returns `true` for the statuses that are followed.
pub fn is_redirect(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::MOVED_PERMANENTLY
            | StatusCode::FOUND
            | StatusCode::SEE_OTHER
            | StatusCode::TEMPORARY_REDIRECT
            | StatusCode::PERMANENT_REDIRECT
    )
}

/// Resolve the target of a redirect response against the URL that produced it.
pub fn next_location(current: &Url, status: StatusCode, headers: &HeaderMap) -> Result<Url> {
    let missing = || Error::MissingLocation {
        status: status.as_u16(),
    };
    let location = headers
        .get(LOCATION)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(missing)?;
    let next = current.join(location).map_err(|_| missing())?;
    match next.scheme() {
        "http" | "https" => Ok(next),
        _ => Err(missing()),
    }
}

/// Follow redirects from `url` until a non-redirect response arrives.
///
/// At most `max_requests` requests are sent. When the last one is still a
/// redirect, [`Error::TooManyRedirects`] is returned without following it.
pub async fn resolve(
    client: &ClientWithMiddleware,
    url: &Url,
    range: RangeRequest,
    max_requests: usize,
) -> Result<Resolved> {
    let max_requests = max_requests.max(1);
    let mut current = url.clone();

    for request in 1..=max_requests {
        debug!("Fetching {} (request {}/{})", current, request, max_requests);
        let mut req = client.get(current.clone());
        if let Some(value) = range.header_value() {
            req = req.header(RANGE, value);
        }
        let response = req.send().await?;

        let status = response.status();
        if !is_redirect(status) {
            return Ok(Resolved {
                response,
                url: current,
                requests: request,
            });
        }
        if request == max_requests {
            break;
        }

        let next = next_location(&current, status, response.headers())?;
        debug!("Redirect {} from {} to {}", status.as_u16(), current, next);
        current = next;
    }

    Err(Error::TooManyRedirects {
        limit: max_requests,
    })
}
