//! HTTP client setup and middleware configuration.
//!
//! The client never follows redirects on its own: the
//! [`redirect`](super::redirect) resolver walks them hop by hop so the
//! `Range` header survives every hop and the hop count stays bounded.
//! Retries are handled above the transport by the retry controller, so no
//! retry middleware is installed either.
//!
//! # Examples
//!
//! ## Basic Client Creation
//!
//! ```rust
//! use persevere::http::{create_http_client, HttpClientConfig};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = create_http_client(HttpClientConfig::default())?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Client with Custom Headers and Proxy
//!
//! ```rust,no_run
//! use persevere::http::{create_http_client, HttpClientConfig};
//! use reqwest::header::{HeaderMap, ACCEPT};
//! use reqwest::Proxy;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut headers = HeaderMap::new();
//! headers.insert(ACCEPT, "*/*".parse()?);
//!
//! let config = HttpClientConfig {
//!     proxy: Some(Proxy::all("http://proxy.example.com:8080")?),
//!     headers: Some(headers),
//!     ..HttpClientConfig::default()
//! };
//! let client = create_http_client(config)?;
//! # Ok(())
//! # }
//! ```

use reqwest::{header::HeaderMap, redirect, Proxy};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_tracing::TracingMiddleware;
use std::time::Duration;

/// User agent sent when none is configured.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Linux; Android 13) Chrome/110.0.0.0";

/// Connect and read timeout applied when none is configured.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

/// Configuration for HTTP client setup.
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Optional proxy configuration.
    pub proxy: Option<Proxy>,
    /// Default headers to include with all requests.
    pub headers: Option<HeaderMap>,
    /// Value of the `User-Agent` header.
    pub user_agent: String,
    /// Limit for establishing a connection.
    pub connect_timeout: Duration,
    /// Limit for a single read on an established connection.
    pub read_timeout: Duration,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            proxy: None,
            headers: None,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            connect_timeout: DEFAULT_TIMEOUT,
            read_timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// Creates an HTTP client with middleware configuration.
///
/// This function sets up a reqwest client with:
/// - Redirect following disabled
/// - Connect and read timeouts
/// - Tracing middleware for request/response logging
/// - Optional proxy support
/// - Optional default headers
pub fn create_http_client(
    config: HttpClientConfig,
) -> Result<ClientWithMiddleware, reqwest::Error> {
    let mut inner_client_builder = reqwest::Client::builder()
        .redirect(redirect::Policy::none())
        .user_agent(config.user_agent)
        .connect_timeout(config.connect_timeout)
        .read_timeout(config.read_timeout);

    if let Some(proxy) = config.proxy {
        inner_client_builder = inner_client_builder.proxy(proxy);
    }

    if let Some(headers) = config.headers {
        inner_client_builder = inner_client_builder.default_headers(headers);
    }

    let inner_client = inner_client_builder.build()?;

    let client = ClientBuilder::new(inner_client)
        // Trace HTTP requests. See the tracing crate to make use of these traces.
        .with(TracingMiddleware::default())
        .build();

    Ok(client)
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::{HeaderValue, ACCEPT};

    #[test]
    fn test_default_config() {
        let config = HttpClientConfig::default();
        assert!(config.proxy.is_none());
        assert!(config.headers.is_none());
        assert_eq!(config.user_agent, DEFAULT_USER_AGENT);
        assert_eq!(config.connect_timeout, Duration::from_secs(15));
        assert_eq!(config.read_timeout, Duration::from_secs(15));
    }

    #[test]
    fn test_create_http_client_default() {
        assert!(create_http_client(HttpClientConfig::default()).is_ok());
    }

    #[test]
    fn test_create_http_client_with_headers() {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("*/*"));

        let config = HttpClientConfig {
            headers: Some(headers),
            user_agent: "test-agent".into(),
            ..HttpClientConfig::default()
        };

        assert!(create_http_client(config).is_ok());
    }
}
