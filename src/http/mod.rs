//! HTTP module containing the transport and redirect handling.
//!
//! - [`client`] - HTTP client creation and middleware configuration
//! - [`redirect`] - Manual, bounded redirect resolution
//!
//! # Examples
//!
//! ```rust,no_run
//! use persevere::download::RangeRequest;
//! use persevere::http::{create_http_client, resolve, HttpClientConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = create_http_client(HttpClientConfig::default())?;
//! let url = reqwest::Url::parse("https://example.com/app.apk")?;
//!
//! let resolved = resolve(&client, &url, RangeRequest::from_existing(0), 10).await?;
//! println!("{} after {} requests", resolved.url, resolved.requests);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod redirect;

pub use client::{create_http_client, HttpClientConfig, DEFAULT_TIMEOUT, DEFAULT_USER_AGENT};
pub use redirect::{is_redirect, next_location, resolve, Resolved, DEFAULT_MAX_REDIRECTS};
