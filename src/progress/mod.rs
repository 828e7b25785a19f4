//! Progress module containing progress bar functionality.
//!
//! - `style` - Progress bar styling options and templates
//! - `display` - Coordination of the main bar and the per-task bars
//!
//! Bars are hidden unless the downloader is built with
//! [`DownloaderBuilder::visible`](crate::downloader::DownloaderBuilder::visible)
//! or explicit [`StyleOptions`].
//!
//! ```rust
//! use persevere::downloader::DownloaderBuilder;
//! use persevere::progress::StyleOptions;
//!
//! # fn example() -> Result<(), persevere::Error> {
//! let downloader = DownloaderBuilder::new()
//!     .style_options(StyleOptions::default())
//!     .build()?;
//! # Ok(())
//! # }
//! ```

pub(crate) mod display;
pub(crate) mod style;

pub use display::ProgressDisplay;
pub use style::{ProgressBarOpts, StyleOptions};
