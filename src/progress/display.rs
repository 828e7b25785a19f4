//! Progress bar display management and coordination.
//!
//! ```rust
//! use persevere::progress::{ProgressDisplay, StyleOptions};
//!
//! let display = ProgressDisplay::new(StyleOptions::hidden());
//! let bar = display.add_task("app.apk");
//! bar.set_length(1024);
//! bar.set_position(512);
//! display.finish_task(bar);
//! assert_eq!(display.main().position(), 1);
//! ```

use crate::progress::StyleOptions;
use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget};

/// Coordinates the main bar and the per-task bars of a downloader.
#[derive(Debug, Clone)]
pub struct ProgressDisplay {
    multi: MultiProgress,
    /// Counts terminated tasks; its length grows with every submission.
    main: ProgressBar,
    style_options: StyleOptions,
}

impl ProgressDisplay {
    pub fn new(style_options: StyleOptions) -> Self {
        let multi = match style_options.is_enabled() {
            true => MultiProgress::new(),
            false => MultiProgress::with_draw_target(ProgressDrawTarget::hidden()),
        };
        let main = multi.add(style_options.main().to_progress_bar(0));

        Self {
            multi,
            main,
            style_options,
        }
    }

    pub fn main(&self) -> &ProgressBar {
        &self.main
    }

    /// Register a task and return its byte-level bar.
    pub fn add_task(&self, name: &str) -> ProgressBar {
        self.main.inc_length(1);
        self.multi.add(
            self.style_options
                .child()
                .to_progress_bar(0)
                .with_message(name.to_string()),
        )
    }

    /// Finish the bar of a terminated task and advance the main bar.
    pub fn finish_task(&self, bar: ProgressBar) {
        if self.style_options.child().clear {
            bar.finish_and_clear();
        } else {
            bar.finish();
        }
        self.main.inc(1);
    }
}
