//! Task status and terminal summaries.
//!
//! [`TaskStatus`] is what a caller sees when polling a download.
//! [`Summary`] is handed to the completion callback once the attempt
//! sequence of a task is over.
//!
//! # Examples
//!
//! ```rust
//! use persevere::download::{State, Status, Summary, TaskId};
//! use std::convert::TryFrom;
//!
//! let id = TaskId::try_from("app.apk")?;
//! let summary = Summary::new(id, 2).with_size(4096).with_status(Status::Success);
//!
//! match summary.status() {
//!     Status::Success => println!("{} bytes", summary.size()),
//!     Status::Fail(reason) | Status::Exhausted(reason) => println!("failed: {}", reason),
//!     Status::Cancelled => println!("cancelled"),
//! }
//! assert_eq!(State::Successful.as_str(), "SUCCESSFUL");
//! # Ok::<(), persevere::Error>(())
//! ```

use super::task::TaskId;
use std::fmt;

/// Coarse state reported by a status query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Running,
    Successful,
    Failed,
}

impl State {
    /// Wire name of the state.
    pub fn as_str(&self) -> &'static str {
        match self {
            State::Running => "RUNNING",
            State::Successful => "SUCCESSFUL",
            State::Failed => "FAILED",
        }
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Answer to a status query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskStatus {
    pub state: State,
    /// Percentage, 0 to 100.
    pub progress: u8,
}

impl TaskStatus {
    pub fn running(progress: u8) -> Self {
        Self {
            state: State::Running,
            progress,
        }
    }

    pub fn successful() -> Self {
        Self {
            state: State::Successful,
            progress: 100,
        }
    }

    pub fn failed(progress: u8) -> Self {
        Self {
            state: State::Failed,
            progress,
        }
    }
}

/// Terminal status of a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Status {
    /// The final file was committed.
    Success,
    /// A permanent error stopped the sequence.
    Fail(String),
    /// Every attempt failed; the partial file is kept for a later resume.
    Exhausted(String),
    /// The caller cancelled the task.
    Cancelled,
}

/// Represents the outcome of one task.
#[derive(Debug, Clone)]
pub struct Summary {
    id: TaskId,
    /// Number of attempts started.
    attempts: u32,
    /// Final file size in bytes, 0 unless the task succeeded.
    size: u64,
    status: Status,
}

impl Summary {
    /// Create a new [`Summary`], initially cancelled.
    pub fn new(id: TaskId, attempts: u32) -> Self {
        Self {
            id,
            attempts,
            size: 0,
            status: Status::Cancelled,
        }
    }

    /// Attach a status to a [`Summary`].
    pub fn with_status(self, status: Status) -> Self {
        Self { status, ..self }
    }

    /// Attach the committed size to a [`Summary`].
    pub fn with_size(self, size: u64) -> Self {
        Self { size, ..self }
    }

    /// Mark the summary as failed with a message.
    pub fn fail(self, msg: impl fmt::Display) -> Self {
        Self {
            status: Status::Fail(format!("{}", msg)),
            ..self
        }
    }

    /// Mark the summary as exhausted with the last error.
    pub fn exhausted(self, msg: impl fmt::Display) -> Self {
        Self {
            status: Status::Exhausted(format!("{}", msg)),
            ..self
        }
    }

    pub fn id(&self) -> &TaskId {
        &self.id
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn status(&self) -> &Status {
        &self.status
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::convert::TryFrom;

    fn id() -> TaskId {
        TaskId::try_from("test.zip").unwrap()
    }

    #[test]
    fn test_state_names() {
        assert_eq!(State::Running.to_string(), "RUNNING");
        assert_eq!(State::Successful.to_string(), "SUCCESSFUL");
        assert_eq!(State::Failed.to_string(), "FAILED");
    }

    #[test]
    fn test_task_status_constructors() {
        assert_eq!(TaskStatus::successful().progress, 100);
        assert_eq!(TaskStatus::running(42).state, State::Running);
        assert_eq!(TaskStatus::failed(0).state, State::Failed);
    }

    #[test]
    fn test_summary_fail() {
        let summary = Summary::new(id(), 1).fail("refusing content type text/html");
        match summary.status() {
            Status::Fail(msg) => assert_eq!(msg, "refusing content type text/html"),
            _ => panic!("Expected Fail status"),
        }
        assert_eq!(summary.size(), 0);
    }

    #[test]
    fn test_summary_success() {
        let summary = Summary::new(id(), 3)
            .with_size(1024)
            .with_status(Status::Success);
        assert_eq!(summary.status(), &Status::Success);
        assert_eq!(summary.attempts(), 3);
        assert_eq!(summary.size(), 1024);
        assert_eq!(summary.id().as_str(), "test.zip");
    }

    #[test]
    fn test_summary_exhausted() {
        let summary = Summary::new(id(), 3).exhausted("HTTP error status 503");
        assert_eq!(
            summary.status(),
            &Status::Exhausted("HTTP error status 503".to_string())
        );
    }
}
