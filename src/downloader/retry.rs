//! Retry controller.
//!
//! The attempt sequence of a task is an explicit state machine:
//!
//! ```text
//! Attempting(1) -> Success
//!               -> RetryWait(2) -> Attempting(2) -> ... -> Exhausted
//! ```
//!
//! Any state can short-circuit to `Cancelled`, and a permanent error ends
//! the sequence as `Failed`. Waits go through a [`Sleeper`] so they can be
//! observed without a wall clock.

use crate::error::{Error, Result};

use futures::future::{BoxFuture, FutureExt};
use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Default number of attempts per task.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Default backoff step.
pub const DEFAULT_BACKOFF_STEP: Duration = Duration::from_millis(2000);

/// Something able to wait for a given duration.
pub trait Sleeper: Send + Sync + 'static {
    fn sleep(&self, duration: Duration) -> BoxFuture<'static, ()>;
}

/// [`Sleeper`] backed by the Tokio timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

impl Sleeper for TokioSleeper {
    fn sleep(&self, duration: Duration) -> BoxFuture<'static, ()> {
        tokio::time::sleep(duration).boxed()
    }
}

/// Linear backoff: the wait before attempt `n` is `(n - 1) * step`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backoff {
    step: Duration,
}

impl Backoff {
    pub fn linear(step: Duration) -> Self {
        Self { step }
    }

    pub fn step(&self) -> Duration {
        self.step
    }

    /// Wait before attempt `attempt` (1-based). The first attempt never waits.
    pub fn delay_before(&self, attempt: u32) -> Duration {
        self.step * attempt.saturating_sub(1)
    }
}

impl Default for Backoff {
    fn default() -> Self {
        Self::linear(DEFAULT_BACKOFF_STEP)
    }
}

/// Non-terminal states of the sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryState {
    /// Attempt `n` is running.
    Attempting(u32),
    /// Waiting before attempt `n`.
    RetryWait(u32),
}

/// Terminal state of the sequence.
#[derive(Debug)]
pub enum Outcome<T> {
    Success { attempts: u32, value: T },
    /// Every attempt failed with a transient error; holds the last one.
    Exhausted { attempts: u32, error: Error },
    /// A permanent error stopped the sequence.
    Failed { attempts: u32, error: Error },
    Cancelled { attempts: u32 },
}

impl<T> Outcome<T> {
    /// Number of attempts that were started.
    pub fn attempts(&self) -> u32 {
        match self {
            Outcome::Success { attempts, .. }
            | Outcome::Exhausted { attempts, .. }
            | Outcome::Failed { attempts, .. }
            | Outcome::Cancelled { attempts } => *attempts,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success { .. })
    }
}

/// Drives attempts until one succeeds, the budget runs out, or the task is cancelled.
#[derive(Debug, Clone, Copy)]
pub struct RetryController {
    max_attempts: u32,
    backoff: Backoff,
}

impl Default for RetryController {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ATTEMPTS, Backoff::default())
    }
}

impl RetryController {
    /// Creates a controller. At least one attempt is always made.
    pub fn new(max_attempts: u32, backoff: Backoff) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff,
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn backoff(&self) -> Backoff {
        self.backoff
    }

    /// Run the sequence. `attempt` receives the 1-based attempt number.
    pub async fn run<T, F, Fut>(
        &self,
        cancel: &CancellationToken,
        sleeper: &dyn Sleeper,
        mut attempt: F,
    ) -> Outcome<T>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut state = RetryState::Attempting(1);
        loop {
            match state {
                RetryState::Attempting(n) => {
                    if cancel.is_cancelled() {
                        return Outcome::Cancelled { attempts: n - 1 };
                    }
                    debug!("Starting attempt {}/{}", n, self.max_attempts);
                    match attempt(n).await {
                        Ok(value) => return Outcome::Success { attempts: n, value },
                        Err(e) if e.is_cancelled() || cancel.is_cancelled() => {
                            return Outcome::Cancelled { attempts: n };
                        }
                        Err(e) if e.is_permanent() => {
                            warn!("Attempt {} failed permanently: {}", n, e);
                            return Outcome::Failed {
                                attempts: n,
                                error: e,
                            };
                        }
                        Err(e) if n >= self.max_attempts => {
                            warn!("Attempt {} failed, no attempts left: {}", n, e);
                            return Outcome::Exhausted {
                                attempts: n,
                                error: e,
                            };
                        }
                        Err(e) => {
                            warn!("Attempt {} failed: {}", n, e);
                            state = RetryState::RetryWait(n + 1);
                        }
                    }
                }
                RetryState::RetryWait(n) => {
                    let delay = self.backoff.delay_before(n);
                    debug!("Waiting {:?} before attempt {}", delay, n);
                    tokio::select! {
                        biased;
                        _ = cancel.cancelled() => return Outcome::Cancelled { attempts: n - 1 },
                        _ = sleeper.sleep(delay) => {}
                    }
                    state = RetryState::Attempting(n);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct RecordingSleeper {
        waits: Mutex<Vec<Duration>>,
    }

    impl Sleeper for RecordingSleeper {
        fn sleep(&self, duration: Duration) -> BoxFuture<'static, ()> {
            self.waits.lock().unwrap().push(duration);
            futures::future::ready(()).boxed()
        }
    }

    /// Cancels the token instead of waiting.
    struct CancellingSleeper(CancellationToken);

    impl Sleeper for CancellingSleeper {
        fn sleep(&self, _duration: Duration) -> BoxFuture<'static, ()> {
            self.0.cancel();
            futures::future::pending().boxed()
        }
    }

    fn transient() -> Error {
        Error::HttpStatus { status: 503 }
    }

    #[test]
    fn test_backoff_delays() {
        let backoff = Backoff::default();
        assert_eq!(backoff.delay_before(1), Duration::ZERO);
        assert_eq!(backoff.delay_before(2), Duration::from_millis(2000));
        assert_eq!(backoff.delay_before(3), Duration::from_millis(4000));
    }

    #[tokio::test]
    async fn test_exhaustion_waits_between_attempts_only() {
        let sleeper = RecordingSleeper::default();
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let outcome: Outcome<()> = RetryController::default()
            .run(&CancellationToken::new(), &sleeper, |_| {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Err(transient())
                }
            })
            .await;

        assert!(matches!(outcome, Outcome::Exhausted { attempts: 3, .. }));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(
            *sleeper.waits.lock().unwrap(),
            vec![Duration::from_millis(2000), Duration::from_millis(4000)]
        );
    }

    #[tokio::test]
    async fn test_success_after_retry() {
        let sleeper = RecordingSleeper::default();
        let outcome = RetryController::default()
            .run(&CancellationToken::new(), &sleeper, |n| async move {
                if n < 2 {
                    Err(transient())
                } else {
                    Ok(n * 10)
                }
            })
            .await;

        match outcome {
            Outcome::Success { attempts, value } => {
                assert_eq!(attempts, 2);
                assert_eq!(value, 20);
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
        assert_eq!(sleeper.waits.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_permanent_error_stops_immediately() {
        let sleeper = RecordingSleeper::default();
        let outcome: Outcome<()> = RetryController::default()
            .run(&CancellationToken::new(), &sleeper, |_| async {
                Err(Error::ContentType("text/html".into()))
            })
            .await;

        assert!(matches!(
            outcome,
            Outcome::Failed {
                attempts: 1,
                error: Error::ContentType(_)
            }
        ));
        assert!(sleeper.waits.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_cancel_during_wait() {
        let token = CancellationToken::new();
        let sleeper = CancellingSleeper(token.clone());
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let outcome: Outcome<()> = RetryController::default()
            .run(&token, &sleeper, |_| {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Err(transient())
                }
            })
            .await;

        assert!(matches!(outcome, Outcome::Cancelled { attempts: 1 }));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_cancelled_before_start() {
        let token = CancellationToken::new();
        token.cancel();
        let outcome: Outcome<()> = RetryController::default()
            .run(&token, &TokioSleeper, |_| async { Ok(()) })
            .await;
        assert!(matches!(outcome, Outcome::Cancelled { attempts: 0 }));
    }

    #[tokio::test]
    async fn test_single_attempt_budget() {
        let sleeper = RecordingSleeper::default();
        let outcome: Outcome<()> = RetryController::new(0, Backoff::default())
            .run(&CancellationToken::new(), &sleeper, |_| async {
                Err(Error::TooManyRedirects { limit: 10 })
            })
            .await;
        assert!(matches!(outcome, Outcome::Exhausted { attempts: 1, .. }));
        assert!(sleeper.waits.lock().unwrap().is_empty());
    }
}
