//! Background retry with a fixed sleep between attempts.
//!
//! The loop runs on its own spawned task and is never awaited by this crate.
//! The default policy retries forever; cancellation is always available
//! through the token.

use std::fmt;
use std::future::Future;
use std::panic::{self, AssertUnwindSafe};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Sleep after each failed attempt.
    pub delay: Duration,
    /// `None` => unbounded.
    pub max_attempts: Option<u32>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            delay: Duration::from_secs(1),
            max_attempts: None,
        }
    }
}

impl RetryPolicy {
    pub fn fixed(delay: Duration) -> Self {
        Self {
            delay,
            max_attempts: None,
        }
    }

    pub fn with_max_attempts(mut self, n: u32) -> Self {
        self.max_attempts = Some(n);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryOutcome {
    Succeeded { attempts: u32 },
    Exhausted { attempts: u32 },
    Cancelled { attempts: u32 },
}

/// Spawn the retry loop.
///
/// On success `on_success` runs once and the loop ends. On failure
/// `on_failure` runs (its panics are swallowed), then the loop sleeps
/// `policy.delay` before the next attempt.
pub fn try_sleep_retry<A, Fut, E, S, F>(
    mut action: A,
    policy: RetryPolicy,
    cancel: CancellationToken,
    on_success: S,
    mut on_failure: F,
) -> JoinHandle<RetryOutcome>
where
    A: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = Result<(), E>> + Send + 'static,
    E: fmt::Display + Send + 'static,
    S: FnOnce() + Send + 'static,
    F: FnMut(&E) + Send + 'static,
{
    tokio::spawn(async move {
        let mut attempts: u32 = 0;
        loop {
            if cancel.is_cancelled() {
                return RetryOutcome::Cancelled { attempts };
            }

            attempts = attempts.saturating_add(1);
            match action().await {
                Ok(()) => {
                    on_success();
                    return RetryOutcome::Succeeded { attempts };
                }
                Err(e) => {
                    tracing::debug!(attempt = attempts, error = %e, "retry attempt failed");
                    if panic::catch_unwind(AssertUnwindSafe(|| on_failure(&e))).is_err() {
                        tracing::debug!(attempt = attempts, "retry failure callback panicked");
                    }
                }
            }

            if policy.max_attempts.is_some_and(|max| attempts >= max) {
                tracing::warn!(attempts, "retry attempts exhausted");
                return RetryOutcome::Exhausted { attempts };
            }

            tokio::select! {
                _ = cancel.cancelled() => return RetryOutcome::Cancelled { attempts },
                _ = tokio::time::sleep(policy.delay) => {}
            }
        }
    })
}
