//! Per-dispatch cancellation and deadline.

use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

/// Cancellation signal and optional deadline supplied by the caller of a
/// dispatch.
///
/// Cloning shares the underlying token: cancelling a clone cancels the
/// original. Use [`ExecutionContext::child`] for a context that can be
/// cancelled without affecting its parent.
#[derive(Debug, Clone, Default)]
pub struct ExecutionContext {
    cancel: CancellationToken,
    deadline: Option<Instant>,
}

impl ExecutionContext {
    /// Creates a context with no deadline that is never cancelled unless
    /// [`cancel`](Self::cancel) is called.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a context whose deadline is `timeout` from now.
    ///
    /// A timeout too large to represent as an instant sets no deadline.
    #[must_use]
    pub fn with_timeout(timeout: Duration) -> Self {
        Self::new().within(timeout)
    }

    /// Bounds this context by `timeout` from now, keeping any earlier
    /// deadline. A timeout past the representable range leaves the
    /// context unchanged.
    #[must_use]
    pub fn within(self, timeout: Duration) -> Self {
        match Instant::now().checked_add(timeout) {
            Some(deadline) => self.with_deadline(deadline),
            None => self,
        }
    }

    /// Bounds this context by `deadline`, keeping the earlier of the two
    /// if a deadline is already set.
    #[must_use]
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(match self.deadline {
            Some(existing) => existing.min(deadline),
            None => deadline,
        });
        self
    }

    /// Uses an existing cancellation token.
    #[must_use]
    pub fn with_token(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Returns a context that is cancelled whenever this one is, and can
    /// also be cancelled on its own.
    #[must_use]
    pub fn child(&self) -> Self {
        Self {
            cancel: self.cancel.child_token(),
            deadline: self.deadline,
        }
    }

    /// Cancels this context and every child derived from it.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Returns true if the context was cancelled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Returns the deadline, if any.
    #[must_use]
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Returns true if the deadline has passed.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.deadline.is_some_and(|deadline| Instant::now() >= deadline)
    }

    /// Returns true once a running script must stop.
    #[must_use]
    pub fn should_stop(&self) -> bool {
        self.is_cancelled() || self.is_expired()
    }

    /// Time left until the deadline, or `None` without one.
    #[must_use]
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
    }

    /// Completes when the context is cancelled or its deadline passes.
    pub async fn done(&self) {
        match self.deadline {
            Some(deadline) => {
                tokio::select! {
                    () = self.cancel.cancelled() => {}
                    () = tokio::time::sleep_until(deadline.into()) => {}
                }
            }
            None => self.cancel.cancelled().await,
        }
    }
}
