//! Cancellation and deadline scope threaded through outbound calls.

use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Why a call scoped by a [`CallContext`] stopped before completing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Interrupted {
    #[error("operation canceled")]
    Canceled,
    #[error("deadline exceeded")]
    DeadlineExceeded,
}

/// A cancellation token paired with an optional deadline.
///
/// Derived contexts share cancellation with their parent: cancelling the
/// parent cancels every child, while cancelling a child leaves the parent
/// untouched.
#[derive(Debug, Clone)]
pub struct CallContext {
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl CallContext {
    pub fn new(token: CancellationToken) -> Self {
        Self {
            token,
            deadline: None,
        }
    }

    /// A context that is never cancelled and has no deadline.
    pub fn background() -> Self {
        Self::new(CancellationToken::new())
    }

    /// Derives a child bounded by `timeout` from now. A deadline already set
    /// on `self` is kept when it is earlier.
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        let candidate = Instant::now() + timeout;
        let deadline = match self.deadline {
            Some(existing) if existing < candidate => existing,
            _ => candidate,
        };
        Self {
            token: self.token.child_token(),
            deadline: Some(deadline),
        }
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Reports whether the context is already done, without waiting.
    pub fn err(&self) -> Option<Interrupted> {
        if self.token.is_cancelled() {
            return Some(Interrupted::Canceled);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Some(Interrupted::DeadlineExceeded),
            _ => None,
        }
    }

    /// Drives `fut` until it completes, the token is cancelled or the
    /// deadline passes, whichever comes first. `fut` is dropped on interrupt.
    pub async fn run<F>(&self, fut: F) -> Result<F::Output, Interrupted>
    where
        F: Future,
    {
        if let Some(interrupted) = self.err() {
            return Err(interrupted);
        }

        let expired = async {
            match self.deadline {
                Some(deadline) => tokio::time::sleep_until(deadline).await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            biased;
            _ = self.token.cancelled() => Err(Interrupted::Canceled),
            _ = expired => Err(Interrupted::DeadlineExceeded),
            output = fut => Ok(output),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_run_completes() {
        let ctx = CallContext::background();
        let result = ctx.run(async { 42 }).await;
        assert_eq!(result, Ok(42));
    }

    #[tokio::test]
    async fn test_run_cancelled_before_start() {
        let ctx = CallContext::background();
        ctx.cancel();

        let result = ctx.run(std::future::pending::<()>()).await;
        assert_eq!(result, Err(Interrupted::Canceled));
    }

    #[tokio::test]
    async fn test_run_cancelled_in_flight() {
        let ctx = CallContext::background();
        let canceller = ctx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            canceller.cancel();
        });

        let result = ctx.run(std::future::pending::<()>()).await;
        assert_eq!(result, Err(Interrupted::Canceled));
    }

    #[tokio::test]
    async fn test_run_deadline_exceeded() {
        let ctx = CallContext::background().with_timeout(Duration::from_millis(20));
        let result = ctx.run(std::future::pending::<()>()).await;
        assert_eq!(result, Err(Interrupted::DeadlineExceeded));
        assert_eq!(ctx.err(), Some(Interrupted::DeadlineExceeded));
    }

    #[tokio::test]
    async fn test_child_inherits_parent_cancellation() {
        let parent = CallContext::background();
        let child = parent.with_timeout(Duration::from_secs(60));
        assert_eq!(child.err(), None);

        parent.cancel();
        assert_eq!(child.err(), Some(Interrupted::Canceled));
    }

    #[tokio::test]
    async fn test_child_cancel_leaves_parent() {
        let parent = CallContext::background();
        let child = parent.with_timeout(Duration::from_secs(60));

        child.cancel();
        assert_eq!(child.err(), Some(Interrupted::Canceled));
        assert_eq!(parent.err(), None);
    }

    #[tokio::test]
    async fn test_with_timeout_never_extends_deadline() {
        let parent = CallContext::background().with_timeout(Duration::from_millis(100));
        let child = parent.with_timeout(Duration::from_secs(60));
        assert_eq!(child.deadline(), parent.deadline());

        let shorter = parent.with_timeout(Duration::from_millis(10));
        assert!(shorter.deadline().unwrap() < parent.deadline().unwrap());
    }
}
