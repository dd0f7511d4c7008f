//! Per-operation cancellation and deadline.
//!
//! Every store call runs inside [`OperationContext::run`], which races the I/O
//! future against the caller's cancellation signal and deadline. Losing the
//! race drops the I/O future, which aborts the in-flight request.

use std::future::Future;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::Instant;

use crate::storage::RepositoryError;

/// Cancellation and deadline carried through a single request.
#[derive(Debug, Clone, Default)]
pub struct OperationContext {
    deadline: Option<Instant>,
    cancelled: Option<watch::Receiver<bool>>,
}

/// Cancels every context cloned from the one it was created with.
#[derive(Debug)]
pub struct CancelHandle {
    sender: watch::Sender<bool>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        self.sender.send_replace(true);
    }
}

impl OperationContext {
    /// A context that never expires and cannot be cancelled.
    pub fn background() -> Self {
        Self::default()
    }

    /// A context that expires `timeout` from now.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self::background().with_deadline(Instant::now() + timeout)
    }

    /// A cancellable context and the handle that cancels it.
    pub fn with_cancel() -> (Self, CancelHandle) {
        let (sender, receiver) = watch::channel(false);
        let ctx = Self {
            deadline: None,
            cancelled: Some(receiver),
        };
        (ctx, CancelHandle { sender })
    }

    /// Sets the deadline, keeping the earlier one if already set.
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(match self.deadline {
            Some(current) => current.min(deadline),
            None => deadline,
        });
        self
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.as_ref().is_some_and(|rx| *rx.borrow())
    }

    /// Fails fast if the context is already cancelled or expired.
    pub fn check(&self) -> Result<(), RepositoryError> {
        if self.is_cancelled() {
            return Err(RepositoryError::Cancelled);
        }
        if self.deadline.is_some_and(|d| Instant::now() >= d) {
            return Err(RepositoryError::DeadlineExceeded);
        }
        Ok(())
    }

    /// Runs `fut` until it completes, the context is cancelled, or the
    /// deadline passes, whichever happens first.
    pub async fn run<T, F>(&self, fut: F) -> Result<T, RepositoryError>
    where
        F: Future<Output = Result<T, RepositoryError>>,
    {
        self.check()?;

        let bounded = async {
            match self.deadline {
                Some(deadline) => match tokio::time::timeout_at(deadline, fut).await {
                    Ok(result) => result,
                    Err(_) => Err(RepositoryError::DeadlineExceeded),
                },
                None => fut.await,
            }
        };

        tokio::select! {
            biased;
            _ = wait_cancelled(self.cancelled.clone()) => Err(RepositoryError::Cancelled),
            result = bounded => result,
        }
    }
}

/// Resolves once the signal fires. Never resolves for contexts without a
/// signal or whose handle was dropped without cancelling.
async fn wait_cancelled(receiver: Option<watch::Receiver<bool>>) {
    if let Some(mut rx) = receiver {
        let fired = rx.wait_for(|cancelled| *cancelled).await.is_ok();
        if fired {
            return;
        }
    }
    std::future::pending::<()>().await
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn slow_ok() -> Result<u32, RepositoryError> {
        tokio::time::sleep(Duration::from_secs(5)).await;
        Ok(1)
    }

    #[tokio::test]
    async fn test_background_runs_to_completion() {
        let ctx = OperationContext::background();
        let result = ctx.run(async { Ok::<_, RepositoryError>(7) }).await;
        assert_eq!(result, Ok(7));
    }

    #[tokio::test]
    async fn test_deadline_aborts_slow_operation() {
        let ctx = OperationContext::with_timeout(Duration::from_millis(20));
        let result = ctx.run(slow_ok()).await;
        assert_eq!(result, Err(RepositoryError::DeadlineExceeded));
    }

    #[tokio::test]
    async fn test_cancel_aborts_in_flight_operation() {
        let (ctx, handle) = OperationContext::with_cancel();

        let task = tokio::spawn(async move { ctx.run(slow_ok()).await });
        tokio::time::sleep(Duration::from_millis(10)).await;
        handle.cancel();

        let result = task.await.unwrap();
        assert_eq!(result, Err(RepositoryError::Cancelled));
    }

    #[tokio::test]
    async fn test_cancelled_context_fails_before_starting() {
        let (ctx, handle) = OperationContext::with_cancel();
        handle.cancel();

        assert!(ctx.is_cancelled());
        assert_eq!(ctx.check(), Err(RepositoryError::Cancelled));
    }

    #[tokio::test]
    async fn test_dropped_handle_does_not_cancel() {
        let (ctx, handle) = OperationContext::with_cancel();
        drop(handle);

        let result = ctx.run(async { Ok::<_, RepositoryError>("done") }).await;
        assert_eq!(result, Ok("done"));
    }

    #[test]
    fn test_with_deadline_keeps_earliest() {
        let now = Instant::now();
        let ctx = OperationContext::background()
            .with_deadline(now + Duration::from_secs(1))
            .with_deadline(now + Duration::from_secs(10));
        assert_eq!(ctx.deadline(), Some(now + Duration::from_secs(1)));
    }
}
