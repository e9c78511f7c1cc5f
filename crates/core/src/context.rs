//! Per-operation execution context.
//!
//! An [`OpContext`] carries the caller's deadline and a cancellation token
//! down to every store call. [`OpContext::run`] races the store future
//! against both; when either fires the future is dropped, which returns any
//! pooled connection, discards rows read so far, and rolls back an open
//! transaction. Partial results are never returned.

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::error::StoreError;

/// Deadline and cancellation for a single store operation.
#[derive(Debug, Clone)]
pub struct OpContext {
    deadline: Option<Instant>,
    cancel: CancellationToken,
}

impl Default for OpContext {
    fn default() -> Self {
        Self::background()
    }
}

impl OpContext {
    /// A context with no deadline that is only cancelled explicitly.
    #[must_use]
    pub fn background() -> Self {
        Self {
            deadline: None,
            cancel: CancellationToken::new(),
        }
    }

    /// A context that expires `timeout` from now.
    #[must_use]
    pub fn with_timeout(timeout: Duration) -> Self {
        Self::with_deadline(Instant::now() + timeout)
    }

    /// A context that expires at `deadline`.
    #[must_use]
    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            deadline: Some(deadline),
            cancel: CancellationToken::new(),
        }
    }

    /// Derive a context that shares this deadline and is cancelled when
    /// this one is. Cancelling the child does not affect the parent.
    #[must_use]
    pub fn child(&self) -> Self {
        Self {
            deadline: self.deadline,
            cancel: self.cancel.child_token(),
        }
    }

    /// The deadline, if any.
    #[must_use]
    pub const fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Cancel this context and all of its children.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Whether [`cancel`](Self::cancel) has been called on this context or a parent.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Whether the deadline has already passed.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    /// Run `fut` under this context.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Cancelled` if the context is (or becomes)
    /// cancelled, `StoreError::Timeout` if the deadline passes first, and
    /// otherwise whatever `fut` resolves to.
    pub async fn run<T, F>(&self, op: &'static str, fut: F) -> Result<T, StoreError>
    where
        F: Future<Output = Result<T, StoreError>>,
    {
        if self.is_cancelled() {
            return Err(StoreError::Cancelled { op });
        }
        if self.is_expired() {
            return Err(StoreError::Timeout { op });
        }

        let bounded = async {
            match self.deadline {
                Some(deadline) => tokio::time::timeout_at(deadline, fut)
                    .await
                    .unwrap_or(Err(StoreError::Timeout { op })),
                None => fut.await,
            }
        };

        tokio::select! {
            biased;
            () = self.cancel.cancelled() => Err(StoreError::Cancelled { op }),
            result = bounded => result,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_run_passes_through_result() {
        let ctx = OpContext::background();
        let result = ctx.run("op", async { Ok::<_, StoreError>(5) }).await;
        assert_eq!(result, Ok(5));
    }

    #[tokio::test]
    async fn test_cancelled_context_never_starts_the_future() {
        let ctx = OpContext::background();
        ctx.cancel();

        let mut started = false;
        let result = ctx
            .run("list_products", async {
                started = true;
                Ok::<_, StoreError>(())
            })
            .await;

        assert_eq!(result, Err(StoreError::Cancelled { op: "list_products" }));
        assert!(!started);
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_interrupts_slow_operation() {
        let ctx = OpContext::with_timeout(Duration::from_secs(5));
        let result = ctx
            .run("get_product", async {
                tokio::time::sleep(Duration::from_secs(60)).await;
                Ok::<_, StoreError>(())
            })
            .await;

        assert_eq!(result, Err(StoreError::Timeout { op: "get_product" }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_deadline_fails_fast() {
        let ctx = OpContext::with_timeout(Duration::from_millis(10));
        tokio::time::advance(Duration::from_millis(20)).await;

        assert!(ctx.is_expired());
        let result = ctx.run("list_cart", async { Ok::<_, StoreError>(()) }).await;
        assert_eq!(result, Err(StoreError::Timeout { op: "list_cart" }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancellation_mid_flight() {
        let ctx = OpContext::background();
        let canceller = ctx.clone();

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(1)).await;
            canceller.cancel();
        });

        let result = ctx
            .run("search_products", async {
                tokio::time::sleep(Duration::from_secs(30)).await;
                Ok::<_, StoreError>(vec![1, 2, 3])
            })
            .await;

        assert_eq!(result, Err(StoreError::Cancelled { op: "search_products" }));
    }

    #[test]
    fn test_child_follows_parent_cancellation() {
        let parent = OpContext::background();
        let child = parent.child();

        child.cancel();
        assert!(!parent.is_cancelled());

        let other = parent.child();
        parent.cancel();
        assert!(other.is_cancelled());
    }
}
