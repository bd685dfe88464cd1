//! Cancellation and deadline propagation for DAO and client calls

use std::future::Future;
use std::time::Duration;

use futures::future::{select_all, FutureExt};
use tokio::sync::watch;
use tokio::time::Instant;

/// Why a context stopped waiting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Interrupted {
    #[error("context cancelled")]
    Cancelled,
    #[error("context deadline exceeded")]
    DeadlineExceeded,
}

/// A cancellation signal plus an optional deadline.
///
/// Contexts are cheap to clone. Derived contexts inherit every cancellation
/// signal of their parent and the earlier of the two deadlines, so cancelling
/// a parent also stops work started under its children.
///
/// ```ignore
/// let (ctx, cancel) = Context::background().with_cancel();
/// let ctx = ctx.with_timeout(Duration::from_secs(2));
/// let user = dao.get(&ctx, 7).await?;
/// cancel.cancel();
/// ```
#[derive(Debug, Clone, Default)]
pub struct Context {
    signals: Vec<watch::Receiver<bool>>,
    deadline: Option<Instant>,
}

/// Cancels the context it was created with.
///
/// Dropping the handle without calling [`CancelHandle::cancel`] leaves the
/// context running until its deadline.
#[derive(Debug)]
pub struct CancelHandle {
    sender: watch::Sender<bool>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        self.sender.send_replace(true);
    }
}

impl Context {
    /// A context that is never cancelled and has no deadline.
    pub fn background() -> Self {
        Self::default()
    }

    /// Derive a context that can be cancelled through the returned handle.
    pub fn with_cancel(&self) -> (Context, CancelHandle) {
        let (sender, receiver) = watch::channel(false);
        let mut child = self.clone();
        child.signals.push(receiver);
        (child, CancelHandle { sender })
    }

    /// Derive a context that expires after `timeout`.
    pub fn with_timeout(&self, timeout: Duration) -> Context {
        self.with_deadline(Instant::now() + timeout)
    }

    /// Derive a context that expires at `deadline`, or earlier if the
    /// parent's deadline comes first.
    pub fn with_deadline(&self, deadline: Instant) -> Context {
        let mut child = self.clone();
        child.deadline = Some(match self.deadline {
            Some(parent) => parent.min(deadline),
            None => deadline,
        });
        child
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Time left until the deadline, if there is one.
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|d| d.saturating_duration_since(Instant::now()))
    }

    /// The reason this context already stopped, if it has.
    pub fn err(&self) -> Option<Interrupted> {
        if self.signals.iter().any(|rx| *rx.borrow()) {
            return Some(Interrupted::Cancelled);
        }
        match self.deadline {
            Some(d) if Instant::now() >= d => Some(Interrupted::DeadlineExceeded),
            _ => None,
        }
    }

    /// Resolves once the context is cancelled or its deadline passes.
    pub async fn done(&self) -> Interrupted {
        let deadline = async {
            match self.deadline {
                Some(d) => tokio::time::sleep_until(d).await,
                None => std::future::pending::<()>().await,
            }
        };
        let cancelled = async {
            if self.signals.is_empty() {
                return std::future::pending::<()>().await;
            }
            let waits = self
                .signals
                .iter()
                .cloned()
                .map(|rx| wait_cancelled(rx).boxed());
            select_all(waits).await;
        };
        tokio::select! {
            biased;
            _ = cancelled => Interrupted::Cancelled,
            _ = deadline => Interrupted::DeadlineExceeded,
        }
    }

    /// Drive `fut` to completion unless the context stops first.
    ///
    /// An already-stopped context never polls `fut`.
    pub async fn run<F: Future>(&self, fut: F) -> Result<F::Output, Interrupted> {
        if let Some(reason) = self.err() {
            return Err(reason);
        }
        tokio::select! {
            biased;
            reason = self.done() => Err(reason),
            out = fut => Ok(out),
        }
    }
}

async fn wait_cancelled(mut rx: watch::Receiver<bool>) {
    // A dropped handle can never cancel.
    if rx.wait_for(|cancelled| *cancelled).await.is_err() {
        std::future::pending::<()>().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_background_runs_to_completion() {
        let ctx = Context::background();
        assert_eq!(ctx.run(async { 5 }).await, Ok(5));
        assert!(ctx.err().is_none());
    }

    #[tokio::test]
    async fn test_cancel_interrupts_pending_work() {
        let (ctx, cancel) = Context::background().with_cancel();
        let task = tokio::spawn({
            let ctx = ctx.clone();
            async move { ctx.run(std::future::pending::<()>()).await }
        });
        cancel.cancel();
        assert_eq!(task.await.unwrap(), Err(Interrupted::Cancelled));
        assert_eq!(ctx.err(), Some(Interrupted::Cancelled));
    }

    #[tokio::test]
    async fn test_parent_cancel_reaches_child() {
        let (parent, cancel) = Context::background().with_cancel();
        let child = parent.with_timeout(Duration::from_secs(30));
        cancel.cancel();
        assert_eq!(
            child.run(std::future::pending::<()>()).await,
            Err(Interrupted::Cancelled)
        );
    }

    #[tokio::test]
    async fn test_deadline_exceeded() {
        let ctx = Context::background().with_timeout(Duration::from_millis(20));
        let res = ctx
            .run(tokio::time::sleep(Duration::from_secs(5)))
            .await;
        assert_eq!(res, Err(Interrupted::DeadlineExceeded));
    }

    #[test]
    fn test_child_keeps_earlier_deadline() {
        let now = Instant::now();
        let parent = Context::background().with_deadline(now + Duration::from_secs(1));
        let child = parent.with_deadline(now + Duration::from_secs(10));
        assert_eq!(child.deadline(), Some(now + Duration::from_secs(1)));
    }

    #[tokio::test]
    async fn test_dropped_handle_never_cancels() {
        let (ctx, cancel) = Context::background().with_cancel();
        drop(cancel);
        let ctx = ctx.with_timeout(Duration::from_millis(20));
        assert_eq!(
            ctx.run(std::future::pending::<()>()).await,
            Err(Interrupted::DeadlineExceeded)
        );
    }
}
