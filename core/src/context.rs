//! Deadline and cancellation token threaded through every request.
//!
//! # Design
//! A `Context` is an immutable value. Deriving a child (`with_timeout`,
//! `with_deadline`, `with_cancel`) never changes the parent, and a child is done
//! as soon as any of its ancestors is done. Cancellation flags are shared
//! through `Arc<AtomicBool>`, so a `CancelHandle` can be moved to another
//! thread and fired while the request is in flight.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::error::ContextError;

#[derive(Debug, Clone, Default)]
pub struct Context {
    deadline: Option<Instant>,
    cancelled: Vec<Arc<AtomicBool>>,
}

/// Cancels the context returned alongside it by [`Context::with_cancel`].
#[derive(Debug, Clone)]
pub struct CancelHandle {
    flag: Arc<AtomicBool>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }
}

impl Context {
    /// A context that is never cancelled and has no deadline.
    pub fn background() -> Self {
        Self::default()
    }

    /// Child context that expires at `deadline` or at the parent's deadline,
    /// whichever comes first.
    pub fn with_deadline(&self, deadline: Instant) -> Self {
        let deadline = match self.deadline {
            Some(current) if current <= deadline => current,
            _ => deadline,
        };
        Self {
            deadline: Some(deadline),
            cancelled: self.cancelled.clone(),
        }
    }

    /// Child context that expires `timeout` from now. A timeout too large to
    /// represent leaves the parent's deadline in place.
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        match Instant::now().checked_add(timeout) {
            Some(deadline) => self.with_deadline(deadline),
            None => self.clone(),
        }
    }

    pub fn with_cancel(&self) -> (Self, CancelHandle) {
        let flag = Arc::new(AtomicBool::new(false));
        let mut cancelled = self.cancelled.clone();
        cancelled.push(Arc::clone(&flag));
        let ctx = Self {
            deadline: self.deadline,
            cancelled,
        };
        (ctx, CancelHandle { flag })
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Time left before the deadline; `Some(Duration::ZERO)` once it passed.
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
    }

    /// Why the context is done, or `None` while it is still live.
    /// Cancellation wins over an expired deadline.
    pub fn err(&self) -> Option<ContextError> {
        if self.cancelled.iter().any(|flag| flag.load(Ordering::SeqCst)) {
            return Some(ContextError::Canceled);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Some(ContextError::DeadlineExceeded),
            _ => None,
        }
    }

    pub fn is_done(&self) -> bool {
        self.err().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn background_is_never_done() {
        let ctx = Context::background();
        assert!(ctx.err().is_none());
        assert!(ctx.deadline().is_none());
        assert!(ctx.remaining().is_none());
    }

    #[test]
    fn expired_deadline_reports_deadline_exceeded() {
        let ctx = Context::background().with_deadline(Instant::now() - Duration::from_secs(1));
        assert_eq!(ctx.err(), Some(ContextError::DeadlineExceeded));
        assert_eq!(ctx.remaining(), Some(Duration::ZERO));
    }

    #[test]
    fn earliest_deadline_wins() {
        let parent = Context::background().with_timeout(Duration::from_millis(10));
        let child = parent.with_timeout(Duration::from_secs(3600));
        assert_eq!(child.deadline(), parent.deadline());

        let tighter = parent.with_deadline(Instant::now());
        assert!(tighter.deadline() < parent.deadline());
    }

    #[test]
    fn cancel_propagates_to_children_only() {
        let parent = Context::background();
        let (ctx, handle) = parent.with_cancel();
        let child = ctx.with_timeout(Duration::from_secs(60));

        handle.cancel();
        assert_eq!(ctx.err(), Some(ContextError::Canceled));
        assert_eq!(child.err(), Some(ContextError::Canceled));
        assert!(parent.err().is_none());
    }

    #[test]
    fn cancellation_takes_precedence_over_deadline() {
        let (ctx, handle) = Context::background()
            .with_deadline(Instant::now() - Duration::from_secs(1))
            .with_cancel();
        handle.cancel();
        assert_eq!(ctx.err(), Some(ContextError::Canceled));
    }
}
