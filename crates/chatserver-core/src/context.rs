//! Request context for a single unit of work.
//!
//! `RequestContext` carries the request identifier, a cancellation token, and
//! an optional deadline. Transaction managers watch both and roll back when
//! either fires before the work finishes.

use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Cancellable context passed to every service operation.
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// Unique identifier for this request, recorded on every span.
    pub request_id: Uuid,
    /// Cancelling this token aborts the in-flight unit of work.
    pub cancellation: CancellationToken,
    /// Point in time after which the unit of work is abandoned.
    pub deadline: Option<Instant>,
}

impl RequestContext {
    /// Create a context with a fresh request ID, no deadline, and its own
    /// cancellation token.
    pub fn new() -> Self {
        Self {
            request_id: Uuid::now_v7(),
            cancellation: CancellationToken::new(),
            deadline: None,
        }
    }

    /// Set the deadline to `timeout` from now.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.deadline = Some(Instant::now() + timeout);
        self
    }

    /// Apply `timeout` if present.
    pub fn with_optional_timeout(self, timeout: Option<Duration>) -> Self {
        match timeout {
            Some(timeout) => self.with_timeout(timeout),
            None => self,
        }
    }

    /// Use a child of `parent` as this context's cancellation token, so that
    /// cancelling the parent (e.g. on shutdown) cancels this request.
    pub fn with_parent_cancellation(mut self, parent: &CancellationToken) -> Self {
        self.cancellation = parent.child_token();
        self
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }

    pub fn cancel(&self) {
        self.cancellation.cancel();
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_context_has_no_deadline() {
        let ctx = RequestContext::new();
        assert!(ctx.deadline.is_none());
        assert!(!ctx.is_cancelled());
    }

    #[test]
    fn test_request_ids_are_unique() {
        let a = RequestContext::new();
        let b = RequestContext::new();
        assert_ne!(a.request_id, b.request_id);
    }

    #[tokio::test]
    async fn test_with_timeout_sets_future_deadline() {
        let ctx = RequestContext::new().with_timeout(Duration::from_secs(5));
        let deadline = ctx.deadline.unwrap();
        assert!(deadline > Instant::now());
    }

    #[tokio::test]
    async fn test_with_optional_timeout_none_keeps_no_deadline() {
        let ctx = RequestContext::new().with_optional_timeout(None);
        assert!(ctx.deadline.is_none());
    }

    #[test]
    fn test_parent_cancellation_propagates() {
        let parent = CancellationToken::new();
        let ctx = RequestContext::new().with_parent_cancellation(&parent);
        assert!(!ctx.is_cancelled());
        parent.cancel();
        assert!(ctx.is_cancelled());
    }

    #[test]
    fn test_child_cancel_does_not_cancel_parent() {
        let parent = CancellationToken::new();
        let ctx = RequestContext::new().with_parent_cancellation(&parent);
        ctx.cancel();
        assert!(ctx.is_cancelled());
        assert!(!parent.is_cancelled());
    }
}
