use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

/// Cooperative cancellation shared by every loop taking part in one run.
///
/// Clones share the same flag, so the walk, the hash loop and the worker
/// claim loop all observe a single `cancel()` call. Cancelling never
/// interrupts work in progress; loops check `is_cancelled()` before starting
/// the next unit.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    inner: Arc<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    cancelled: AtomicBool,
    reason: OnceLock<String>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.inner.cancelled.store(true, Ordering::SeqCst);
    }

    /// Cancel and record why. Only the first reason is kept.
    pub fn cancel_with_reason(&self, reason: impl Into<String>) {
        let _ = self.inner.reason.set(reason.into());
        self.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::SeqCst)
    }

    pub fn reason(&self) -> Option<&str> {
        self.inner.reason.get().map(String::as_str)
    }
}
