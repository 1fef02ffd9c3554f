//! Cancellation and deadline carrier threaded through every engine call.
//!
//! A `Context` is a shared abort flag plus an optional deadline. Backends
//! receive a `&Context` on every call and are expected to honor the deadline
//! mid-flight; the engine itself only checks `is_done` at attempt entry.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Cancellation token plus optional deadline, cheap to clone.
///
/// All clones (and children created via [`Context::with_timeout`]) share one
/// abort flag, so cancelling any of them cancels the whole tree.
#[derive(Debug, Clone)]
pub struct Context {
    abort: Arc<AtomicBool>,
    deadline: Option<Instant>,
}

impl Context {
    /// Root context: no deadline, not cancelled.
    pub fn background() -> Self {
        Self {
            abort: Arc::new(AtomicBool::new(false)),
            deadline: None,
        }
    }

    /// Child context whose deadline is `now + timeout`, clamped to the
    /// parent's own deadline when that is earlier.
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        let child = Instant::now() + timeout;
        let deadline = match self.deadline {
            Some(parent) if parent < child => Some(parent),
            _ => Some(child),
        };
        Self {
            abort: Arc::clone(&self.abort),
            deadline,
        }
    }

    /// Request cancellation; observed by every clone of this context.
    pub fn cancel(&self) {
        self.abort.store(true, Ordering::Relaxed);
    }

    /// True once cancelled or past the deadline.
    pub fn is_done(&self) -> bool {
        if self.abort.load(Ordering::Relaxed) {
            return true;
        }
        matches!(self.deadline, Some(d) if Instant::now() >= d)
    }

    /// Deadline, if one was set. Backends use this to bound blocking calls.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Time left until the deadline (`None` when unbounded).
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|d| d.saturating_duration_since(Instant::now()))
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::background()
    }
}
