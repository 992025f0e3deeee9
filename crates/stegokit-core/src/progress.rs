//! Progress reporting and cooperative cancellation for one operation.
//!
//! The front end hands a [`Monitor`] into each call; there is no global
//! observer state. The callback is invoked synchronously and only when the
//! whole-percentage value increases, so an absent or cheap subscriber never
//! slows the algorithm down.

use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;

use crate::error::{Result, StegoError};

type ProgressCallback = Box<dyn Fn(u8) + Send + Sync>;

/// Shared flag to cancel a running operation from another thread.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Per-operation progress sink. Percentage is monotone in [0, 100] and
/// resets with every new `Monitor`.
#[derive(Default)]
pub struct Monitor {
    callback: Option<ProgressCallback>,
    current: AtomicU8,
    token: CancelToken,
}

impl Monitor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_progress<F: Fn(u8) + Send + Sync + 'static>(callback: F) -> Self {
        Self {
            callback: Some(Box::new(callback)),
            ..Self::default()
        }
    }

    /// Token handle for cancelling this operation cooperatively.
    pub fn cancel_token(&self) -> CancelToken {
        self.token.clone()
    }

    /// Reports `current` of `total` steps, notifying on whole-percentage
    /// boundary crossings only.
    pub fn report(&self, current: usize, total: usize) {
        if total == 0 {
            return;
        }
        let percentage = ((100 * current) / total).min(100) as u8;
        if percentage > self.current.swap(percentage, Ordering::Relaxed) {
            if let Some(callback) = &self.callback {
                callback(percentage);
            }
        }
    }

    /// Checked between algorithm steps; cancellation surfaces as an error
    /// and leaves the original carrier untouched.
    pub fn ensure_active(&self) -> Result<()> {
        if self.token.is_cancelled() {
            Err(StegoError::Cancelled)
        } else {
            Ok(())
        }
    }
}

impl std::fmt::Debug for Monitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Monitor")
            .field("current", &self.current.load(Ordering::Relaxed))
            .field("cancelled", &self.token.is_cancelled())
            .finish()
    }
}
