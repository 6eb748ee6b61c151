//! Wall-clock and cancellation limits for the sweep loop.
//!
//! [`SweepBudget`] is checked once at the top of every sweep, never inside
//! one, so a sweep that has started always finishes (or hits a zero pivot).
//! The iteration budget itself lives in the solver's convergence logic.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::types::StoppingReason;

/// Shared flag a caller can flip to stop a running solve.
///
/// Cloning yields another handle to the same flag, so one token can be
/// handed to several solvers running on other threads.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Takes effect at the next sweep boundary.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}

/// Enforces the deadline and cancellation token during one solve.
///
/// Non-`Clone`: each solve owns exactly one.
#[derive(Debug)]
pub struct SweepBudget {
    start_time: Instant,
    max_time: Option<Duration>,
    cancel: Option<CancelToken>,
}

impl SweepBudget {
    /// Start the clock now.
    pub fn new(max_time: Option<Duration>, cancel: Option<CancelToken>) -> Self {
        Self {
            start_time: Instant::now(),
            max_time,
            cancel,
        }
    }

    /// A budget with no deadline and no token.
    pub fn unlimited() -> Self {
        Self::new(None, None)
    }

    /// Call once before each sweep. Returns the terminal reason when the
    /// next sweep must not start.
    pub fn check_sweep(&self) -> Option<StoppingReason> {
        if self.cancel.as_ref().is_some_and(CancelToken::is_cancelled) {
            return Some(StoppingReason::Cancelled);
        }
        match self.max_time {
            Some(limit) if self.start_time.elapsed() > limit => {
                Some(StoppingReason::DeadlineExceeded)
            }
            _ => None,
        }
    }

    #[inline]
    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }
}
