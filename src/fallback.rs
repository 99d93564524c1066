// Fallback reporting - where the pipeline reports its own failures
//
// Reports go straight to `tracing` under a fixed target and never through the
// corelog pipeline, so a failing sink cannot recurse into itself.

use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Target used for every fallback report
pub const FALLBACK_TARGET: &str = "corelog::fallback";

/// Window for rate-limited overflow warnings
pub const DROP_WARNING_WINDOW: Duration = Duration::from_secs(60);

pub fn report_warning(message: &str) {
    tracing::warn!(target: FALLBACK_TARGET, "{}", message);
}

pub fn report_error(context: &str, error: &dyn std::fmt::Display) {
    tracing::error!(target: FALLBACK_TARGET, context, error = %error, "logging pipeline failure");
}

/// Allows one report per window regardless of how many events arrive
#[derive(Debug)]
pub struct RateLimiter {
    window: Duration,
    last: Mutex<Option<Instant>>,
}

impl RateLimiter {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            last: Mutex::new(None),
        }
    }

    /// Returns true if the caller may report now, and starts a new window
    pub fn try_acquire(&self) -> bool {
        self.try_acquire_at(Instant::now())
    }

    fn try_acquire_at(&self, now: Instant) -> bool {
        let Ok(mut last) = self.last.lock() else {
            return false;
        };
        match *last {
            Some(prev) if now.duration_since(prev) < self.window => false,
            _ => {
                *last = Some(now);
                true
            }
        }
    }
}
