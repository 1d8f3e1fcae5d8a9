//! Damped focus transition between two active positions
//!
//! Exponential approach, the same decay the line animations use for blur
//! and opacity:
//!
//! ```text
//! progress(t) = 1 - e^(-damping * SETTLE_RATE * t)
//! position(t) = from + (to - from) * progress(t)
//! ```
//!
//! Larger `damping` settles faster. A transition from the last line back to
//! line 0 travels the whole way back (linear path, no wrap).

use std::time::Duration;

/// Base decay rate per second, scaled by the configured damping
pub const SETTLE_RATE: f64 = 6.0;

/// Progress (0.0 - 1.0) after `elapsed` seconds
#[inline]
pub fn settle_progress(elapsed_secs: f64, damping: f64) -> f64 {
    if elapsed_secs <= 0.0 {
        return 0.0;
    }
    1.0 - (-damping * SETTLE_RATE * elapsed_secs).exp()
}

/// A move of the active position from one index to the next
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FocusTransition {
    pub from: f64,
    pub to: f64,
    pub damping: f64,
}

impl FocusTransition {
    pub fn new(from: f64, to: f64, damping: f64) -> Self {
        Self { from, to, damping }
    }

    /// A transition that has already arrived
    pub fn settled(at: f64, damping: f64) -> Self {
        Self::new(at, at, damping)
    }

    /// Active position `elapsed` after the transition started
    pub fn position(&self, elapsed: Duration) -> f64 {
        if self.from == self.to {
            return self.to;
        }
        let p = settle_progress(elapsed.as_secs_f64(), self.damping);
        self.from + (self.to - self.from) * p
    }
}
