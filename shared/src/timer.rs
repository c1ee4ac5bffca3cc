use std::time::{Duration, Instant};

/// Wall-clock countdown used for connection timeouts. The simulation itself
/// never reads wall-clock time; ticks come from the caller.
pub struct Timer {
    duration: Duration,
    last_reset: Instant,
}

impl Timer {
    pub fn new(duration: Duration) -> Self {
        Self {
            duration,
            last_reset: Instant::now(),
        }
    }

    pub fn reset(&mut self) {
        self.last_reset = Instant::now();
    }

    /// Returns whether the duration has fully elapsed since the last reset.
    pub fn ringing(&self) -> bool {
        self.last_reset.elapsed() >= self.duration
    }
}
