//! Host time adapter.
//!
//! The control loop needs a wrapping millisecond clock, the same shape as
//! the board's 32-bit `HAL_GetTick`. On the host it is derived from
//! `std::time::Instant`.

use std::time::Instant;

pub struct MonotonicClock {
    start: Instant,
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Milliseconds since construction, wrapping at `u32::MAX`.
    pub fn uptime_ms(&self) -> u32 {
        self.start.elapsed().as_millis() as u32
    }
}
