//! Countdown timer service.
//!
//! Two independent millisecond counters shared between the control loop
//! and a periodic tick source (SysTick on the board, a thread in the
//! simulator). The loop arms a channel with [`CountdownTimers::set_delay`];
//! the tick source calls [`CountdownTimers::tick`] every
//! [`TICK_PERIOD_MS`] and walks each armed channel down to zero.
//!
//! The loop only ever acts on the nonzero → zero edge, which is monotonic,
//! so a single-word atomic per channel is the whole synchronisation
//! contract. No locks, no critical sections.

use core::sync::atomic::{AtomicU32, Ordering};

/// Period of the external tick source.
pub const TICK_PERIOD_MS: u32 = 1;

/// Countdown channel selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(usize)]
pub enum Channel {
    /// Run / flush / retract deadline, owned by the run-state machine.
    Run = 0,
    /// Blink phase deadline, owned by the indicator controller.
    Blink = 1,
}

impl Channel {
    pub const COUNT: usize = 2;
    pub const ALL: [Channel; Channel::COUNT] = [Channel::Run, Channel::Blink];
}

/// Lock-free countdown counters.
///
/// `const`-constructible so it can live in a `static` reachable from the
/// tick interrupt.
pub struct CountdownTimers {
    counters: [AtomicU32; Channel::COUNT],
}

impl CountdownTimers {
    pub const fn new() -> Self {
        Self {
            counters: [AtomicU32::new(0), AtomicU32::new(0)],
        }
    }

    /// Arm `channel` to expire `ms` milliseconds from now. Zero disarms.
    pub fn set_delay(&self, channel: Channel, ms: u32) {
        self.counters[channel as usize].store(ms, Ordering::Release);
    }

    /// Remaining milliseconds on `channel`.
    pub fn delay(&self, channel: Channel) -> u32 {
        self.counters[channel as usize].load(Ordering::Acquire)
    }

    pub fn is_expired(&self, channel: Channel) -> bool {
        self.delay(channel) == 0
    }

    pub fn cancel(&self, channel: Channel) {
        self.set_delay(channel, 0);
    }

    /// One tick of the periodic source.
    ///
    /// Each nonzero channel drops by exactly [`TICK_PERIOD_MS`], clamping at
    /// zero. A re-arm racing with the decrement is never lost: the update
    /// is a compare-and-swap on the current value.
    pub fn tick(&self) {
        for counter in &self.counters {
            let _ = counter.fetch_update(Ordering::AcqRel, Ordering::Acquire, |ms| {
                (ms > 0).then(|| ms.saturating_sub(TICK_PERIOD_MS))
            });
        }
    }

    /// Convenience for tests and the simulator: `n` consecutive ticks.
    pub fn advance(&self, n: u32) {
        for _ in 0..n {
            self.tick();
        }
    }
}

impl Default for CountdownTimers {
    fn default() -> Self {
        Self::new()
    }
}
