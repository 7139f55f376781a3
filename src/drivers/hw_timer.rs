//! Periodic tick source for the countdown timers.
//!
//! On the board SysTick calls [`CountdownTimers::tick`] from its interrupt.
//! On the host a dedicated thread stands in for it: it sleeps to the next
//! 1 ms deadline and, if the OS scheduled it late, replays the missed ticks
//! so the countdowns keep wall-clock pace.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use log::{info, warn};

use crate::timers::{CountdownTimers, TICK_PERIOD_MS};

/// Upper bound on ticks replayed after one late wake-up.
const MAX_CATCH_UP: u32 = 1_000;

pub struct TickSource {
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl TickSource {
    /// Spawn the tick thread.
    pub fn start(timers: Arc<CountdownTimers>) -> std::io::Result<Self> {
        let stop = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&stop);
        let handle = thread::Builder::new()
            .name("tick".into())
            .spawn(move || run(&timers, &flag))?;
        info!("hw_timer(sim): {} ms tick started", TICK_PERIOD_MS);
        Ok(Self {
            stop,
            handle: Some(handle),
        })
    }

    /// Stop and join the tick thread.
    pub fn stop(&mut self) {
        self.stop.store(true, Ordering::Release);
        if let Some(h) = self.handle.take() {
            if h.join().is_err() {
                warn!("hw_timer(sim): tick thread panicked");
            }
        }
    }
}

impl Drop for TickSource {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run(timers: &CountdownTimers, stop: &AtomicBool) {
    let period = Duration::from_millis(TICK_PERIOD_MS as u64);
    let mut next = Instant::now() + period;

    while !stop.load(Ordering::Acquire) {
        let now = Instant::now();
        if now < next {
            thread::sleep(next - now);
            continue;
        }

        let behind = (now - next).as_millis() / period.as_millis().max(1) + 1;
        let ticks = (behind as u32).min(MAX_CATCH_UP);
        timers.advance(ticks);
        if behind as u32 > MAX_CATCH_UP {
            warn!("hw_timer(sim): dropped {} ticks", behind as u32 - MAX_CATCH_UP);
            next = now + period;
        } else {
            next += period * ticks;
        }
    }
}
