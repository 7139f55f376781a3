//! Operator control sampler.
//!
//! Three momentary/latched inputs: start (foot switch), flush-select and
//! emergency stop. Each is read once per control cycle and mapped through
//! the deployment's [`InputPolarity`]. No debouncing here; the run-state
//! machine debounces start release itself.
//!
//! A failed read is resolved fail-safe: emergency stop reads asserted,
//! start and flush read released.

use embedded_hal::digital::InputPin;
use log::warn;

use crate::app::ports::InputPort;
use crate::config::{InputPolarity, Polarity};
use crate::fsm::context::Inputs;

pub struct InputSampler<S, F, E> {
    start: S,
    flush: F,
    estop: E,
    polarity: InputPolarity,
}

impl<S: InputPin, F: InputPin, E: InputPin> InputSampler<S, F, E> {
    pub fn new(start: S, flush: F, estop: E, polarity: InputPolarity) -> Self {
        Self {
            start,
            flush,
            estop,
            polarity,
        }
    }
}

/// Read one line; `on_error` is the logical value substituted on failure.
fn read_line<P: InputPin>(pin: &mut P, polarity: Polarity, on_error: bool, name: &str) -> bool {
    match pin.is_high() {
        Ok(high) => polarity.is_asserted(high),
        Err(_) => {
            warn!("inputs: {} read failed, assuming {}", name, on_error);
            on_error
        }
    }
}

impl<S: InputPin, F: InputPin, E: InputPin> InputPort for InputSampler<S, F, E> {
    fn sample(&mut self) -> Inputs {
        Inputs {
            start_requested: read_line(&mut self.start, self.polarity.start, false, "start"),
            flush_requested: read_line(&mut self.flush, self.polarity.flush, false, "flush"),
            emergency_stop_active: read_line(&mut self.estop, self.polarity.estop, true, "estop"),
        }
    }
}
