//! Pump H-bridge driver.
//!
//! Two active-low outputs, one per direction. Both high is brake/idle.
//!
//! ## Safety contract
//!
//! Forward and reverse are never asserted together. The state machine
//! never asks for it; if a caller does, the driver drives both off instead
//! and logs an error.

use embedded_hal::digital::OutputPin;
use log::{error, warn};

use crate::app::ports::DrivePort;
use crate::fsm::context::Outputs;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Reverse,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PumpState {
    Stopped,
    Running(Direction),
}

pub struct PumpDriver<F, R> {
    forward: F,
    reverse: R,
    state: PumpState,
}

impl<F: OutputPin, R: OutputPin> PumpDriver<F, R> {
    /// Take both pins and stop the pump.
    pub fn new(forward: F, reverse: R) -> Self {
        let mut pump = Self {
            forward,
            reverse,
            state: PumpState::Stopped,
        };
        pump.stop();
        pump
    }

    pub fn stop(&mut self) {
        self.write(false, false);
        self.state = PumpState::Stopped;
    }

    pub fn run(&mut self, direction: Direction) {
        match direction {
            Direction::Forward => self.write(true, false),
            Direction::Reverse => self.write(false, true),
        }
        self.state = PumpState::Running(direction);
    }

    pub fn state(&self) -> PumpState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        !matches!(self.state, PumpState::Stopped)
    }

    // Active-low: asserted drives the pin low.
    fn write(&mut self, fwd: bool, rev: bool) {
        let f = if fwd {
            self.forward.set_low()
        } else {
            self.forward.set_high()
        };
        let r = if rev {
            self.reverse.set_low()
        } else {
            self.reverse.set_high()
        };
        if f.is_err() || r.is_err() {
            warn!("pump: pin write failed");
        }
    }
}

impl<F: OutputPin, R: OutputPin> DrivePort for PumpDriver<F, R> {
    fn apply(&mut self, outputs: Outputs) {
        match (outputs.drive_forward, outputs.drive_reverse) {
            (false, false) => self.stop(),
            (true, false) => self.run(Direction::Forward),
            (false, true) => self.run(Direction::Reverse),
            (true, true) => {
                error!("pump: forward and reverse requested together, stopping");
                self.stop();
            }
        }
    }
}
