//! Shared mutable context threaded through every FSM handler.
//!
//! `FsmContext` is the single struct that state handlers read from and
//! write to: the latest input snapshot, the requested outputs, the pending
//! indicator request, phase timing and the configuration. Think of it as
//! the "blackboard" in a blackboard architecture.

use crate::config::SystemConfig;
use crate::drivers::status_led::{LedColor, LedMode};
use crate::timers::{Channel, CountdownTimers};

// ---------------------------------------------------------------------------
// Input snapshot (written by the sampler before each tick)
// ---------------------------------------------------------------------------

/// Logical operator controls, polarity already applied.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Inputs {
    pub start_requested: bool,
    pub flush_requested: bool,
    pub emergency_stop_active: bool,
}

// ---------------------------------------------------------------------------
// Drive outputs (written by handlers, applied after the tick)
// ---------------------------------------------------------------------------

/// Requested pump direction. Never both true.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Outputs {
    pub drive_forward: bool,
    pub drive_reverse: bool,
}

impl Outputs {
    /// Both drives off.
    pub const fn all_off() -> Self {
        Self {
            drive_forward: false,
            drive_reverse: false,
        }
    }

    pub const fn forward() -> Self {
        Self {
            drive_forward: true,
            drive_reverse: false,
        }
    }

    pub const fn reverse() -> Self {
        Self {
            drive_forward: false,
            drive_reverse: true,
        }
    }

    pub const fn is_idle(&self) -> bool {
        !self.drive_forward && !self.drive_reverse
    }
}

// ---------------------------------------------------------------------------
// Start-release hold
// ---------------------------------------------------------------------------

/// Release tracking for the start control.
///
/// A run or flush begins with start held. The handler must see it
/// released, then ignore the line for the settle window, before a
/// second press means anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hold {
    /// Start line is live.
    Clear,
    /// Waiting for the press that began this phase to end.
    AwaitingRelease,
    /// Released at `since_ms`; start ignored until the settle window ends.
    Settling { since_ms: u32 },
    /// Flush has stopped the pump; waiting for start release to finish.
    Draining,
}

// ---------------------------------------------------------------------------
// FsmContext
// ---------------------------------------------------------------------------

/// The shared context passed to every state handler function.
pub struct FsmContext<'t> {
    // -- Inputs / outputs --
    pub inputs: Inputs,
    pub outputs: Outputs,
    /// Indicator change requested this tick; taken by the controller.
    pub indicator: Option<(LedMode, LedColor)>,

    // -- Timing --
    /// Loop time of the current tick (ms, wrapping).
    pub now_ms: u32,
    /// When the current Running or Flushing phase was entered.
    pub phase_started_ms: u32,
    /// Wall time of the last Running phase, taken when it was left.
    pub run_elapsed_ms: u32,
    /// Calibrated duration of the current metered run.
    pub run_setpoint_ms: u32,
    pub hold: Hold,

    // -- Results --
    /// Phase time of a cycle that just completed; taken by the
    /// controller and committed to the statistics store.
    pub completed_run_ms: Option<u32>,

    // -- Configuration --
    pub config: SystemConfig,

    // -- Shared --
    pub timers: &'t CountdownTimers,
}

impl<'t> FsmContext<'t> {
    pub fn new(config: SystemConfig, timers: &'t CountdownTimers) -> Self {
        Self {
            inputs: Inputs::default(),
            outputs: Outputs::all_off(),
            indicator: None,
            now_ms: 0,
            phase_started_ms: 0,
            run_elapsed_ms: 0,
            run_setpoint_ms: 0,
            hold: Hold::Clear,
            completed_run_ms: None,
            config,
            timers,
        }
    }

    /// Queue an indicator change for this tick.
    pub fn request_indicator(&mut self, mode: LedMode, color: LedColor) {
        self.indicator = Some((mode, color));
    }

    pub fn run_expired(&self) -> bool {
        self.timers.is_expired(Channel::Run)
    }

    /// Mark the start of a pumping phase.
    pub fn begin_phase(&mut self) {
        self.phase_started_ms = self.now_ms;
        self.hold = Hold::AwaitingRelease;
    }

    /// Time since the current phase was entered, including any wait for
    /// the start control after the pump has stopped.
    pub fn phase_elapsed_ms(&self) -> u32 {
        self.now_ms.wrapping_sub(self.phase_started_ms)
    }

    /// Advance the release hold. Returns `true` once the start line is
    /// live again.
    pub fn update_hold(&mut self) -> bool {
        match self.hold {
            Hold::Clear => true,
            Hold::AwaitingRelease => {
                if !self.inputs.start_requested {
                    self.hold = Hold::Settling {
                        since_ms: self.now_ms,
                    };
                }
                false
            }
            Hold::Settling { since_ms } => {
                if self.now_ms.wrapping_sub(since_ms) >= self.config.release_settle_ms {
                    self.hold = Hold::Clear;
                    true
                } else {
                    false
                }
            }
            Hold::Draining => false,
        }
    }
}
