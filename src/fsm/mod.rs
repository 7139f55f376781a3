//! Run-state machine engine.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │  RunState   │ on_enter           │ on_update                 │
//! ├─────────────┼────────────────────┼───────────────────────────┤
//! │ Idle        │ drives off         │ start ⇒ Running/Flushing  │
//! │ Running     │ forward, blink     │ Run == 0 ⇒ Retracting     │
//! │ Retracting  │ reverse            │ Run == 0 ⇒ Idle (record)  │
//! │ Flushing    │ forward, solid     │ start/Run == 0 ⇒ Idle     │
//! │ EStop       │ drives off         │ estop clear ⇒ Idle        │
//! └─────────────┴────────────────────┴───────────────────────────┘
//! ```
//!
//! Each tick the engine calls the update handler for the **current**
//! state. If it returns `Some(next)`, the engine runs the exit action for
//! the current state, then the enter action for the next, and updates
//! the current state. Dispatch is an exhaustive `match` over
//! [`RunState`]; there is no fallback arm. All handlers receive
//! `&mut FsmContext`, which holds inputs, outputs, config and timing.

pub mod context;
pub mod states;

use core::fmt;

use context::FsmContext;
use log::info;

use crate::app::ports::SetpointAdc;
use crate::drivers::setpoint::SetpointCalibrator;
use crate::error::Result;

// ---------------------------------------------------------------------------
// State identity
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum RunState {
    Idle = 0,
    Running = 1,
    Retracting = 2,
    Flushing = 3,
    EStop = 4,
}

impl RunState {
    pub const COUNT: usize = 5;

    pub const ALL: [RunState; RunState::COUNT] = [
        RunState::Idle,
        RunState::Running,
        RunState::Retracting,
        RunState::Flushing,
        RunState::EStop,
    ];

    /// One-letter console code.
    pub const fn letter(self) -> char {
        match self {
            Self::Idle => 'I',
            Self::Running => 'R',
            Self::Retracting => 'V',
            Self::Flushing => 'F',
            Self::EStop => 'E',
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Idle => "Idle",
            Self::Running => "Running",
            Self::Retracting => "Retracting",
            Self::Flushing => "Flushing",
            Self::EStop => "EStop",
        }
    }
}

/// A committed state change, printed as its console token (`I>R`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: RunState,
    pub to: RunState,
}

impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}>{}", self.from.letter(), self.to.letter())
    }
}

// ---------------------------------------------------------------------------
// FSM engine
// ---------------------------------------------------------------------------

pub struct Fsm {
    current: RunState,
}

impl Fsm {
    pub fn new(initial: RunState) -> Self {
        Self { current: initial }
    }

    /// Run the enter action for the starting state.
    /// Call once after construction, before the first `tick()`.
    pub fn start(&mut self, ctx: &mut FsmContext) {
        info!("FSM starting in state: {}", self.current.name());
        states::enter(self.current, ctx);
    }

    /// Advance the FSM by one tick.
    ///
    /// An `Err` means the update handler aborted before committing
    /// anything; the state is unchanged.
    pub fn tick<A: SetpointAdc>(
        &mut self,
        ctx: &mut FsmContext,
        setpoint: &mut SetpointCalibrator<A>,
    ) -> Result<Option<Transition>> {
        let next = states::update(self.current, ctx, setpoint)?;
        Ok(next.map(|to| self.transition(to, ctx)))
    }

    /// Force an immediate transition (used by the emergency-stop override
    /// regardless of what the update handler would decide).
    pub fn force_transition(&mut self, next: RunState, ctx: &mut FsmContext) -> Option<Transition> {
        (next != self.current).then(|| self.transition(next, ctx))
    }

    pub fn current_state(&self) -> RunState {
        self.current
    }

    fn transition(&mut self, next: RunState, ctx: &mut FsmContext) -> Transition {
        let t = Transition {
            from: self.current,
            to: next,
        };
        info!("FSM transition: {} -> {}", t.from.name(), t.to.name());

        states::exit(self.current, ctx);
        self.current = next;
        states::enter(self.current, ctx);
        t
    }
}
