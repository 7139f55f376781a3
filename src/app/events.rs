//! Outbound application events.
//!
//! The [`Controller`](super::service::Controller) emits these through the
//! [`EventSink`](super::ports::EventSink) port. Adapters on the other side
//! decide what to do with them; the stock one prints the console lines
//! operators and service technicians read.

use crate::fsm::{RunState, Transition};
use crate::stats::RunStats;

/// Structured events emitted by the control core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEvent {
    /// Power-on banner.
    Banner {
        version: &'static str,
        build: &'static str,
        stats: RunStats,
    },

    /// The controller has started (carries the initial state).
    Started(RunState),

    /// The run-state machine moved.
    StateChanged(Transition),

    /// A completed cycle was added to the persistent statistics.
    RunRecorded { elapsed_ms: u32, stats: RunStats },
}
