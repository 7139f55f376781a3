//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing the console lines through `log`
//! (the serial console on the board, stderr in the simulator).

use log::{debug, info};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`] to the console.
#[derive(Debug, Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Banner {
                version,
                build,
                stats,
            } => {
                info!("Maston multiFill controller v {} build {}", version, build);
                info!("Total runtime {}", stats);
            }
            AppEvent::Started(state) => {
                info!("START | initial_state={:?}", state);
            }
            AppEvent::StateChanged(t) => {
                info!("{}", t);
            }
            AppEvent::RunRecorded { elapsed_ms, stats } => {
                debug!("run recorded: {} ms", elapsed_ms);
                info!("Total runtime {}", stats);
            }
        }
    }
}
