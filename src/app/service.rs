//! Application service: the hexagonal core.
//!
//! [`Controller`] owns the run-state machine, its shared context and every
//! port it drives. It exposes a clean, hardware-agnostic API: one call to
//! [`Controller::start`] at boot, then [`Controller::step`] once per loop
//! iteration.
//!
//! ```text
//!  InputPort ───▶ ┌───────────────────────────┐ ──▶ DrivePort
//!  SetpointAdc ─▶ │        Controller         │ ──▶ IndicatorPort
//!                 │  EStop · FSM · RunStats   │ ──▶ BackupRegisters
//!                 └───────────────────────────┘ ──▶ EventSink
//! ```

use log::{error, info, warn};

use crate::config::{BootState, SystemConfig};
use crate::drivers::setpoint::SetpointCalibrator;
use crate::error::Result;
use crate::fsm::context::{FsmContext, Outputs};
use crate::fsm::{Fsm, RunState, Transition};
use crate::stats::{RunStats, RunStatsStore};
use crate::timers::CountdownTimers;

use super::events::AppEvent;
use super::ports::{BackupRegisters, DrivePort, EventSink, IndicatorPort, InputPort, SetpointAdc};

/// Firmware version shown in the banner.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Build timestamp shown in the banner.
pub const BUILD_STAMP: &str = env!("MULTIFILL_BUILD_STAMP");

/// Everything the controller drives, bundled for construction.
pub struct Ports<I, D, L, A, R> {
    pub inputs: I,
    pub drive: D,
    pub indicator: L,
    pub adc: A,
    pub backup: R,
}

// ───────────────────────────────────────────────────────────────
// Controller
// ───────────────────────────────────────────────────────────────

pub struct Controller<'t, I, D, L, A, R> {
    fsm: Fsm,
    ctx: FsmContext<'t>,
    inputs: I,
    drive: D,
    indicator: L,
    setpoint: SetpointCalibrator<A>,
    stats: RunStatsStore<R>,
    cycles: u64,
}

impl<'t, I, D, L, A, R> Controller<'t, I, D, L, A, R>
where
    I: InputPort,
    D: DrivePort,
    L: IndicatorPort,
    A: SetpointAdc,
    R: BackupRegisters,
{
    /// Construct the controller from configuration.
    ///
    /// Does **not** start the FSM; call [`start`](Self::start) next.
    pub fn new(config: SystemConfig, timers: &'t CountdownTimers, ports: Ports<I, D, L, A, R>) -> Self {
        let initial = match config.hardware.boot_state {
            BootState::Idle => RunState::Idle,
            BootState::EStop => RunState::EStop,
        };
        let setpoint = SetpointCalibrator::new(ports.adc, config.adc_timeout_ms);
        Self {
            fsm: Fsm::new(initial),
            ctx: FsmContext::new(config, timers),
            inputs: ports.inputs,
            drive: ports.drive,
            indicator: ports.indicator,
            setpoint,
            stats: RunStatsStore::new(ports.backup),
            cycles: 0,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Print the banner and enter the boot state with every drive off.
    pub fn start(&mut self, sink: &mut impl EventSink) {
        if cfg!(feature = "reset-stats") {
            if let Err(e) = self.stats.reset() {
                error!("stats reset failed: {}", e);
            }
        }

        sink.emit(&AppEvent::Banner {
            version: VERSION,
            build: BUILD_STAMP,
            stats: self.stats.load(),
        });

        self.ctx.inputs = self.inputs.sample();
        self.fsm.start(&mut self.ctx);
        self.apply_indicator_request();
        self.drive.apply(self.ctx.outputs);

        let state = self.fsm.current_state();
        sink.emit(&AppEvent::Started(state));
        info!("Controller started in {:?}", state);
    }

    // ── Per-iteration orchestration ───────────────────────────

    /// Run one control cycle: sample → emergency stop → FSM → indicator →
    /// statistics → outputs.
    ///
    /// `now_ms` is the loop's monotonic millisecond clock (wrapping). The
    /// outputs are applied even when the cycle returns an error.
    pub fn step(&mut self, now_ms: u32, sink: &mut impl EventSink) -> Result<Option<Transition>> {
        self.cycles += 1;
        self.ctx.now_ms = now_ms;

        // 1. Sample
        self.ctx.inputs = self.inputs.sample();

        // 2. Emergency stop preempts every state
        let mut forced = None;
        if self.ctx.inputs.emergency_stop_active && self.fsm.current_state() != RunState::EStop {
            warn!("Emergency stop in {:?}", self.fsm.current_state());
            forced = self.fsm.force_transition(RunState::EStop, &mut self.ctx);
        }
        if let Some(t) = forced {
            sink.emit(&AppEvent::StateChanged(t));
        }

        // 3. State rule
        let ticked = self.fsm.tick(&mut self.ctx, &mut self.setpoint);
        if let Ok(Some(t)) = ticked {
            sink.emit(&AppEvent::StateChanged(t));
        }

        // 4. Indicator request
        self.apply_indicator_request();

        // 5. Statistics
        let committed = self.commit_completed_run(sink);

        // 6. Blink + drives
        self.indicator.tick();
        self.drive.apply(self.ctx.outputs);

        let t = ticked?;
        committed?;
        Ok(t.or(forced))
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn state(&self) -> RunState {
        self.fsm.current_state()
    }

    pub fn outputs(&self) -> Outputs {
        self.ctx.outputs
    }

    /// Current persisted statistics.
    pub fn stats(&self) -> RunStats {
        self.stats.load()
    }

    pub fn config(&self) -> &SystemConfig {
        &self.ctx.config
    }

    /// Control cycles executed since start.
    pub fn cycle_count(&self) -> u64 {
        self.cycles
    }

    pub fn backup(&self) -> &R {
        self.stats.registers()
    }

    pub fn indicator(&self) -> &L {
        &self.indicator
    }

    pub fn drive(&self) -> &D {
        &self.drive
    }

    // ── Internal ──────────────────────────────────────────────

    fn apply_indicator_request(&mut self) {
        if let Some((mode, color)) = self.ctx.indicator.take() {
            self.indicator.set(mode, color);
        }
    }

    fn commit_completed_run(&mut self, sink: &mut impl EventSink) -> Result<()> {
        let Some(elapsed_ms) = self.ctx.completed_run_ms.take() else {
            return Ok(());
        };
        match self.stats.record_run(elapsed_ms) {
            Ok(stats) => {
                sink.emit(&AppEvent::RunRecorded { elapsed_ms, stats });
                Ok(())
            }
            Err(e) => {
                error!("run of {} ms not recorded: {}", elapsed_ms, e);
                Err(e.into())
            }
        }
    }
}
