//! Simulated board and recording sink for integration tests.
//!
//! Builds a real [`Controller`] on [`SimPin`]s so tests can drive the
//! operator lines by logical meaning and assert on the electrical outputs
//! (pump pins are active-low, LED pins active-high).

use multifill::adapters::sim::{SimAdc, SimBackupRegisters, SimPin};
use multifill::app::events::AppEvent;
use multifill::app::ports::EventSink;
use multifill::app::service::{Controller, Ports};
use multifill::config::{InputPolarity, Polarity, SystemConfig};
use multifill::drivers::inputs::InputSampler;
use multifill::drivers::pump::PumpDriver;
use multifill::drivers::status_led::StatusLed;
use multifill::error::Result;
use multifill::fsm::Transition;
use multifill::stats::RunStats;
use multifill::timers::CountdownTimers;

pub type SimController<'t> = Controller<
    't,
    InputSampler<SimPin, SimPin, SimPin>,
    PumpDriver<SimPin, SimPin>,
    StatusLed<'t, SimPin, SimPin>,
    SimAdc,
    SimBackupRegisters,
>;

// ── Recording sink ────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct RecordingSink {
    pub events: Vec<AppEvent>,
}

#[allow(dead_code)]
impl RecordingSink {
    /// Console tokens of every transition, in order.
    pub fn tokens(&self) -> Vec<String> {
        self.events
            .iter()
            .filter_map(|e| match e {
                AppEvent::StateChanged(t) => Some(t.to_string()),
                _ => None,
            })
            .collect()
    }

    pub fn recorded(&self) -> Vec<(u32, RunStats)> {
        self.events
            .iter()
            .filter_map(|e| match e {
                AppEvent::RunRecorded { elapsed_ms, stats } => Some((*elapsed_ms, *stats)),
                _ => None,
            })
            .collect()
    }

    pub fn banner_stats(&self) -> Option<RunStats> {
        self.events.iter().find_map(|e| match e {
            AppEvent::Banner { stats, .. } => Some(*stats),
            _ => None,
        })
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(*event);
    }
}

// ── Board handles ─────────────────────────────────────────────

pub struct Board {
    start: SimPin,
    flush: SimPin,
    estop: SimPin,
    fwd: SimPin,
    rev: SimPin,
    red: SimPin,
    blue: SimPin,
    pub adc: SimAdc,
    polarity: InputPolarity,
}

fn level_for(polarity: Polarity, asserted: bool) -> bool {
    match polarity {
        Polarity::ActiveHigh => asserted,
        Polarity::ActiveLow => !asserted,
    }
}

#[allow(dead_code)]
impl Board {
    pub fn set_start(&self, on: bool) {
        self.start.set_level(level_for(self.polarity.start, on));
    }

    pub fn set_flush(&self, on: bool) {
        self.flush.set_level(level_for(self.polarity.flush, on));
    }

    pub fn set_estop(&self, on: bool) {
        self.estop.set_level(level_for(self.polarity.estop, on));
    }

    pub fn forward_on(&self) -> bool {
        !self.fwd.level()
    }

    pub fn reverse_on(&self) -> bool {
        !self.rev.level()
    }

    pub fn red_on(&self) -> bool {
        self.red.level()
    }

    pub fn blue_on(&self) -> bool {
        self.blue.level()
    }
}

// ── Harness ───────────────────────────────────────────────────

pub struct Sim<'t> {
    pub ctl: SimController<'t>,
    pub board: Board,
    pub sink: RecordingSink,
    timers: &'t CountdownTimers,
    now_ms: u32,
}

#[allow(dead_code)]
impl<'t> Sim<'t> {
    /// Build and start a controller; operator lines released, emergency
    /// stop clear, knob at `knob`.
    pub fn boot(
        timers: &'t CountdownTimers,
        config: SystemConfig,
        knob: Option<u16>,
        backup: SimBackupRegisters,
    ) -> Self {
        let polarity = config.hardware.polarity;
        let board = Board {
            start: SimPin::new(level_for(polarity.start, false)),
            flush: SimPin::new(level_for(polarity.flush, false)),
            estop: SimPin::new(level_for(polarity.estop, false)),
            fwd: SimPin::new(true),
            rev: SimPin::new(true),
            red: SimPin::new(false),
            blue: SimPin::new(false),
            adc: SimAdc::new(knob),
            polarity,
        };
        let ports = Ports {
            inputs: InputSampler::new(
                board.start.clone(),
                board.flush.clone(),
                board.estop.clone(),
                polarity,
            ),
            drive: PumpDriver::new(board.fwd.clone(), board.rev.clone()),
            indicator: StatusLed::new(
                board.red.clone(),
                board.blue.clone(),
                timers,
                config.blink_on_ms,
                config.blink_off_ms,
            ),
            adc: board.adc.clone(),
            backup,
        };
        let mut ctl = Controller::new(config, timers, ports);
        let mut sink = RecordingSink::default();
        ctl.start(&mut sink);
        Self {
            ctl,
            board,
            sink,
            timers,
            now_ms: 0,
        }
    }

    /// One millisecond passes, then one control cycle.
    pub fn step(&mut self) -> Result<Option<Transition>> {
        self.timers.tick();
        self.now_ms = self.now_ms.wrapping_add(1);
        self.ctl.step(self.now_ms, &mut self.sink)
    }

    /// `ms` milliseconds of cycles; returns the tokens seen.
    pub fn run_ms(&mut self, ms: u32) -> Vec<String> {
        let mut seen = Vec::new();
        for _ in 0..ms {
            if let Some(t) = self.step().expect("control cycle failed") {
                seen.push(t.to_string());
            }
        }
        seen
    }
}
