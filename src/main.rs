//! multiFill host simulator.
//!
//! Runs the real control core against the in-memory board: a 1 ms tick
//! thread drives the countdown timers and a line-oriented console stands
//! in for the operator's foot switch, flush selector, emergency stop and
//! fill-time knob.
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │  stdin ──▶ console thread ──mpsc──▶ main loop                 │
//! │                                      │  SimPin levels         │
//! │                                      ▼                        │
//! │  TickSource (1 ms) ──▶ CountdownTimers ◀── Controller::step   │
//! │                                      │                        │
//! │           LogEventSink ◀─────────────┘──▶ SimBackupRegisters  │
//! │                                              (postcard file)  │
//! └───────────────────────────────────────────────────────────────┘
//! ```
//!
//! Commands: `s` toggle start, `f` toggle flush-select, `e` toggle
//! emergency stop, `k <raw>` set the knob (0–4095, `k none` for a dead
//! converter), `?` status, `q` quit.
#![deny(unused_must_use)]

use std::io::{self, BufRead};
use std::path::PathBuf;
use std::sync::{Arc, mpsc};
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use log::{info, warn};

use multifill::adapters::log_sink::LogEventSink;
use multifill::adapters::sim::{SimAdc, SimBackupRegisters, SimPin};
use multifill::adapters::time::MonotonicClock;
use multifill::app::service::{Controller, Ports};
use multifill::config::{HardwareProfile, Polarity, SystemConfig};
use multifill::drivers::hw_timer::TickSource;
use multifill::drivers::inputs::InputSampler;
use multifill::drivers::pump::PumpDriver;
use multifill::drivers::status_led::StatusLed;
use multifill::error::Error;
use multifill::timers::CountdownTimers;

// ── CLI ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Profile {
    RevA,
    RevB,
}

#[derive(Debug, Parser)]
#[command(name = "multifill-sim", version, about = "multiFill controller host simulator")]
struct Cli {
    /// Board revision preset.
    #[arg(long, value_enum, default_value_t = Profile::RevA)]
    profile: Profile,

    /// JSON config file; replaces the profile preset entirely.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Backup-register file.
    #[arg(long, default_value = "multifill-backup.bin")]
    backup: PathBuf,

    /// Initial knob position (raw 12-bit).
    #[arg(long, default_value_t = 2048)]
    knob: u16,

    /// Control loop period (ms).
    #[arg(long, default_value_t = 1)]
    loop_ms: u64,
}

// ── Console ───────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    ToggleStart,
    ToggleFlush,
    ToggleEstop,
    Knob(Option<u16>),
    Status,
    Quit,
}

fn parse_command(line: &str) -> Option<Command> {
    let mut words = line.split_whitespace();
    let cmd = match words.next()? {
        "s" => Command::ToggleStart,
        "f" => Command::ToggleFlush,
        "e" => Command::ToggleEstop,
        "?" => Command::Status,
        "q" => Command::Quit,
        "k" => match words.next()? {
            "none" => Command::Knob(None),
            raw => Command::Knob(Some(raw.parse().ok()?)),
        },
        _ => return None,
    };
    Some(cmd)
}

fn console(tx: mpsc::Sender<Command>) {
    for line in io::stdin().lock().lines() {
        let Ok(line) = line else { break };
        match parse_command(&line) {
            Some(cmd) => {
                if tx.send(cmd).is_err() {
                    return;
                }
            }
            None if line.trim().is_empty() => {}
            None => warn!("unknown command: {:?}", line.trim()),
        }
    }
    // End of input quits; the receiver may already be gone.
    if tx.send(Command::Quit).is_err() {
        info!("console closed after shutdown");
    }
}

/// Drive a simulated line so it reads as `asserted` through `polarity`.
fn drive_line(pin: &SimPin, polarity: Polarity, asserted: bool) {
    pin.set_level(match polarity {
        Polarity::ActiveHigh => asserted,
        Polarity::ActiveLow => !asserted,
    });
}

fn load_config(cli: &Cli) -> Result<SystemConfig> {
    let Some(path) = &cli.config else {
        return Ok(SystemConfig::with_hardware(match cli.profile {
            Profile::RevA => HardwareProfile::rev_a(),
            Profile::RevB => HardwareProfile::rev_b(),
        }));
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    let cfg = SystemConfig::from_json(&text)
        .map_err(Error::from)
        .with_context(|| format!("parsing {}", path.display()))?;
    info!("Config loaded from {}", path.display());
    Ok(cfg)
}

// ── Main ──────────────────────────────────────────────────────

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();
    let config = load_config(&cli)?;
    let polarity = config.hardware.polarity;

    // ── Simulated board ───────────────────────────────────────
    let start = SimPin::new(false);
    let flush = SimPin::new(false);
    let estop = SimPin::new(false);
    let (mut start_on, mut flush_on, mut estop_on) = (false, false, false);
    drive_line(&start, polarity.start, start_on);
    drive_line(&flush, polarity.flush, flush_on);
    drive_line(&estop, polarity.estop, estop_on);

    let (fwd, rev) = (SimPin::new(true), SimPin::new(true));
    let (red, blue) = (SimPin::new(false), SimPin::new(false));
    let adc = SimAdc::new(Some(cli.knob));
    let backup = SimBackupRegisters::load(&cli.backup)
        .with_context(|| format!("loading {}", cli.backup.display()))?;

    // ── Tick source ───────────────────────────────────────────
    let timers = Arc::new(CountdownTimers::new());
    let mut tick = TickSource::start(Arc::clone(&timers)).context("starting tick thread")?;

    // ── Controller ────────────────────────────────────────────
    let ports = Ports {
        inputs: InputSampler::new(start.clone(), flush.clone(), estop.clone(), polarity),
        drive: PumpDriver::new(fwd.clone(), rev.clone()),
        indicator: StatusLed::new(
            red.clone(),
            blue.clone(),
            &timers,
            config.blink_on_ms,
            config.blink_off_ms,
        ),
        adc: adc.clone(),
        backup,
    };
    let mut controller = Controller::new(config, &timers, ports);
    let mut sink = LogEventSink::new();
    let clock = MonotonicClock::new();

    controller.start(&mut sink);
    let mut saved = controller.stats();

    let (tx, rx) = mpsc::channel();
    thread::Builder::new()
        .name("console".into())
        .spawn(move || console(tx))
        .context("starting console thread")?;
    info!("console: s=start f=flush e=estop k <raw>=knob ?=status q=quit");

    // ── Main loop ─────────────────────────────────────────────
    'run: loop {
        while let Ok(cmd) = rx.try_recv() {
            match cmd {
                Command::ToggleStart => {
                    start_on = !start_on;
                    drive_line(&start, polarity.start, start_on);
                    info!("start {}", if start_on { "pressed" } else { "released" });
                }
                Command::ToggleFlush => {
                    flush_on = !flush_on;
                    drive_line(&flush, polarity.flush, flush_on);
                    info!("flush-select {}", if flush_on { "on" } else { "off" });
                }
                Command::ToggleEstop => {
                    estop_on = !estop_on;
                    drive_line(&estop, polarity.estop, estop_on);
                    info!("emergency stop {}", if estop_on { "engaged" } else { "released" });
                }
                Command::Knob(raw) => {
                    adc.set_raw(raw);
                    info!("knob {:?}", raw);
                }
                Command::Status => {
                    info!(
                        "state={:?} fwd={} rev={} red={} blue={} stats: {}",
                        controller.state(),
                        !fwd.level(),
                        !rev.level(),
                        red.level(),
                        blue.level(),
                        controller.stats(),
                    );
                }
                Command::Quit => break 'run,
            }
        }

        if let Err(e) = controller.step(clock.uptime_ms(), &mut sink) {
            warn!("cycle: {}", e);
        }

        let stats = controller.stats();
        if stats != saved {
            controller
                .backup()
                .save(&cli.backup)
                .with_context(|| format!("saving {}", cli.backup.display()))?;
            saved = stats;
        }

        thread::sleep(Duration::from_millis(cli.loop_ms));
    }

    tick.stop();
    controller
        .backup()
        .save(&cli.backup)
        .with_context(|| format!("saving {}", cli.backup.display()))?;
    info!("Shutdown after {} cycles", controller.cycle_count());
    Ok(())
}
