//! Integration tests for the Controller → FSM → drivers pipeline.
//!
//! These run on the host and drive the full control cycle through
//! simulated pins, knob and backup registers.

use crate::mock_hw::Sim;

use multifill::adapters::sim::SimBackupRegisters;
use multifill::app::ports::{AdcError, BackupRegisters, StorageError};
use multifill::config::{HardwareProfile, SystemConfig};
use multifill::error::Error;
use multifill::fsm::RunState;
use multifill::timers::CountdownTimers;

fn rev_a(max_run_time_ms: u32) -> SystemConfig {
    SystemConfig {
        max_run_time_ms,
        ..SystemConfig::default()
    }
}

/// Boot rev A (which starts in EStop) and let it fall through to Idle.
fn idle_sim(timers: &CountdownTimers, config: SystemConfig, knob: Option<u16>) -> Sim<'_> {
    let mut sim = Sim::boot(timers, config, knob, SimBackupRegisters::new());
    assert_eq!(sim.run_ms(1), vec!["E>I"]);
    sim
}

// ── Boot ──────────────────────────────────────────────────────

#[test]
fn rev_a_boots_into_estop_with_fault_light() {
    let timers = CountdownTimers::new();
    let mut sim = Sim::boot(&timers, rev_a(15_000), Some(0), SimBackupRegisters::new());

    assert_eq!(sim.ctl.state(), RunState::EStop);
    assert!(sim.board.red_on());
    assert!(!sim.board.blue_on());
    assert!(!sim.board.forward_on() && !sim.board.reverse_on());

    assert_eq!(sim.run_ms(1), vec!["E>I"]);
    assert!(!sim.board.red_on(), "rev A recovers dark");
}

#[test]
fn rev_b_boots_into_idle_dark() {
    let timers = CountdownTimers::new();
    let cfg = SystemConfig::with_hardware(HardwareProfile::rev_b());
    let mut sim = Sim::boot(&timers, cfg, Some(0), SimBackupRegisters::new());

    assert_eq!(sim.ctl.state(), RunState::Idle);
    assert!(!sim.board.red_on() && !sim.board.blue_on());
    assert!(sim.run_ms(50).is_empty());
}

#[test]
fn banner_carries_persisted_stats() {
    let timers = CountdownTimers::new();
    let mut regs = SimBackupRegisters::new();
    regs.preset(multifill::app::ports::BackupSlot::RuntimeMs, 3_723_000);
    regs.preset(multifill::app::ports::BackupSlot::RunCount, 12);
    let sim = Sim::boot(&timers, rev_a(15_000), Some(0), regs);

    let stats = sim.sink.banner_stats().unwrap();
    assert_eq!(stats.to_string(), "1:02:03, 12 runs");
}

// ── Metered run ───────────────────────────────────────────────

#[test]
fn half_knob_runs_half_max_then_retracts() {
    let timers = CountdownTimers::new();
    let mut sim = idle_sim(&timers, rev_a(30_000), Some(2048));

    sim.board.set_start(true);
    assert_eq!(sim.run_ms(1), vec!["I>R"]);
    assert!(sim.board.forward_on());
    assert!(!sim.board.reverse_on());
    assert_eq!(sim.board.adc.conversions(), 1);

    sim.run_ms(10);
    sim.board.set_start(false);
    assert!(sim.run_ms(14_989).is_empty());
    assert_eq!(sim.run_ms(1), vec!["R>V"]);
    assert!(!sim.board.forward_on());
    assert!(sim.board.reverse_on());
    assert!(!sim.board.blue_on(), "indicator off while retracting");

    assert!(sim.run_ms(1_499).is_empty());
    assert_eq!(sim.run_ms(1), vec!["V>I"]);
    assert!(!sim.board.forward_on() && !sim.board.reverse_on());

    let recorded = sim.sink.recorded();
    assert_eq!(recorded.len(), 1, "exactly one record per cycle");
    assert_eq!(recorded[0].0, 15_000, "retract time is not counted");
    assert_eq!(recorded[0].1.run_count, 1);
    assert_eq!(sim.ctl.stats().total_runtime_ms, 15_000);
    assert!(sim.ctl.backup().is_write_protected());
}

#[test]
fn held_start_counts_whole_running_phase() {
    let timers = CountdownTimers::new();
    let mut sim = idle_sim(&timers, rev_a(4_096), Some(1_000));

    sim.board.set_start(true);
    assert_eq!(sim.run_ms(1), vec!["I>R"]);
    assert!(sim.run_ms(2_999).is_empty());
    assert!(!sim.board.forward_on(), "drive cut at the setpoint");
    assert_eq!(sim.ctl.state(), RunState::Running);

    sim.board.set_start(false);
    assert!(sim.run_ms(50).is_empty(), "settle window after release");
    assert_eq!(sim.run_ms(1), vec!["R>V"]);
    assert_eq!(sim.run_ms(1_500), vec!["V>I"]);

    let recorded = sim.sink.recorded();
    assert_eq!(recorded.len(), 1);
    assert_eq!(recorded[0].0, 3_050);
}

#[test]
fn run_indicator_blinks_200_on_150_off() {
    let timers = CountdownTimers::new();
    let mut sim = idle_sim(&timers, rev_a(30_000), Some(4095));

    sim.board.set_start(true);
    sim.run_ms(1);
    sim.board.set_start(false);
    assert!(sim.board.blue_on());

    sim.run_ms(199);
    assert!(sim.board.blue_on());
    sim.run_ms(1);
    assert!(!sim.board.blue_on());
    sim.run_ms(149);
    assert!(!sim.board.blue_on());
    sim.run_ms(1);
    assert!(sim.board.blue_on());
    assert!(!sim.board.red_on());
}

#[test]
fn adc_timeout_aborts_start() {
    let timers = CountdownTimers::new();
    let mut sim = idle_sim(&timers, rev_a(15_000), None);

    sim.board.set_start(true);
    assert_eq!(sim.step(), Err(Error::Adc(AdcError::Timeout)));
    assert_eq!(sim.ctl.state(), RunState::Idle);
    assert!(!sim.board.forward_on());

    sim.board.adc.set_raw(Some(1024));
    let t = sim.step().unwrap().unwrap();
    assert_eq!(t.to_string(), "I>R");
}

// ── Flush ─────────────────────────────────────────────────────

#[test]
fn flush_runs_until_second_press() {
    let timers = CountdownTimers::new();
    let mut sim = idle_sim(&timers, rev_a(15_000), Some(2048));

    sim.board.set_flush(true);
    sim.board.set_start(true);
    assert_eq!(sim.run_ms(1), vec!["I>F"]);
    assert_eq!(sim.board.adc.conversions(), 0, "flush never samples the knob");
    assert!(sim.board.forward_on());
    assert!(sim.board.blue_on());

    sim.run_ms(20);
    sim.board.set_start(false);
    assert!(sim.run_ms(2_000).is_empty());
    assert!(sim.board.forward_on());

    sim.board.set_start(true);
    assert!(sim.run_ms(1).is_empty());
    assert!(!sim.board.forward_on(), "pump stops on the press");
    assert!(!sim.board.blue_on());
    assert!(sim.run_ms(500).is_empty(), "completes on release");

    sim.board.set_start(false);
    assert_eq!(sim.run_ms(1), vec!["F>I"]);
    let recorded = sim.sink.recorded();
    assert_eq!(recorded.len(), 1);
    assert_eq!(recorded[0].0, 2_522, "counts from entry to release");
}

#[test]
fn flush_limit_with_start_held_waits_for_release() {
    let timers = CountdownTimers::new();
    let mut cfg = rev_a(15_000);
    cfg.max_flush_time_ms = 5_000;
    let mut sim = idle_sim(&timers, cfg, Some(0));

    sim.board.set_flush(true);
    sim.board.set_start(true);
    assert_eq!(sim.run_ms(1), vec!["I>F"]);
    assert!(sim.run_ms(4_999).is_empty());
    assert!(sim.board.forward_on());

    assert!(sim.run_ms(1).is_empty());
    assert!(!sim.board.forward_on(), "pump stops at the limit");
    assert!(!sim.board.reverse_on());

    assert!(sim.run_ms(1_000).is_empty(), "no completion while held");
    assert!(!sim.board.forward_on());
    assert!(sim.sink.recorded().is_empty());

    sim.board.set_start(false);
    assert_eq!(sim.run_ms(1), vec!["F>I"]);
    assert!(sim.run_ms(500).is_empty());

    let recorded = sim.sink.recorded();
    assert_eq!(recorded.len(), 1);
    assert_eq!(recorded[0].0, 6_001);
    assert_eq!(sim.ctl.stats().run_count, 1);
}

#[test]
fn flush_stops_itself_at_limit() {
    let timers = CountdownTimers::new();
    let mut cfg = rev_a(15_000);
    cfg.max_flush_time_ms = 5_000;
    let mut sim = idle_sim(&timers, cfg, Some(0));

    sim.board.set_flush(true);
    sim.board.set_start(true);
    sim.run_ms(1);
    sim.board.set_start(false);
    assert!(sim.run_ms(4_999).is_empty());
    assert_eq!(sim.run_ms(1), vec!["F>I"]);
    assert_eq!(sim.sink.recorded()[0].0, 5_000);
}

// ── Emergency stop ────────────────────────────────────────────

#[test]
fn estop_preempts_running_without_recording() {
    let timers = CountdownTimers::new();
    let mut sim = idle_sim(&timers, rev_a(30_000), Some(4095));

    sim.board.set_start(true);
    sim.run_ms(1);
    sim.board.set_start(false);
    sim.run_ms(500);

    sim.board.set_estop(true);
    assert_eq!(sim.run_ms(1), vec!["R>E"]);
    assert!(!sim.board.forward_on() && !sim.board.reverse_on());
    assert!(sim.board.red_on());
    assert!(sim.run_ms(1_000).is_empty());

    sim.board.set_estop(false);
    assert_eq!(sim.run_ms(1), vec!["E>I"]);
    assert!(sim.sink.recorded().is_empty());
    assert_eq!(sim.ctl.stats().run_count, 0);
}

#[test]
fn estop_preempts_retract_and_flush() {
    let timers = CountdownTimers::new();
    let mut sim = idle_sim(&timers, rev_a(15_000), Some(0));

    sim.board.set_start(true);
    sim.run_ms(1);
    sim.board.set_start(false);
    assert_eq!(sim.run_ms(60), vec!["R>V"]);
    sim.board.set_estop(true);
    assert_eq!(sim.run_ms(1), vec!["V>E"]);
    assert!(!sim.board.reverse_on());

    sim.board.set_estop(false);
    sim.run_ms(1);
    sim.board.set_flush(true);
    sim.board.set_start(true);
    assert_eq!(sim.run_ms(1), vec!["I>F"]);
    sim.board.set_estop(true);
    assert_eq!(sim.run_ms(1), vec!["F>E"]);
    assert!(!sim.board.forward_on());
    assert!(sim.sink.recorded().is_empty());
}

#[test]
fn rev_b_estop_is_dark_and_recovers_lit() {
    let timers = CountdownTimers::new();
    let cfg = SystemConfig::with_hardware(HardwareProfile::rev_b());
    let mut sim = Sim::boot(&timers, cfg, Some(0), SimBackupRegisters::new());

    sim.board.set_estop(true);
    assert_eq!(sim.run_ms(1), vec!["I>E"]);
    assert!(!sim.board.red_on() && !sim.board.blue_on());

    sim.board.set_estop(false);
    assert_eq!(sim.run_ms(1), vec!["E>I"]);
    assert!(sim.board.blue_on());
}

// ── Statistics ────────────────────────────────────────────────

#[test]
fn storage_failure_surfaces_after_safe_transition() {
    let timers = CountdownTimers::new();
    let mut regs = SimBackupRegisters::new();
    regs.set_fail_writes(true);
    let mut sim = Sim::boot(&timers, rev_a(15_000), Some(0), regs);
    sim.run_ms(1);

    sim.board.set_start(true);
    sim.run_ms(1);
    sim.board.set_start(false);
    sim.run_ms(60);
    assert_eq!(sim.ctl.state(), RunState::Retracting);

    let mut result = Ok(None);
    for _ in 0..1_500 {
        result = sim.step();
        if result.is_err() {
            break;
        }
    }
    assert_eq!(result, Err(Error::Storage(StorageError::IoError)));
    assert_eq!(sim.ctl.state(), RunState::Idle);
    assert!(!sim.board.forward_on() && !sim.board.reverse_on());
    assert!(sim.ctl.backup().is_write_protected());
}

#[test]
fn stats_survive_restart() {
    let timers = CountdownTimers::new();
    let mut sim = idle_sim(&timers, rev_a(4_096), Some(1_000));
    sim.board.set_start(true);
    sim.run_ms(1);
    sim.board.set_start(false);
    sim.run_ms(3_000);
    assert_eq!(sim.ctl.stats().run_count, 1);

    let regs = sim.ctl.backup().clone();
    assert_eq!(regs.read(multifill::app::ports::BackupSlot::RuntimeMs), 1_000);
    drop(sim);

    let timers = CountdownTimers::new();
    let sim = Sim::boot(&timers, rev_a(4_096), Some(1_000), regs);
    let stats = sim.sink.banner_stats().unwrap();
    assert_eq!(stats.run_count, 1);
    assert_eq!(stats.total_runtime_ms, 1_000);
}
