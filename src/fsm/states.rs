//! Concrete state handler functions.
//!
//! ```text
//!  IDLE ──[start ∧ ¬flush]──▶ RUNNING ──[Run == 0]──▶ RETRACTING
//!   │ ▲                                                   │
//!   │ └──────────────────[Run == 0, record]───────────────┘
//!   │ ▲
//!   │ └──[start again ∨ Run == 0, release, record]──┐
//!   └──[start ∧ flush]──▶ FLUSHING ─────────────────┘
//!
//!  Any state ──[emergency stop]──▶ ESTOP ──[cleared]──▶ IDLE
//! ```
//!
//! Start-press debouncing lives in [`Hold`]: a run or flush only reacts
//! to the start line again after it has been released and the settle
//! window has passed.

use log::{info, warn};

use super::RunState;
use super::context::{FsmContext, Hold, Outputs};
use crate::app::ports::SetpointAdc;
use crate::drivers::setpoint::SetpointCalibrator;
use crate::drivers::status_led::{LedColor, LedMode};
use crate::error::Result;
use crate::timers::Channel;

// ═══════════════════════════════════════════════════════════════════════════
//  Dispatch
// ═══════════════════════════════════════════════════════════════════════════

pub(super) fn enter(state: RunState, ctx: &mut FsmContext) {
    match state {
        RunState::Idle => idle_enter(ctx),
        RunState::Running => running_enter(ctx),
        RunState::Retracting => retracting_enter(ctx),
        RunState::Flushing => flushing_enter(ctx),
        RunState::EStop => estop_enter(ctx),
    }
}

pub(super) fn exit(state: RunState, ctx: &mut FsmContext) {
    match state {
        RunState::Running => running_exit(ctx),
        RunState::EStop => estop_exit(ctx),
        RunState::Idle | RunState::Retracting | RunState::Flushing => {}
    }
}

pub(super) fn update<A: SetpointAdc>(
    state: RunState,
    ctx: &mut FsmContext,
    setpoint: &mut SetpointCalibrator<A>,
) -> Result<Option<RunState>> {
    Ok(match state {
        RunState::Idle => idle_update(ctx, setpoint)?,
        RunState::Running => running_update(ctx),
        RunState::Retracting => retracting_update(ctx),
        RunState::Flushing => flushing_update(ctx),
        RunState::EStop => estop_update(ctx),
    })
}

// ═══════════════════════════════════════════════════════════════════════════
//  IDLE state
// ═══════════════════════════════════════════════════════════════════════════

fn idle_enter(ctx: &mut FsmContext) {
    ctx.outputs = Outputs::all_off();
    // A start still held on arrival must be released before it counts.
    if ctx.inputs.start_requested {
        ctx.hold = Hold::AwaitingRelease;
    }
}

fn idle_update<A: SetpointAdc>(
    ctx: &mut FsmContext,
    setpoint: &mut SetpointCalibrator<A>,
) -> Result<Option<RunState>> {
    if ctx.inputs.emergency_stop_active {
        return Ok(Some(RunState::EStop));
    }
    if !ctx.update_hold() || !ctx.inputs.start_requested {
        return Ok(None);
    }

    if ctx.inputs.flush_requested {
        return Ok(Some(RunState::Flushing));
    }

    // Nothing is committed until the conversion succeeds.
    ctx.run_setpoint_ms = setpoint.read_scaled_duration(ctx.config.max_run_time_ms)?;
    Ok(Some(RunState::Running))
}

// ═══════════════════════════════════════════════════════════════════════════
//  RUNNING state: metered forward drive
// ═══════════════════════════════════════════════════════════════════════════

fn running_enter(ctx: &mut FsmContext) {
    ctx.begin_phase();
    ctx.outputs = Outputs::forward();
    ctx.request_indicator(LedMode::Blink, ctx.config.hardware.colors.run);
    ctx.timers.set_delay(Channel::Run, ctx.run_setpoint_ms);
}

fn running_update(ctx: &mut FsmContext) -> Option<RunState> {
    if ctx.inputs.emergency_stop_active {
        return Some(RunState::EStop);
    }

    let live = ctx.update_hold();
    if !ctx.run_expired() {
        return None;
    }
    if live {
        return Some(RunState::Retracting);
    }

    // Time is up but the press that started the run has not settled.
    if ctx.outputs.drive_forward {
        warn!("RUNNING: run ended before start was released, forcing drive off");
        ctx.outputs.drive_forward = false;
    }
    None
}

fn running_exit(ctx: &mut FsmContext) {
    ctx.run_elapsed_ms = ctx.phase_elapsed_ms();
}

// ═══════════════════════════════════════════════════════════════════════════
//  RETRACTING state: short reverse to pull the drip back
// ═══════════════════════════════════════════════════════════════════════════

fn retracting_enter(ctx: &mut FsmContext) {
    ctx.outputs = Outputs::reverse();
    ctx.request_indicator(LedMode::Off, LedColor::Both);
    ctx.timers.set_delay(Channel::Run, ctx.config.retract_time_ms);
}

fn retracting_update(ctx: &mut FsmContext) -> Option<RunState> {
    if ctx.inputs.emergency_stop_active {
        return Some(RunState::EStop);
    }
    if !ctx.run_expired() {
        return None;
    }

    ctx.outputs = Outputs::all_off();
    ctx.request_indicator(LedMode::Off, LedColor::Both);
    ctx.completed_run_ms = Some(ctx.run_elapsed_ms);
    Some(RunState::Idle)
}

// ═══════════════════════════════════════════════════════════════════════════
//  FLUSHING state: unmetered forward drive until stopped
// ═══════════════════════════════════════════════════════════════════════════

fn flushing_enter(ctx: &mut FsmContext) {
    ctx.begin_phase();
    ctx.outputs = Outputs::forward();
    ctx.request_indicator(LedMode::On, ctx.config.hardware.colors.flush);
    ctx.timers.set_delay(Channel::Run, ctx.config.max_flush_time_ms);
    info!(
        "FLUSHING: up to {} ms, press start again to stop",
        ctx.config.max_flush_time_ms
    );
}

fn flushing_update(ctx: &mut FsmContext) -> Option<RunState> {
    if ctx.inputs.emergency_stop_active {
        return Some(RunState::EStop);
    }

    if ctx.hold != Hold::Draining {
        let live = ctx.update_hold();
        if ctx.run_expired() || (live && ctx.inputs.start_requested) {
            ctx.outputs.drive_forward = false;
            ctx.request_indicator(LedMode::Off, LedColor::Both);
            ctx.hold = Hold::Draining;
        }
    }

    if ctx.hold == Hold::Draining && !ctx.inputs.start_requested {
        ctx.completed_run_ms = Some(ctx.phase_elapsed_ms());
        ctx.hold = Hold::Settling {
            since_ms: ctx.now_ms,
        };
        return Some(RunState::Idle);
    }
    None
}

// ═══════════════════════════════════════════════════════════════════════════
//  ESTOP state: all drives off until the stop is cleared
// ═══════════════════════════════════════════════════════════════════════════

fn estop_enter(ctx: &mut FsmContext) {
    ctx.outputs = Outputs::all_off();
    ctx.timers.cancel(Channel::Run);
    ctx.hold = Hold::Clear;

    let hw = ctx.config.hardware;
    if hw.estop_indicator_lit {
        ctx.request_indicator(LedMode::On, hw.colors.fault);
    } else {
        ctx.request_indicator(LedMode::Off, LedColor::Both);
    }
    warn!("ESTOP: all drives disabled");
}

fn estop_exit(ctx: &mut FsmContext) {
    let hw = ctx.config.hardware;
    if hw.recovery_indicator_lit {
        ctx.request_indicator(LedMode::On, hw.colors.idle);
    } else {
        ctx.request_indicator(LedMode::Off, LedColor::Both);
    }
    info!("ESTOP: cleared, resuming normal operation");
}

fn estop_update(ctx: &mut FsmContext) -> Option<RunState> {
    (!ctx.inputs.emergency_stop_active).then_some(RunState::Idle)
}
