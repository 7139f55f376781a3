//! Peripheral drivers: operator inputs, pump bridge, status LEDs, the
//! setpoint knob and the countdown tick source.

pub mod hw_timer;
pub mod inputs;
pub mod pump;
pub mod setpoint;
pub mod status_led;
