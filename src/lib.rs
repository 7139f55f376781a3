//! multiFill controller library.
//!
//! The control core of a single-station filling actuator: run-state
//! machine, countdown timers, status indicator, setpoint calibration and
//! persistent run statistics. Board-specific code plugs in through the
//! port traits in [`app::ports`] and `embedded_hal` pins; the host
//! simulator and the tests use the in-memory board in [`adapters::sim`].

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod config;
pub mod drivers;
pub mod error;
pub mod fsm;
pub mod stats;
pub mod timers;
