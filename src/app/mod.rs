//! Application core: pure domain logic, zero I/O.
//!
//! The fill-cycle rules live here: run-state orchestration, statistics
//! commit and console events. All interaction with hardware happens
//! through **port traits** defined in [`ports`], keeping this layer fully
//! testable without real peripherals.

pub mod events;
pub mod ports;
pub mod service;
