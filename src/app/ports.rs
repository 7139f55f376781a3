//! Port traits: the boundary between the control core and the board.
//!
//! ```text
//!   Adapter / driver ──▶ Port trait ──▶ Controller (domain)
//! ```
//!
//! The three digital inputs, two drive outputs and two LEDs are plain
//! `embedded_hal::digital` pins consumed by the drivers in
//! [`crate::drivers`]. The drivers in turn implement the narrow ports below,
//! which is all the [`Controller`](super::service::Controller) ever sees.
//! Mock adapters implement the same traits for host tests.

use crate::drivers::status_led::{LedColor, LedMode};
use crate::fsm::context::{Inputs, Outputs};

// ───────────────────────────────────────────────────────────────
// Control-line ports (drivers → domain)
// ───────────────────────────────────────────────────────────────

/// Read side: one logical snapshot of the operator controls.
pub trait InputPort {
    /// Read every line once and apply the deployment's polarity table.
    fn sample(&mut self) -> Inputs;
}

/// Write side: the pump H-bridge.
pub trait DrivePort {
    fn apply(&mut self, outputs: Outputs);
}

/// Two-colour status indicator.
pub trait IndicatorPort {
    /// Switch mode. Off and On cancel any blinking in progress.
    fn set(&mut self, mode: LedMode, color: LedColor);

    /// Advance blinking. Called once per control-loop iteration.
    fn tick(&mut self);
}

// ───────────────────────────────────────────────────────────────
// Analog setpoint
// ───────────────────────────────────────────────────────────────

/// Single-channel converter behind the fill-time knob.
pub trait SetpointAdc {
    /// Start one conversion and wait for it, at most `timeout_ms`.
    /// Returns the raw 12-bit sample.
    fn read_blocking(&mut self, timeout_ms: u32) -> Result<u16, AdcError>;
}

// ───────────────────────────────────────────────────────────────
// Backup registers (battery-backed, survive power loss)
// ───────────────────────────────────────────────────────────────

/// Fixed slot identifiers in the backup domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum BackupSlot {
    /// Cumulative run milliseconds.
    RuntimeMs = 0,
    /// Cumulative completed cycles.
    RunCount = 1,
}

impl BackupSlot {
    pub const COUNT: usize = 2;

    pub const fn index(self) -> usize {
        self as usize
    }
}

/// Power-loss-surviving 32-bit register file with an explicit write
/// protection bracket.
///
/// Writes are only accepted between [`enable_write_access`] and
/// [`disable_write_access`]. Atomicity is whatever the hardware gives per
/// register; no multi-register transaction is assumed.
///
/// [`enable_write_access`]: BackupRegisters::enable_write_access
/// [`disable_write_access`]: BackupRegisters::disable_write_access
pub trait BackupRegisters {
    fn read(&self, slot: BackupSlot) -> u32;

    fn write(&mut self, slot: BackupSlot, value: u32) -> Result<(), StorageError>;

    fn enable_write_access(&mut self);

    fn disable_write_access(&mut self);
}

// ───────────────────────────────────────────────────────────────
// Event sink (domain → console / log)
// ───────────────────────────────────────────────────────────────

/// The controller emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port. Best-effort and non-authoritative.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from [`SetpointAdc`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdcError {
    /// End-of-conversion never arrived within the timeout.
    Timeout,
}

/// Errors from [`BackupRegisters`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageError {
    /// Write attempted outside the unlock bracket.
    WriteProtected,
    /// The backup domain rejected the write.
    IoError,
}

/// Configuration validation errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// Serialized config could not be parsed.
    Corrupted,
    /// A field failed range validation.
    /// The `&'static str` describes which field and why.
    ValidationFailed(&'static str),
}

impl core::fmt::Display for AdcError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Timeout => write!(f, "conversion timed out"),
        }
    }
}

impl core::fmt::Display for StorageError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::WriteProtected => write!(f, "write access not enabled"),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Corrupted => write!(f, "config corrupted"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
        }
    }
}
