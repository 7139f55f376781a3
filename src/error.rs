//! Unified error type for the multiFill controller.
//!
//! A single `Error` enum that every subsystem converts into, keeping the
//! control loop's error handling uniform. All variants are `Copy` so they
//! can be returned from the hot path without allocation.
//!
//! Emergency stop is deliberately absent: it is a state, not an error, and
//! the run-state machine handles it every cycle.

use core::fmt;

use crate::app::ports::{AdcError, ConfigError, StorageError};

/// Every fallible control-cycle operation funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The setpoint conversion failed; the pending start did not commit.
    Adc(AdcError),
    /// Backup-register access failed while committing run statistics.
    Storage(StorageError),
    /// Configuration is invalid.
    Config(ConfigError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Adc(e) => write!(f, "setpoint: {e}"),
            Self::Storage(e) => write!(f, "run statistics: {e}"),
            Self::Config(e) => write!(f, "config: {e}"),
        }
    }
}

impl core::error::Error for Error {}

impl From<AdcError> for Error {
    fn from(e: AdcError) -> Self {
        Self::Adc(e)
    }
}

impl From<StorageError> for Error {
    fn from(e: StorageError) -> Self {
        Self::Storage(e)
    }
}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

/// Controller-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
