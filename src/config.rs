//! System configuration parameters
//!
//! Timing constants for the fill cycle plus the per-deployment
//! [`HardwareProfile`]. The two board revisions in the field differ in
//! input polarity, LED colour assignment, boot state and the indicator
//! policy around emergency stop; one [`SystemConfig`] describes either.

use serde::{Deserialize, Serialize};

use crate::app::ports::ConfigError;
use crate::drivers::status_led::LedColor;

/// Electrical sense of a digital input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Polarity {
    /// Logic high means asserted.
    ActiveHigh,
    /// Logic low means asserted (pulled-up switch to ground).
    ActiveLow,
}

impl Polarity {
    /// Map a raw pin level to the logical signal.
    pub const fn is_asserted(self, level_high: bool) -> bool {
        match self {
            Self::ActiveHigh => level_high,
            Self::ActiveLow => !level_high,
        }
    }
}

/// Polarity of each operator input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputPolarity {
    pub start: Polarity,
    pub flush: Polarity,
    pub estop: Polarity,
}

/// Which LED colour each situation uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorMap {
    /// Blinks while a metered run is pumping.
    pub run: LedColor,
    /// Solid while flushing.
    pub flush: LedColor,
    /// Solid while in emergency stop (if lit at all).
    pub fault: LedColor,
    /// Solid after emergency-stop recovery (if lit at all).
    pub idle: LedColor,
}

/// Run state entered at power-on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BootState {
    Idle,
    EStop,
}

/// Everything that differs between board revisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HardwareProfile {
    pub polarity: InputPolarity,
    pub colors: ColorMap,
    pub boot_state: BootState,
    /// Light `colors.fault` while in emergency stop; otherwise dark.
    pub estop_indicator_lit: bool,
    /// Light `colors.idle` when emergency stop clears; otherwise dark.
    pub recovery_indicator_lit: bool,
}

impl HardwareProfile {
    /// The behaviour of the observed production build: flush-select
    /// active-high, boots into EStop, red fault light, dark after recovery.
    pub const fn rev_a() -> Self {
        Self {
            polarity: InputPolarity {
                start: Polarity::ActiveLow,
                flush: Polarity::ActiveHigh,
                estop: Polarity::ActiveHigh,
            },
            colors: ColorMap {
                run: LedColor::Blue,
                flush: LedColor::Blue,
                fault: LedColor::Red,
                idle: LedColor::Blue,
            },
            boot_state: BootState::EStop,
            estop_indicator_lit: true,
            recovery_indicator_lit: false,
        }
    }

    /// The alternate revision: flush-select active-low, boots into Idle,
    /// dark during emergency stop, lit idle colour after recovery.
    ///
    /// The two revisions disagree and neither is known to be the intended
    /// behaviour; see DESIGN.md before shipping either.
    pub const fn rev_b() -> Self {
        Self {
            polarity: InputPolarity {
                start: Polarity::ActiveLow,
                flush: Polarity::ActiveLow,
                estop: Polarity::ActiveHigh,
            },
            colors: ColorMap {
                run: LedColor::Red,
                flush: LedColor::Blue,
                fault: LedColor::Red,
                idle: LedColor::Blue,
            },
            boot_state: BootState::Idle,
            estop_indicator_lit: false,
            recovery_indicator_lit: true,
        }
    }
}

impl Default for HardwareProfile {
    fn default() -> Self {
        Self::rev_a()
    }
}

/// Core system configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemConfig {
    // --- Fill cycle ---
    /// Run time at full-scale knob (ms)
    pub max_run_time_ms: u32,
    /// Flush cut-off if the operator never stops it (ms)
    pub max_flush_time_ms: u32,
    /// Reverse drive after a run to pull the drip back into the nozzle (ms)
    pub retract_time_ms: u32,

    // --- Indicator ---
    pub blink_on_ms: u32,
    pub blink_off_ms: u32,

    // --- Controls ---
    /// Start line is ignored this long after release
    pub release_settle_ms: u32,

    // --- Setpoint ---
    /// Bound on a single conversion (ms)
    pub adc_timeout_ms: u32,

    pub hardware: HardwareProfile,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            max_run_time_ms: 15_000,
            max_flush_time_ms: 60_000,
            retract_time_ms: 1_500,

            blink_on_ms: 200,
            blink_off_ms: 150,

            release_settle_ms: 50,

            adc_timeout_ms: 10,

            hardware: HardwareProfile::rev_a(),
        }
    }
}

impl SystemConfig {
    /// Defaults with a different board revision.
    pub fn with_hardware(hardware: HardwareProfile) -> Self {
        Self {
            hardware,
            ..Self::default()
        }
    }

    /// Parse a JSON config and validate it.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let cfg: Self = serde_json::from_str(text).map_err(|_| ConfigError::Corrupted)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Range-check every field. Out-of-range values are rejected, never
    /// clamped.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(100..=600_000).contains(&self.max_run_time_ms) {
            return Err(ConfigError::ValidationFailed(
                "max_run_time_ms must be 100–600000",
            ));
        }
        if !(1_000..=3_600_000).contains(&self.max_flush_time_ms) {
            return Err(ConfigError::ValidationFailed(
                "max_flush_time_ms must be 1000–3600000",
            ));
        }
        if !(1..=60_000).contains(&self.retract_time_ms) {
            return Err(ConfigError::ValidationFailed(
                "retract_time_ms must be 1–60000",
            ));
        }
        if !(10..=5_000).contains(&self.blink_on_ms) || !(10..=5_000).contains(&self.blink_off_ms)
        {
            return Err(ConfigError::ValidationFailed(
                "blink_on_ms and blink_off_ms must be 10–5000",
            ));
        }
        if self.release_settle_ms > 1_000 {
            return Err(ConfigError::ValidationFailed(
                "release_settle_ms must be 0–1000",
            ));
        }
        if !(1..=1_000).contains(&self.adc_timeout_ms) {
            return Err(ConfigError::ValidationFailed(
                "adc_timeout_ms must be 1–1000",
            ));
        }
        Ok(())
    }
}
