//! Fill-time knob calibration.
//!
//! One 12-bit conversion, scaled linearly onto `0..max_ms`:
//!
//! ```text
//!   ms = (raw & 0x0FFF) * max_ms / 4096
//! ```
//!
//! The product is computed in 64 bits so any `max_ms` is exact.

use log::info;

use crate::app::ports::{AdcError, SetpointAdc};

/// Full-scale count of the 12-bit converter.
pub const ADC_FULL_SCALE: u32 = 4096;

const ADC_MASK: u16 = 0x0FFF;

pub struct SetpointCalibrator<A> {
    adc: A,
    timeout_ms: u32,
}

impl<A: SetpointAdc> SetpointCalibrator<A> {
    pub fn new(adc: A, timeout_ms: u32) -> Self {
        Self { adc, timeout_ms }
    }

    /// Sample the knob once and return the run duration in milliseconds.
    pub fn read_scaled_duration(&mut self, max_ms: u32) -> Result<u32, AdcError> {
        let raw = self.adc.read_blocking(self.timeout_ms)?;
        let ms = scale(raw, max_ms);
        info!("Runtime: {} ms", ms);
        Ok(ms)
    }
}

/// Pure scaling step.
pub const fn scale(raw: u16, max_ms: u32) -> u32 {
    ((raw & ADC_MASK) as u64 * max_ms as u64 / ADC_FULL_SCALE as u64) as u32
}
