//! Two-colour status indicator driver.
//!
//! A red and a blue LED on two active-high GPIOs. Supports solid and
//! blinking modes; blinking is paced by the [`Channel::Blink`] countdown so
//! the driver never sleeps. Call [`IndicatorPort::tick`] once per control
//! loop iteration.
//!
//! ```text
//!   lit ──[blink countdown 0]──▶ dark   (arm OFF time)
//!   dark ─[blink countdown 0]──▶ lit    (arm ON time)
//! ```

use embedded_hal::digital::OutputPin;
use log::warn;
use serde::{Deserialize, Serialize};

use crate::app::ports::IndicatorPort;
use crate::timers::{Channel, CountdownTimers};

/// Indicator mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedMode {
    Off,
    On,
    Blink,
}

/// Which LED(s) to light.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LedColor {
    Red,
    Blue,
    Both,
}

impl LedColor {
    /// `(red, blue)` levels when lit.
    pub const fn levels(self) -> (bool, bool) {
        match self {
            Self::Red => (true, false),
            Self::Blue => (false, true),
            Self::Both => (true, true),
        }
    }
}

pub struct StatusLed<'t, R, B> {
    red: R,
    blue: B,
    timers: &'t CountdownTimers,
    on_ms: u32,
    off_ms: u32,
    blinking: bool,
    lit: bool,
    color: LedColor,
}

impl<'t, R: OutputPin, B: OutputPin> StatusLed<'t, R, B> {
    /// Take ownership of the two pins and drive both dark.
    pub fn new(red: R, blue: B, timers: &'t CountdownTimers, on_ms: u32, off_ms: u32) -> Self {
        let mut led = Self {
            red,
            blue,
            timers,
            on_ms,
            off_ms,
            blinking: false,
            lit: false,
            color: LedColor::Both,
        };
        led.dark();
        led
    }

    pub fn is_blinking(&self) -> bool {
        self.blinking
    }

    pub fn is_lit(&self) -> bool {
        self.lit
    }

    pub fn color(&self) -> LedColor {
        self.color
    }

    fn light(&mut self, color: LedColor) {
        let (r, b) = color.levels();
        self.write(r, b);
        self.lit = true;
    }

    fn dark(&mut self) {
        self.write(false, false);
        self.lit = false;
    }

    fn write(&mut self, r: bool, b: bool) {
        let red = if r { self.red.set_high() } else { self.red.set_low() };
        let blue = if b { self.blue.set_high() } else { self.blue.set_low() };
        if red.is_err() || blue.is_err() {
            warn!("status_led: pin write failed");
        }
    }
}

impl<R: OutputPin, B: OutputPin> IndicatorPort for StatusLed<'_, R, B> {
    fn set(&mut self, mode: LedMode, color: LedColor) {
        self.color = color;
        match mode {
            LedMode::Off => {
                self.blinking = false;
                self.timers.cancel(Channel::Blink);
                self.dark();
            }
            LedMode::On => {
                self.blinking = false;
                self.timers.cancel(Channel::Blink);
                self.light(color);
            }
            LedMode::Blink => {
                self.timers.set_delay(Channel::Blink, self.on_ms);
                self.blinking = true;
                self.light(color);
            }
        }
    }

    fn tick(&mut self) {
        if !self.blinking || !self.timers.is_expired(Channel::Blink) {
            return;
        }
        if self.lit {
            self.dark();
            self.timers.set_delay(Channel::Blink, self.off_ms);
        } else {
            self.light(self.color);
            self.timers.set_delay(Channel::Blink, self.on_ms);
        }
    }
}
