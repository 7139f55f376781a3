//! In-memory board for the host simulator and tests.
//!
//! - [`SimPin`]: a GPIO line. Clones share the same level, so a test keeps
//!   one handle while the driver owns another.
//! - [`SimAdc`]: the setpoint knob; `None` models a conversion that never
//!   completes.
//! - [`SimBackupRegisters`]: the battery-backed register file, with write
//!   protection enforced and lock/unlock counted. Persists to a file with
//!   `postcard` so statistics survive simulator restarts.

use std::cell::Cell;
use std::convert::Infallible;
use std::fs;
use std::io;
use std::path::Path;
use std::rc::Rc;

use embedded_hal::digital::{ErrorType, InputPin, OutputPin};
use log::{debug, info};

use crate::app::ports::{AdcError, BackupRegisters, BackupSlot, SetpointAdc, StorageError};

// ───────────────────────────────────────────────────────────────
// SimPin
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct SimPin {
    level: Rc<Cell<bool>>,
}

impl SimPin {
    pub fn new(level_high: bool) -> Self {
        Self {
            level: Rc::new(Cell::new(level_high)),
        }
    }

    /// `true` when the line is high.
    pub fn level(&self) -> bool {
        self.level.get()
    }

    pub fn set_level(&self, high: bool) {
        self.level.set(high);
    }
}

impl ErrorType for SimPin {
    type Error = Infallible;
}

impl InputPin for SimPin {
    fn is_high(&mut self) -> Result<bool, Infallible> {
        Ok(self.level.get())
    }

    fn is_low(&mut self) -> Result<bool, Infallible> {
        Ok(!self.level.get())
    }
}

impl OutputPin for SimPin {
    fn set_low(&mut self) -> Result<(), Infallible> {
        self.level.set(false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Infallible> {
        self.level.set(true);
        Ok(())
    }
}

// ───────────────────────────────────────────────────────────────
// SimAdc
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct SimAdc {
    raw: Rc<Cell<Option<u16>>>,
    conversions: Rc<Cell<u32>>,
}

impl SimAdc {
    pub fn new(raw: Option<u16>) -> Self {
        Self {
            raw: Rc::new(Cell::new(raw)),
            conversions: Rc::new(Cell::new(0)),
        }
    }

    /// Turn the knob. `None` makes every conversion time out.
    pub fn set_raw(&self, raw: Option<u16>) {
        self.raw.set(raw);
    }

    /// Conversions started so far.
    pub fn conversions(&self) -> u32 {
        self.conversions.get()
    }
}

impl SetpointAdc for SimAdc {
    fn read_blocking(&mut self, timeout_ms: u32) -> Result<u16, AdcError> {
        self.conversions.set(self.conversions.get() + 1);
        match self.raw.get() {
            Some(raw) => Ok(raw),
            None => {
                debug!("sim adc: no end-of-conversion within {} ms", timeout_ms);
                Err(AdcError::Timeout)
            }
        }
    }
}

// ───────────────────────────────────────────────────────────────
// SimBackupRegisters
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct SimBackupRegisters {
    regs: [u32; BackupSlot::COUNT],
    write_enabled: bool,
    unlocks: u32,
    locks: u32,
    fail_writes: bool,
}

impl SimBackupRegisters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a slot directly, bypassing write protection.
    pub fn preset(&mut self, slot: BackupSlot, value: u32) {
        self.regs[slot.index()] = value;
    }

    /// Make every subsequent write fail with [`StorageError::IoError`].
    pub fn set_fail_writes(&mut self, fail: bool) {
        self.fail_writes = fail;
    }

    pub fn is_write_protected(&self) -> bool {
        !self.write_enabled
    }

    pub fn unlock_count(&self) -> u32 {
        self.unlocks
    }

    pub fn lock_count(&self) -> u32 {
        self.locks
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, postcard::Error> {
        postcard::to_allocvec(&self.regs)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, postcard::Error> {
        let regs: [u32; BackupSlot::COUNT] = postcard::from_bytes(bytes)?;
        Ok(Self {
            regs,
            ..Self::default()
        })
    }

    /// Load from `path`; a missing file is a fresh, zeroed domain.
    pub fn load(path: &Path) -> io::Result<Self> {
        match fs::read(path) {
            Ok(bytes) => {
                let regs = Self::from_bytes(&bytes)
                    .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e.to_string()))?;
                info!("sim backup: loaded {}", path.display());
                Ok(regs)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                info!("sim backup: {} not found, starting zeroed", path.display());
                Ok(Self::new())
            }
            Err(e) => Err(e),
        }
    }

    pub fn save(&self, path: &Path) -> io::Result<()> {
        let bytes = self
            .to_bytes()
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e.to_string()))?;
        fs::write(path, bytes)
    }
}

impl BackupRegisters for SimBackupRegisters {
    fn read(&self, slot: BackupSlot) -> u32 {
        self.regs[slot.index()]
    }

    fn write(&mut self, slot: BackupSlot, value: u32) -> Result<(), StorageError> {
        if !self.write_enabled {
            return Err(StorageError::WriteProtected);
        }
        if self.fail_writes {
            return Err(StorageError::IoError);
        }
        self.regs[slot.index()] = value;
        Ok(())
    }

    fn enable_write_access(&mut self) {
        self.write_enabled = true;
        self.unlocks += 1;
    }

    fn disable_write_access(&mut self) {
        self.write_enabled = false;
        self.locks += 1;
    }
}
