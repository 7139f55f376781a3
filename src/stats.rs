//! Persistent run statistics.
//!
//! Cumulative run time and completed-cycle count, kept in two
//! battery-backed registers so they survive power loss:
//!
//! | Slot | Contents              |
//! |------|-----------------------|
//! | 0    | total runtime (ms)    |
//! | 1    | completed run count   |
//!
//! Both counters saturate at `u32::MAX` instead of wrapping.

use core::fmt::{self, Write as _};

use heapless::String;
use log::{info, warn};

use crate::app::ports::{BackupRegisters, BackupSlot, StorageError};

/// Snapshot of the two persisted counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    pub total_runtime_ms: u32,
    pub run_count: u32,
}

impl RunStats {
    /// `H:MM:SS` of the accumulated runtime.
    pub fn runtime_hms(&self) -> String<16> {
        let secs = self.total_runtime_ms / 1000;
        let mut s = String::new();
        // 16 bytes holds u32::MAX/3600 hours plus ":MM:SS".
        let _ = write!(s, "{}:{:02}:{:02}", secs / 3600, (secs / 60) % 60, secs % 60);
        s
    }
}

impl fmt::Display for RunStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, {} runs", self.runtime_hms(), self.run_count)
    }
}

/// Re-locks the backup domain on every exit path.
struct WriteAccess<'a, B: BackupRegisters> {
    regs: &'a mut B,
}

impl<'a, B: BackupRegisters> WriteAccess<'a, B> {
    fn open(regs: &'a mut B) -> Self {
        regs.enable_write_access();
        Self { regs }
    }

    fn write(&mut self, slot: BackupSlot, value: u32) -> Result<(), StorageError> {
        self.regs.write(slot, value)
    }
}

impl<B: BackupRegisters> Drop for WriteAccess<'_, B> {
    fn drop(&mut self) {
        self.regs.disable_write_access();
    }
}

/// Owns the backup-register port and is the only writer to it.
pub struct RunStatsStore<B> {
    regs: B,
}

impl<B: BackupRegisters> RunStatsStore<B> {
    pub fn new(regs: B) -> Self {
        Self { regs }
    }

    /// Read both counters.
    pub fn load(&self) -> RunStats {
        RunStats {
            total_runtime_ms: self.regs.read(BackupSlot::RuntimeMs),
            run_count: self.regs.read(BackupSlot::RunCount),
        }
    }

    /// Add one completed cycle of `elapsed_ms` and return the new totals.
    pub fn record_run(&mut self, elapsed_ms: u32) -> Result<RunStats, StorageError> {
        let prev = self.load();
        let next = RunStats {
            total_runtime_ms: prev.total_runtime_ms.saturating_add(elapsed_ms),
            run_count: prev.run_count.saturating_add(1),
        };
        if next.run_count == prev.run_count {
            warn!("stats: run counter saturated");
        }

        let mut access = WriteAccess::open(&mut self.regs);
        access.write(BackupSlot::RuntimeMs, next.total_runtime_ms)?;
        access.write(BackupSlot::RunCount, next.run_count)?;
        Ok(next)
    }

    /// Zero both counters.
    pub fn reset(&mut self) -> Result<(), StorageError> {
        let mut access = WriteAccess::open(&mut self.regs);
        access.write(BackupSlot::RuntimeMs, 0)?;
        access.write(BackupSlot::RunCount, 0)?;
        info!("stats: counters reset");
        Ok(())
    }

    pub fn registers(&self) -> &B {
        &self.regs
    }
}
