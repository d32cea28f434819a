//! State shared between the realtime tasks and the console
//!
//! Word-sized values live in [`ThcShared`] atomics. The fault monitor is a
//! multi-field latch, so it sits behind a critical-section mutex that both
//! the fault task and the console lock for short scopes only.

use core::cell::RefCell;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::signal::Signal;

use torchlift_core::command::FaultAccess;
use torchlift_core::config::FaultConfig;
use torchlift_core::safety::{FaultMonitor, FaultSource};
use torchlift_core::ThcShared;

/// Voltage, setpoint, mode, position and exec requests
pub static THC: ThcShared = ThcShared::new();

/// Fault latch, installed from the loaded configuration at boot
pub static FAULTS: SharedFaults = SharedFaults::new();

/// Newly latched fault, reported on the console
pub static FAULT_LATCHED: Signal<CriticalSectionRawMutex, FaultSource> = Signal::new();

/// Fault monitor behind a critical-section mutex
pub struct SharedFaults(Mutex<CriticalSectionRawMutex, RefCell<FaultMonitor>>);

impl SharedFaults {
    const fn new() -> Self {
        Self(Mutex::new(RefCell::new(FaultMonitor::new(FaultConfig::none()))))
    }

    /// Replace the monitor with a freshly armed one
    pub fn install(&self, config: FaultConfig) {
        self.0
            .lock(|monitor| *monitor.borrow_mut() = FaultMonitor::new(config));
    }
}

impl FaultAccess for SharedFaults {
    fn with_monitor<R>(&self, f: impl FnOnce(&mut FaultMonitor) -> R) -> R {
        self.0.lock(|monitor| f(&mut monitor.borrow_mut()))
    }
}
