//! State shared between the realtime handlers and the main loop
//!
//! Every value here has exactly one producer:
//!
//! | Value          | Producer          | Consumers                  |
//! |----------------|-------------------|----------------------------|
//! | voltage        | sampler           | tick driver, reports       |
//! | setpoint       | command layer     | tick driver, reports       |
//! | engaged        | command layer     | tick driver, reports       |
//! | position       | tick driver       | reports, motion engine     |
//! | exec flags     | fault monitor, command layer (set) / motion engine (clear) | motion engine |
//!
//! No locks are taken. On targets where a value is wider than the native
//! atomic access, `portable-atomic` (with its `critical-section` backend)
//! masks interrupts for the duration of the access, so a main-loop read
//! can never observe a half-written value.

use portable_atomic::{AtomicBool, AtomicI32, AtomicU16, AtomicU32, AtomicU8, Ordering};

use crate::config::ControlSetpoint;
use crate::state::ExecFlags;

/// Cross-handler shared state
pub struct ThcShared {
    voltage: AtomicU16,
    setpoint: AtomicU32,
    engaged: AtomicBool,
    position: AtomicI32,
    exec: AtomicU8,
}

impl Default for ThcShared {
    fn default() -> Self {
        Self::new()
    }
}

impl ThcShared {
    /// Shared state with boot defaults, usable in a `static`
    pub const fn new() -> Self {
        Self::with_setpoint(ControlSetpoint::BOOT, false)
    }

    /// Shared state with a specific setpoint and mode
    pub const fn with_setpoint(setpoint: ControlSetpoint, engaged: bool) -> Self {
        Self {
            voltage: AtomicU16::new(0),
            setpoint: AtomicU32::new(setpoint.pack()),
            engaged: AtomicBool::new(engaged),
            position: AtomicI32::new(0),
            exec: AtomicU8::new(0),
        }
    }

    // --- Sampled voltage ---

    /// Publish a completed conversion (sampler only)
    pub fn publish_voltage(&self, reading: u16) {
        self.voltage.store(reading, Ordering::Release);
    }

    /// Latest completed conversion
    pub fn voltage(&self) -> u16 {
        self.voltage.load(Ordering::Acquire)
    }

    // --- Configuration (command layer) ---

    /// Replace the setpoint as one atomic word
    pub fn set_setpoint(&self, setpoint: ControlSetpoint) {
        self.setpoint.store(setpoint.pack(), Ordering::Release);
    }

    /// Current setpoint
    pub fn setpoint(&self) -> ControlSetpoint {
        ControlSetpoint::unpack(self.setpoint.load(Ordering::Acquire))
    }

    /// Change only the target voltage
    pub fn set_target(&self, target: u16) {
        let setpoint = ControlSetpoint {
            target,
            ..self.setpoint()
        };
        self.set_setpoint(setpoint);
    }

    /// Change only the hysteresis band
    pub fn set_hysteresis(&self, hysteresis: u16) {
        let setpoint = ControlSetpoint {
            hysteresis,
            ..self.setpoint()
        };
        self.set_setpoint(setpoint);
    }

    /// Engage or disengage height control
    pub fn set_engaged(&self, engaged: bool) {
        self.engaged.store(engaged, Ordering::Release);
    }

    /// Check if height control is engaged
    pub fn engaged(&self) -> bool {
        self.engaged.load(Ordering::Acquire)
    }

    // --- Axis position (tick driver) ---

    /// Apply one step to the position counter (tick driver only)
    pub fn advance_position(&self, delta: i32) {
        self.position.fetch_add(delta, Ordering::AcqRel);
    }

    /// Absolute step position of the controlled axis
    pub fn position(&self) -> i32 {
        self.position.load(Ordering::Acquire)
    }

    // --- Execution requests ---

    /// OR requests into the execution state
    pub fn request(&self, flags: ExecFlags) {
        self.exec.fetch_or(flags.bits(), Ordering::AcqRel);
    }

    /// Pending execution requests
    pub fn exec_flags(&self) -> ExecFlags {
        ExecFlags::from_bits(self.exec.load(Ordering::Acquire))
    }

    /// Clear handled requests (tick driver only)
    pub fn acknowledge(&self, flags: ExecFlags) -> ExecFlags {
        ExecFlags::from_bits(self.exec.fetch_and(!flags.bits(), Ordering::AcqRel))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_boot_state() {
        let shared = ThcShared::new();
        assert_eq!(shared.voltage(), 0);
        assert_eq!(shared.setpoint(), ControlSetpoint::BOOT);
        assert!(!shared.engaged());
        assert_eq!(shared.position(), 0);
        assert!(shared.exec_flags().is_empty());
    }

    #[test]
    fn test_partial_setpoint_updates() {
        let shared = ThcShared::new();
        shared.set_target(512);
        shared.set_hysteresis(12);
        assert_eq!(
            shared.setpoint(),
            ControlSetpoint {
                target: 512,
                hysteresis: 12
            }
        );
    }

    #[test]
    fn test_requests_accumulate_until_acknowledged() {
        let shared = ThcShared::new();
        shared.request(ExecFlags::FEED_HOLD);
        shared.request(ExecFlags::CYCLE_START);

        let pending = shared.acknowledge(ExecFlags::FEED_HOLD);
        assert!(pending.contains(ExecFlags::FEED_HOLD));
        assert_eq!(shared.exec_flags(), ExecFlags::CYCLE_START);
    }

    #[test]
    fn test_position_accumulates() {
        let shared = ThcShared::new();
        shared.advance_position(1);
        shared.advance_position(1);
        shared.advance_position(-1);
        assert_eq!(shared.position(), 1);
    }
}
