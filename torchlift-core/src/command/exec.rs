//! Command execution
//!
//! Applies parsed commands to the shared state, the fault monitor and
//! the general-purpose pins.

use core::cell::RefCell;
use core::ops::ControlFlow;

use torchlift_hal::PinBank;

use super::parser::Command;
use super::wait::{wait_for_pin, WaitOutcome};
use crate::report::ThcStatus;
use crate::safety::{FaultMonitor, FaultStatus};
use crate::shared::ThcShared;

/// Scoped access to the fault monitor
///
/// The monitor is shared with the pin-change handler, so the command
/// layer only borrows it for the duration of `f`. On target the
/// implementation masks interrupts for that scope.
pub trait FaultAccess {
    fn with_monitor<R>(&self, f: impl FnOnce(&mut FaultMonitor) -> R) -> R;
}

impl FaultAccess for RefCell<FaultMonitor> {
    fn with_monitor<R>(&self, f: impl FnOnce(&mut FaultMonitor) -> R) -> R {
        f(&mut self.borrow_mut())
    }
}

/// Result of a command, to be reported to the operator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Response {
    /// Command applied
    Ok,
    /// Controller status
    ThcStatus(ThcStatus),
    /// Target voltage setting
    Setting(u16),
    /// Pin level read back
    PinLevel(bool),
    /// Fault monitor status
    Fault(FaultStatus),
    /// Wait for pin interrupted by a realtime request
    WaitAborted,
}

/// Everything a command can touch
pub struct CommandContext<'a, B, F> {
    pub shared: &'a ThcShared,
    pub faults: &'a F,
    pub pins: &'a mut B,
}

impl<'a, B: PinBank, F: FaultAccess> CommandContext<'a, B, F> {
    /// Create a context
    pub fn new(shared: &'a ThcShared, faults: &'a F, pins: &'a mut B) -> Self {
        Self {
            shared,
            faults,
            pins,
        }
    }

    /// Apply a command
    ///
    /// `housekeeping` runs on every poll of a pin wait; returning
    /// `Break` abandons the wait.
    pub fn execute<H>(&mut self, command: Command, housekeeping: H) -> Response
    where
        H: FnMut() -> ControlFlow<()>,
    {
        match command {
            Command::ThcStatus => Response::ThcStatus(ThcStatus::capture(self.shared)),
            Command::SetTarget(target) => {
                self.shared.set_target(target);
                Response::Setting(target)
            }
            Command::SetHysteresis(hysteresis) => {
                self.shared.set_hysteresis(hysteresis);
                Response::Ok
            }
            Command::Engage(engaged) => {
                self.shared.set_engaged(engaged);
                Response::Ok
            }
            Command::ReportSetting => Response::Setting(self.shared.setpoint().target),
            Command::PinMode { pin, mode } => {
                self.pins.set_mode(pin, mode);
                Response::Ok
            }
            Command::PinWrite { pin, high } => {
                self.pins.write(pin, high);
                Response::Ok
            }
            Command::PinRead { pin } => Response::PinLevel(self.pins.read(pin)),
            Command::WaitForPin { pin, high } => {
                match wait_for_pin(&mut *self.pins, pin, high, housekeeping) {
                    WaitOutcome::Reached { .. } => Response::Ok,
                    WaitOutcome::Aborted => Response::WaitAborted,
                }
            }
            Command::FaultStatus => Response::Fault(self.faults.with_monitor(|m| m.status())),
            Command::Rearm(source) => {
                let status = self.faults.with_monitor(|m| {
                    m.rearm(source);
                    m.status()
                });
                Response::Fault(status)
            }
            Command::RestoreMovement => {
                self.faults
                    .with_monitor(|m| m.restore_movement(self.shared));
                Response::Ok
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::parse;
    use crate::config::{ControlSetpoint, FaultConfig};
    use crate::safety::{FaultPort, FaultSource, FaultState, PortLevels};
    use crate::state::ExecFlags;
    use torchlift_hal::PinMode;

    struct MockPins {
        modes: [Option<PinMode>; 98],
        levels: [bool; 98],
    }

    impl MockPins {
        fn new() -> Self {
            Self {
                modes: [None; 98],
                levels: [false; 98],
            }
        }
    }

    impl PinBank for MockPins {
        fn set_mode(&mut self, pin: u8, mode: PinMode) {
            self.modes[pin as usize] = Some(mode);
        }

        fn write(&mut self, pin: u8, high: bool) {
            self.levels[pin as usize] = high;
        }

        fn read(&mut self, pin: u8) -> bool {
            self.levels[pin as usize]
        }
    }

    fn run(line: &str, shared: &ThcShared, faults: &RefCell<FaultMonitor>, pins: &mut MockPins) -> Response {
        let command = parse(line).unwrap();
        CommandContext::new(shared, faults, pins).execute(command, || ControlFlow::Continue(()))
    }

    fn monitor() -> RefCell<FaultMonitor> {
        RefCell::new(FaultMonitor::new(
            FaultConfig::none().with_port(FaultPort::K, 0x01, 0x01),
        ))
    }

    #[test]
    fn test_setpoint_commands() {
        let shared = ThcShared::new();
        let faults = monitor();
        let mut pins = MockPins::new();

        assert_eq!(run("$THC=480", &shared, &faults, &mut pins), Response::Setting(480));
        assert_eq!(run("$THCH=6", &shared, &faults, &mut pins), Response::Ok);
        assert_eq!(run("$THC1", &shared, &faults, &mut pins), Response::Ok);

        assert_eq!(
            shared.setpoint(),
            ControlSetpoint {
                target: 480,
                hysteresis: 6
            }
        );
        assert!(shared.engaged());
        assert_eq!(run("$133", &shared, &faults, &mut pins), Response::Setting(480));
    }

    #[test]
    fn test_status_snapshot() {
        let shared = ThcShared::new();
        shared.publish_voltage(321);
        let faults = monitor();
        let mut pins = MockPins::new();

        match run("$THC-", &shared, &faults, &mut pins) {
            Response::ThcStatus(status) => {
                assert_eq!(status.voltage, 321);
                assert!(!status.engaged);
            }
            other => panic!("unexpected response {:?}", other),
        }
    }

    #[test]
    fn test_pin_commands() {
        let shared = ThcShared::new();
        let faults = monitor();
        let mut pins = MockPins::new();

        run("$IOP41M1", &shared, &faults, &mut pins);
        run("$IOP41S1", &shared, &faults, &mut pins);
        assert_eq!(pins.modes[41], Some(PinMode::Output));
        assert_eq!(run("$IOP41R", &shared, &faults, &mut pins), Response::PinLevel(true));
        assert_eq!(run("$WFP41S1", &shared, &faults, &mut pins), Response::Ok);
    }

    #[test]
    fn test_wait_aborted_by_housekeeping() {
        let shared = ThcShared::new();
        let faults = monitor();
        let mut pins = MockPins::new();

        let command = parse("$WFP30S1").unwrap();
        let response = CommandContext::new(&shared, &faults, &mut pins)
            .execute(command, || ControlFlow::Break(()));
        assert_eq!(response, Response::WaitAborted);
    }

    #[test]
    fn test_rearm_then_restore() {
        let shared = ThcShared::new();
        let faults = monitor();
        let mut pins = MockPins::new();

        faults
            .borrow_mut()
            .on_pin_change(PortLevels::default(), &shared);
        assert!(shared.exec_flags().contains(ExecFlags::FEED_HOLD));

        match run("$REARM=K0", &shared, &faults, &mut pins) {
            Response::Fault(status) => {
                assert_eq!(status.state, FaultState::Armed);
                assert_eq!(status.active, None);
            }
            other => panic!("unexpected response {:?}", other),
        }

        run("~", &shared, &faults, &mut pins);
        assert!(shared.exec_flags().contains(ExecFlags::CYCLE_START));
    }

    #[test]
    fn test_fault_status_reports_source() {
        let shared = ThcShared::new();
        let faults = monitor();
        let mut pins = MockPins::new();
        faults
            .borrow_mut()
            .on_pin_change(PortLevels::default(), &shared);

        match run("$FLT", &shared, &faults, &mut pins) {
            Response::Fault(status) => {
                assert_eq!(status.active, FaultSource::new(FaultPort::K, 0));
            }
            other => panic!("unexpected response {:?}", other),
        }
    }
}
