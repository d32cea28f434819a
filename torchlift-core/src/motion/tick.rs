//! Tick driver
//!
//! Runs once per tick timer period (125us by default). Each tick emits at
//! most one step pulse toward the current jog intent and keeps the axis
//! position counter in sync. Every `control_divisor` ticks it re-runs the
//! height control law.
//!
//! Every path through [`TickDriver::on_tick`] is straight-line code: the
//! worst case is one direction change, one pulse and one control
//! evaluation, all of fixed length. The step timing checked by
//! [`TickConfig::validate`] must leave room for them inside one period.
//!
//! A pending `FEED_HOLD` request stops stepping from the next tick on. A
//! `CYCLE_START` request acknowledges both and resumes.

use crate::config::TickConfig;
use crate::control::{HeightController, JogIntent};
use crate::shared::ThcShared;
use crate::state::ExecFlags;
use crate::traits::StepAxis;

/// Outcome of the last tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TickState {
    /// No pulse emitted
    Idle,
    /// One pulse emitted
    Stepping,
    /// Stepping suspended by a feed hold
    Held,
}

/// Periodic step generator driven by the height controller
pub struct TickDriver<S> {
    stepper: S,
    config: TickConfig,
    controller: HeightController,
    sub_tick: u8,
    state: TickState,
}

impl<S: StepAxis> TickDriver<S> {
    /// Create a driver that starts in `Hold`
    pub fn new(stepper: S, config: TickConfig) -> Self {
        Self {
            stepper,
            config,
            controller: HeightController::new(),
            sub_tick: 0,
            state: TickState::Idle,
        }
    }

    /// Tick timer handler
    pub fn on_tick(&mut self, shared: &ThcShared) -> TickState {
        let intent = self.controller.intent();

        self.state = if self.feed_held(shared) {
            TickState::Held
        } else if intent.is_moving() {
            self.step(intent);
            shared.advance_position(intent.step_delta());
            TickState::Stepping
        } else {
            TickState::Idle
        };

        if self.sub_tick >= self.config.control_divisor.saturating_sub(1) {
            self.controller
                .update(shared.voltage(), shared.setpoint(), shared.engaged());
            self.sub_tick = 0;
        } else {
            self.sub_tick += 1;
        }

        self.state
    }

    /// Physical direction level for an intent
    ///
    /// Up drives the line low unless the axis is inverted.
    pub fn direction_level(&self, intent: JogIntent) -> bool {
        let logical_high = intent == JogIntent::Down;
        logical_high ^ self.config.direction_inverted()
    }

    /// Check the hold gate, releasing it on a cycle start
    fn feed_held(&self, shared: &ThcShared) -> bool {
        let pending = shared.exec_flags();
        if pending.contains(ExecFlags::CYCLE_START) {
            shared.acknowledge(ExecFlags::CYCLE_START.union(ExecFlags::FEED_HOLD));
            return false;
        }
        pending.contains(ExecFlags::FEED_HOLD)
    }

    fn step(&mut self, intent: JogIntent) {
        let axis = self.config.axis;
        let level = self.direction_level(intent);
        self.stepper.set_direction(axis, level);
        self.stepper.pulse(axis);
    }

    /// Jog intent applied on the next tick
    pub fn intent(&self) -> JogIntent {
        self.controller.intent()
    }

    /// Outcome of the last tick
    pub fn state(&self) -> TickState {
        self.state
    }

    /// Get access to the step output
    pub fn stepper(&self) -> &S {
        &self.stepper
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ControlSetpoint;
    use crate::traits::Axis;
    use proptest::prelude::*;

    #[derive(Default)]
    struct MockStepper {
        pulses: u32,
        last_dir: Option<(Axis, bool)>,
    }

    impl StepAxis for MockStepper {
        fn set_direction(&mut self, axis: Axis, high: bool) {
            self.last_dir = Some((axis, high));
        }

        fn pulse(&mut self, _axis: Axis) {
            self.pulses += 1;
        }
    }

    fn engaged_shared(reading: u16) -> ThcShared {
        let shared = ThcShared::with_setpoint(
            ControlSetpoint {
                target: 100,
                hysteresis: 5,
            },
            true,
        );
        shared.publish_voltage(reading);
        shared
    }

    /// Run ticks until the first control evaluation has happened
    fn settle(driver: &mut TickDriver<MockStepper>, shared: &ThcShared) {
        for _ in 0..8 {
            driver.on_tick(shared);
        }
    }

    #[test]
    fn test_hold_emits_nothing() {
        let shared = engaged_shared(100);
        let mut driver = TickDriver::new(MockStepper::default(), TickConfig::default());

        for _ in 0..64 {
            assert_eq!(driver.on_tick(&shared), TickState::Idle);
        }
        assert_eq!(driver.stepper().pulses, 0);
        assert_eq!(shared.position(), 0);
    }

    #[test]
    fn test_control_runs_every_eighth_tick() {
        let shared = engaged_shared(50);
        let mut driver = TickDriver::new(MockStepper::default(), TickConfig::default());

        for _ in 0..7 {
            driver.on_tick(&shared);
            assert_eq!(driver.intent(), JogIntent::Hold);
        }
        driver.on_tick(&shared);
        assert_eq!(driver.intent(), JogIntent::Up);
    }

    #[test]
    fn test_up_steps_and_counts() {
        let shared = engaged_shared(50);
        let mut driver = TickDriver::new(MockStepper::default(), TickConfig::default());
        settle(&mut driver, &shared);

        for _ in 0..10 {
            assert_eq!(driver.on_tick(&shared), TickState::Stepping);
        }
        assert_eq!(shared.position(), 10);
        assert_eq!(driver.stepper().pulses, 10);
        // Up is a low direction level on a non-inverted axis
        assert_eq!(driver.stepper().last_dir, Some((Axis::Z, false)));
    }

    #[test]
    fn test_down_decrements() {
        let shared = engaged_shared(200);
        let mut driver = TickDriver::new(MockStepper::default(), TickConfig::default());
        settle(&mut driver, &shared);

        for _ in 0..4 {
            driver.on_tick(&shared);
        }
        assert_eq!(shared.position(), -4);
        assert_eq!(driver.stepper().last_dir, Some((Axis::Z, true)));
    }

    #[test]
    fn test_inverted_axis_flips_direction() {
        let shared = engaged_shared(50);
        let config = TickConfig {
            dir_invert_mask: Axis::Z.bit(),
            ..Default::default()
        };
        let mut driver = TickDriver::new(MockStepper::default(), config);
        settle(&mut driver, &shared);

        driver.on_tick(&shared);
        assert_eq!(driver.stepper().last_dir, Some((Axis::Z, true)));
        assert_eq!(shared.position(), 1);
    }

    #[test]
    fn test_disengage_stops_at_next_evaluation() {
        let shared = engaged_shared(50);
        let mut driver = TickDriver::new(MockStepper::default(), TickConfig::default());
        settle(&mut driver, &shared);

        shared.set_engaged(false);
        for _ in 0..8 {
            driver.on_tick(&shared);
        }
        assert_eq!(driver.intent(), JogIntent::Hold);
        assert_eq!(driver.on_tick(&shared), TickState::Idle);
        assert_eq!(shared.position(), 8);
    }

    #[test]
    fn test_feed_hold_stops_stepping_until_cycle_start() {
        let shared = engaged_shared(50);
        let mut driver = TickDriver::new(MockStepper::default(), TickConfig::default());
        settle(&mut driver, &shared);
        assert_eq!(driver.on_tick(&shared), TickState::Stepping);

        // Fault latched between ticks
        shared.request(ExecFlags::FEED_HOLD);
        for _ in 0..100 {
            assert_eq!(driver.on_tick(&shared), TickState::Held);
        }
        assert_eq!(shared.position(), 1);
        assert_eq!(driver.stepper().pulses, 1);
        assert!(shared.exec_flags().contains(ExecFlags::FEED_HOLD));

        shared.request(ExecFlags::CYCLE_START);
        assert_eq!(driver.on_tick(&shared), TickState::Stepping);
        assert!(shared.exec_flags().is_empty());
        assert_eq!(shared.position(), 2);
    }

    #[test]
    fn test_divisor_of_one_evaluates_every_tick() {
        let shared = engaged_shared(50);
        let config = TickConfig {
            control_divisor: 1,
            ..Default::default()
        };
        let mut driver = TickDriver::new(MockStepper::default(), config);

        driver.on_tick(&shared);
        assert_eq!(driver.intent(), JogIntent::Up);
    }

    proptest! {
        #[test]
        fn prop_constant_up_moves_exactly_n(n in 0u32..500) {
            let shared = engaged_shared(10);
            let mut driver = TickDriver::new(MockStepper::default(), TickConfig::default());
            settle(&mut driver, &shared);

            for _ in 0..n {
                driver.on_tick(&shared);
            }
            prop_assert_eq!(shared.position(), n as i32);
            prop_assert_eq!(driver.stepper().pulses, n);
        }
    }
}
