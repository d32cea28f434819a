//! Bang-bang height controller
//!
//! Keeps the arc voltage inside a hysteresis band around the setpoint by
//! jogging the torch axis. A high voltage means the torch is too far from
//! the work, so the axis moves down; a low voltage moves it up.

use crate::config::ControlSetpoint;

/// Directive for the controlled axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum JogIntent {
    /// No correction
    #[default]
    Hold,
    /// Raise the torch
    Up,
    /// Lower the torch
    Down,
}

impl JogIntent {
    /// Position delta produced by one step in this direction
    pub fn step_delta(self) -> i32 {
        match self {
            JogIntent::Hold => 0,
            JogIntent::Up => 1,
            JogIntent::Down => -1,
        }
    }

    /// Check if this intent emits a step
    pub fn is_moving(self) -> bool {
        self != JogIntent::Hold
    }
}

/// Evaluate the control law for one reading
///
/// The hold band is open on both ends: a reading equal to
/// `target - hysteresis` or `target + hysteresis` is corrected.
/// A disengaged controller always holds.
pub fn evaluate(reading: u16, setpoint: ControlSetpoint, engaged: bool) -> JogIntent {
    if !engaged {
        return JogIntent::Hold;
    }

    // Widened so the band never wraps for small targets
    let reading = i32::from(reading);
    let target = i32::from(setpoint.target);
    let hysteresis = i32::from(setpoint.hysteresis);

    if reading > target - hysteresis && reading < target + hysteresis {
        JogIntent::Hold
    } else if reading > target {
        JogIntent::Down
    } else {
        JogIntent::Up
    }
}

/// Height controller holding the current jog intent
///
/// Written once per control evaluation by the tick handler and read on
/// every tick in between.
#[derive(Debug, Clone, Default)]
pub struct HeightController {
    intent: JogIntent,
}

impl HeightController {
    /// Create a controller that starts in `Hold`
    pub const fn new() -> Self {
        Self {
            intent: JogIntent::Hold,
        }
    }

    /// Run the control law and store the resulting intent
    pub fn update(&mut self, reading: u16, setpoint: ControlSetpoint, engaged: bool) -> JogIntent {
        self.intent = evaluate(reading, setpoint, engaged);
        self.intent
    }

    /// Current jog intent
    pub fn intent(&self) -> JogIntent {
        self.intent
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const SP: ControlSetpoint = ControlSetpoint {
        target: 100,
        hysteresis: 5,
    };

    #[test]
    fn test_reading_sequence() {
        let intents: [JogIntent; 4] = [100, 94, 106, 97].map(|r| evaluate(r, SP, true));
        assert_eq!(
            intents,
            [JogIntent::Hold, JogIntent::Up, JogIntent::Down, JogIntent::Hold]
        );
    }

    #[test]
    fn test_band_edges_are_corrected() {
        assert_eq!(evaluate(95, SP, true), JogIntent::Up);
        assert_eq!(evaluate(105, SP, true), JogIntent::Down);
        assert_eq!(evaluate(96, SP, true), JogIntent::Hold);
        assert_eq!(evaluate(104, SP, true), JogIntent::Hold);
    }

    #[test]
    fn test_zero_hysteresis_never_holds() {
        let sp = ControlSetpoint {
            target: 100,
            hysteresis: 0,
        };
        // Empty band: the exact setpoint falls through to the lower branch
        assert_eq!(evaluate(100, sp, true), JogIntent::Up);
        assert_eq!(evaluate(101, sp, true), JogIntent::Down);
    }

    #[test]
    fn test_small_target_does_not_wrap() {
        // Boot defaults: target 3, hysteresis 1
        let sp = ControlSetpoint::default();
        assert_eq!(evaluate(0, sp, true), JogIntent::Up);
        assert_eq!(evaluate(3, sp, true), JogIntent::Hold);

        let sp = ControlSetpoint {
            target: 2,
            hysteresis: 10,
        };
        assert_eq!(evaluate(0, sp, true), JogIntent::Hold);
    }

    #[test]
    fn test_controller_stores_intent() {
        let mut controller = HeightController::new();
        assert_eq!(controller.intent(), JogIntent::Hold);

        controller.update(200, SP, true);
        assert_eq!(controller.intent(), JogIntent::Down);

        controller.update(200, SP, false);
        assert_eq!(controller.intent(), JogIntent::Hold);
    }

    proptest! {
        #[test]
        fn prop_disengaged_always_holds(reading in 0u16..1024, target in 0u16..1024, hyst in 0u16..1024) {
            let sp = ControlSetpoint { target, hysteresis: hyst };
            prop_assert_eq!(evaluate(reading, sp, false), JogIntent::Hold);
        }

        #[test]
        fn prop_inside_band_holds(target in 10u16..1000, hyst in 1u16..10, offset in 0u16..20) {
            let sp = ControlSetpoint { target, hysteresis: hyst };
            let lo = target - hyst + 1;
            let hi = target + hyst - 1;
            let reading = lo + offset % (hi - lo + 1);
            prop_assert_eq!(evaluate(reading, sp, true), JogIntent::Hold);
        }

        #[test]
        fn prop_outside_band_corrects(target in 20u16..1000, hyst in 1u16..20, dist in 0u16..20) {
            let sp = ControlSetpoint { target, hysteresis: hyst };
            prop_assert_eq!(evaluate(target + hyst + dist, sp, true), JogIntent::Down);
            prop_assert_eq!(evaluate(target - hyst - dist.min(target - hyst), sp, true), JogIntent::Up);
        }
    }
}
