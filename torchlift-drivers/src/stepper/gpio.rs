//! GPIO step/direction output
//!
//! Bit-banged step pulses for external step/direction drivers (A4988,
//! DRV8825, TB6600 and the like). Pulse width and direction setup time
//! are busy-waited with an `embedded-hal` delay, so both must stay well
//! inside one tick period.

use embedded_hal::delay::DelayNs;
use torchlift_core::config::TickConfig;
use torchlift_core::traits::{Axis, StepAxis};
use torchlift_hal::OutputPin;

/// Step signal timing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StepTiming {
    /// Minimum step pulse high time in microseconds
    pub pulse_us: u32,
    /// Direction setup time before a step edge in microseconds
    pub dir_setup_us: u32,
}

impl Default for StepTiming {
    fn default() -> Self {
        Self {
            pulse_us: 10,
            dir_setup_us: 10,
        }
    }
}

impl From<&TickConfig> for StepTiming {
    fn from(config: &TickConfig) -> Self {
        Self {
            pulse_us: config.step_pulse_us,
            dir_setup_us: config.dir_setup_us,
        }
    }
}

/// Step/direction output for a single axis
pub struct GpioStepAxis<S, D, T> {
    axis: Axis,
    step: S,
    dir: D,
    delay: T,
    timing: StepTiming,
}

impl<S: OutputPin, D: OutputPin, T: DelayNs> GpioStepAxis<S, D, T> {
    /// Create a new output; the step line is driven low
    pub fn new(axis: Axis, mut step: S, dir: D, delay: T, timing: StepTiming) -> Self {
        step.set_low();
        Self {
            axis,
            step,
            dir,
            delay,
            timing,
        }
    }

    /// Axis this output drives
    pub fn axis(&self) -> Axis {
        self.axis
    }

    /// Get access to the step pin
    pub fn step_pin(&self) -> &S {
        &self.step
    }

    /// Get access to the direction pin
    pub fn dir_pin(&self) -> &D {
        &self.dir
    }
}

impl<S: OutputPin, D: OutputPin, T: DelayNs> StepAxis for GpioStepAxis<S, D, T> {
    fn set_direction(&mut self, axis: Axis, high: bool) {
        if axis != self.axis || self.dir.is_set_high() == high {
            return;
        }
        self.dir.set_state(high);
        self.delay.delay_us(self.timing.dir_setup_us);
    }

    fn pulse(&mut self, axis: Axis) {
        if axis != self.axis {
            return;
        }
        self.step.set_high();
        self.delay.delay_us(self.timing.pulse_us);
        self.step.set_low();
    }
}
