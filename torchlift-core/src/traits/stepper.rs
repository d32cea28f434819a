//! Step/direction pulse primitive
//!
//! The motion controller owns the step and direction lines of every axis.
//! The tick driver borrows one of them through this trait.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Machine axis identifier
///
/// The discriminant is the bit position used in the direction
/// inversion mask.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Axis {
    X = 0,
    Y = 1,
    Z = 2,
    A = 3,
}

impl Axis {
    /// Bit for this axis in per-axis masks
    pub const fn bit(self) -> u8 {
        1 << (self as u8)
    }
}

/// Step/direction output for one or more axes
///
/// Implementations must respect the driver's setup and hold times:
/// `set_direction` returns only once the level is stable, and `pulse`
/// holds the step line high for at least the configured width.
pub trait StepAxis {
    /// Drive the direction line of `axis` to a physical level
    fn set_direction(&mut self, axis: Axis, high: bool);

    /// Emit one active-high step pulse on `axis`
    fn pulse(&mut self, axis: Axis);
}
