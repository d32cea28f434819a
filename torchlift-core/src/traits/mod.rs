//! Hardware abstraction traits
//!
//! Interfaces between the realtime core and the step/direction hardware.

pub mod stepper;

pub use stepper::{Axis, StepAxis};
