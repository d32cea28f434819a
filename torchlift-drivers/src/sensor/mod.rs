//! Analog input drivers

pub mod latched;

pub use latched::{LatchedConverter, SampleSource};
