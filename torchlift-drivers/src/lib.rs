//! Hardware driver implementations
//!
//! This crate provides concrete implementations of the traits defined
//! in torchlift-core and torchlift-hal:
//!
//! - Step/direction output over two GPIO lines
//! - Register-latch model for converters that return whole samples

#![no_std]
#![deny(unsafe_code)]

pub mod sensor;
pub mod stepper;
