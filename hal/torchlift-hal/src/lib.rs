//! Torchlift Hardware Abstraction Layer
//!
//! This crate defines hardware abstraction traits that are implemented
//! by chip-specific code (RP2040 on the reference board) and by host-side
//! test doubles. Keeping them here lets the realtime core stay free of
//! any register access.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  torchlift-firmware (tasks, wiring)     │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  torchlift-core (realtime THC logic)    │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  torchlift-hal (this crate - traits)    │
//! └─────────────────────────────────────────┘
//! ```
//!
//! # Traits
//!
//! - [`gpio::OutputPin`] - Digital outputs
//! - [`adc::ConversionRegisters`] - Single-channel analog converter
//! - [`pins::PinBank`] - Numbered general-purpose pins for the command layer

#![no_std]
#![deny(unsafe_code)]

pub mod adc;
pub mod gpio;
pub mod pins;

// Re-export key traits at crate root for convenience
pub use adc::ConversionRegisters;
pub use gpio::OutputPin;
pub use pins::{PinBank, PinMode};
