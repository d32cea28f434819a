//! Board-agnostic realtime core for the torch height controller
//!
//! This crate contains everything that runs inside the interrupt handlers
//! and the command layer that drives them, without touching registers:
//!
//! - Continuous analog sampler for the arc feedback voltage
//! - Bang-bang height control law with a hysteresis band
//! - Tick driver emitting step pulses and tracking axis position
//! - Latching fault monitor that forces a feed hold
//! - Shared single-producer state between handlers and the main loop
//! - Command parsing, execution and reports
//! - Configuration type definitions

#![no_std]
#![deny(unsafe_code)]

pub mod command;
pub mod config;
pub mod control;
pub mod motion;
pub mod report;
pub mod safety;
pub mod sampler;
pub mod shared;
pub mod state;
pub mod traits;

pub use shared::ThcShared;
