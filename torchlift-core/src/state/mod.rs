//! Global execution state
//!
//! Realtime request flags handed to the motion engine.

pub mod exec;

pub use exec::ExecFlags;
