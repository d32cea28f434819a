//! Realtime axis motion
//!
//! Periodic tick handler that steps the controlled axis.

pub mod tick;

pub use tick::{TickDriver, TickState};
