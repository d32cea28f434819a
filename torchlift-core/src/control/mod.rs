//! Torch height control law
//!
//! Pure bang-bang decision over the latest arc voltage reading.

pub mod height;

pub use height::{evaluate, HeightController, JogIntent};
