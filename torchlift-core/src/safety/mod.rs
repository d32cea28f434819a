//! Safety monitoring
//!
//! Latches hardware fault lines into a feed hold.

pub mod monitor;

pub use monitor::{
    FaultMonitor, FaultPort, FaultSource, FaultState, FaultStatus, PortLevels, FAULT_PORT_COUNT,
};
