//! Fault monitor implementation
//!
//! Watches digital fault lines grouped in 8-bit ports. A line faults when
//! its level differs from its configured idle level. The first fault
//! latches the monitor, requests a feed hold and desensitizes the
//! offending line; everything after that is ignored until the operator
//! re-arms.
//!
//! Lines are scanned in a fixed order: ports B, J, K, and bits 0 to 7
//! within each port. When several lines fault in the same notification
//! the first one in scan order is recorded and the rest are dropped.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::config::FaultConfig;
use crate::shared::ThcShared;
use crate::state::ExecFlags;

/// Number of fault ports
pub const FAULT_PORT_COUNT: usize = 3;

/// Fault port identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum FaultPort {
    B,
    J,
    K,
}

impl FaultPort {
    /// Ports in scan order
    pub const SCAN_ORDER: [FaultPort; FAULT_PORT_COUNT] = [FaultPort::B, FaultPort::J, FaultPort::K];

    /// Index in scan order
    pub const fn index(self) -> usize {
        match self {
            FaultPort::B => 0,
            FaultPort::J => 1,
            FaultPort::K => 2,
        }
    }

    /// Port letter
    pub fn letter(self) -> char {
        match self {
            FaultPort::B => 'B',
            FaultPort::J => 'J',
            FaultPort::K => 'K',
        }
    }

    /// Parse a port letter (case-insensitive)
    pub fn from_letter(c: char) -> Option<Self> {
        match c.to_ascii_uppercase() {
            'B' => Some(FaultPort::B),
            'J' => Some(FaultPort::J),
            'K' => Some(FaultPort::K),
            _ => None,
        }
    }
}

/// One fault line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FaultSource {
    pub port: FaultPort,
    /// Bit within the port (0-7)
    pub bit: u8,
}

impl FaultSource {
    /// Create a fault source, or `None` if the bit is out of range
    pub fn new(port: FaultPort, bit: u8) -> Option<Self> {
        (bit < 8).then_some(Self { port, bit })
    }

    /// Mask of this line within its port
    pub fn mask(&self) -> u8 {
        1 << self.bit
    }
}

/// Port input levels sampled in one notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PortLevels(pub [u8; FAULT_PORT_COUNT]);

impl PortLevels {
    /// Levels of one port
    pub fn get(&self, port: FaultPort) -> u8 {
        self.0[port.index()]
    }

    /// Set the levels of one port
    pub fn with(mut self, port: FaultPort, levels: u8) -> Self {
        self.0[port.index()] = levels;
        self
    }
}

/// Monitor state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FaultState {
    /// Watching for faults
    Armed,
    /// A fault has been latched
    Triggered,
}

/// Snapshot for reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FaultStatus {
    pub state: FaultState,
    /// Line that caused the current trigger
    pub active: Option<FaultSource>,
    /// Sensitive lines per port, in scan order
    pub sensitivity: [u8; FAULT_PORT_COUNT],
}

/// Latching fault monitor
#[derive(Debug, Clone)]
pub struct FaultMonitor {
    config: FaultConfig,
    sensitivity: [u8; FAULT_PORT_COUNT],
    triggered: bool,
    active: Option<FaultSource>,
}

impl FaultMonitor {
    /// Create an armed monitor with every configured line sensitive
    pub const fn new(config: FaultConfig) -> Self {
        Self {
            sensitivity: [
                config.ports[0].watch_mask,
                config.ports[1].watch_mask,
                config.ports[2].watch_mask,
            ],
            config,
            triggered: false,
            active: None,
        }
    }

    /// Pin-change handler
    ///
    /// Returns the newly latched fault, if any.
    pub fn on_pin_change(&mut self, levels: PortLevels, shared: &ThcShared) -> Option<FaultSource> {
        if self.triggered {
            return None;
        }

        let source = self.first_fault(levels)?;

        self.triggered = true;
        self.active = Some(source);
        self.sensitivity[source.port.index()] &= !source.mask();
        shared.request(ExecFlags::FEED_HOLD);

        #[cfg(feature = "defmt")]
        defmt::warn!("Fault latched on {}{}", source.port, source.bit);

        Some(source)
    }

    /// First faulting line in scan order
    fn first_fault(&self, levels: PortLevels) -> Option<FaultSource> {
        FaultPort::SCAN_ORDER.iter().find_map(|&port| {
            let idle = self.config.port(port).idle_mask;
            let faulted = (levels.get(port) ^ idle) & self.sensitivity[port.index()];
            if faulted == 0 {
                None
            } else {
                Some(FaultSource {
                    port,
                    bit: faulted.trailing_zeros() as u8,
                })
            }
        })
    }

    /// Re-enable a line, clearing the latch if it is the active fault
    ///
    /// Lines that are not configured for monitoring stay insensitive.
    /// Returns true if the monitor went back to `Armed`.
    pub fn rearm(&mut self, source: FaultSource) -> bool {
        let port = source.port.index();
        self.sensitivity[port] |= source.mask() & self.config.ports[port].watch_mask;

        if self.triggered && self.active == Some(source) {
            self.triggered = false;
            self.active = None;

            #[cfg(feature = "defmt")]
            defmt::info!("Fault monitor re-armed by {}{}", source.port, source.bit);

            return true;
        }
        false
    }

    /// Request the motion engine to resume
    ///
    /// Does not clear a latched fault; re-arm first.
    pub fn restore_movement(&self, shared: &ThcShared) {
        shared.request(ExecFlags::CYCLE_START);
    }

    /// Current state
    pub fn state(&self) -> FaultState {
        if self.triggered {
            FaultState::Triggered
        } else {
            FaultState::Armed
        }
    }

    /// Line that caused the current trigger
    pub fn active_source(&self) -> Option<FaultSource> {
        self.active
    }

    /// Effective sensitivity mask for a port
    ///
    /// The platform layer programs this into the pin-change mask register.
    pub fn sensitivity(&self, port: FaultPort) -> u8 {
        self.sensitivity[port.index()]
    }

    /// Reporting snapshot
    pub fn status(&self) -> FaultStatus {
        FaultStatus {
            state: self.state(),
            active: self.active,
            sensitivity: self.sensitivity,
        }
    }
}
