//! Operator reports
//!
//! Formats status lines for the serial console. All reads go through
//! [`ThcShared`], so they are safe to call from the main loop while the
//! realtime handlers are running.

use core::fmt::{self, Write};

use heapless::String;

use crate::command::Response;
use crate::safety::{FaultSource, FaultState, FaultStatus};
use crate::shared::ThcShared;

/// Maximum length of one report line
pub const REPORT_LEN: usize = 64;

/// One report line
pub type ReportLine = String<REPORT_LEN>;

/// Controller snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ThcStatus {
    pub engaged: bool,
    /// Latest arc voltage reading
    pub voltage: u16,
    pub target: u16,
    pub hysteresis: u16,
    /// Controlled axis position in steps
    pub position: i32,
}

impl ThcStatus {
    /// Read every reported value
    pub fn capture(shared: &ThcShared) -> Self {
        let setpoint = shared.setpoint();
        Self {
            engaged: shared.engaged(),
            voltage: shared.voltage(),
            target: setpoint.target,
            hysteresis: setpoint.hysteresis,
            position: shared.position(),
        }
    }
}

impl fmt::Display for FaultSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.port.letter(), self.bit)
    }
}

impl fmt::Display for ThcStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[THC:{}|V:{}|SP:{}|H:{}|Z:{}]",
            if self.engaged { "ON" } else { "OFF" },
            self.voltage,
            self.target,
            self.hysteresis,
            self.position
        )
    }
}

impl fmt::Display for FaultStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.state, self.active) {
            (FaultState::Triggered, Some(source)) => write!(f, "[FAULT:Triggered {}]", source),
            (FaultState::Triggered, None) => f.write_str("[FAULT:Triggered]"),
            (FaultState::Armed, _) => f.write_str("[FAULT:Armed]"),
        }
    }
}

/// Diagnostic line emitted when a fault latches
pub fn fault_message(source: FaultSource) -> ReportLine {
    let mut line = ReportLine::new();
    // Longest possible line is well under REPORT_LEN
    let _ = write!(line, "[MSG:Fault {}]", source);
    line
}

/// Render a command response
pub fn render(response: &Response) -> ReportLine {
    let mut line = ReportLine::new();
    let _ = match response {
        Response::Ok => line.write_str("ok"),
        Response::ThcStatus(status) => write!(line, "{}", status),
        Response::Setting(target) => write!(line, "$133={}", target),
        Response::PinLevel(high) => write!(
            line,
            "State value = {}",
            if *high { "HIGH" } else { "LOW" }
        ),
        Response::Fault(status) => write!(line, "{}", status),
        Response::WaitAborted => line.write_str("[MSG:Wait aborted]"),
    };
    line
}
