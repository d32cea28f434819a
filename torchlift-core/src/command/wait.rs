//! Wait for a pin level
//!
//! A blocking wait in the main loop would starve the realtime
//! housekeeping (status reports, feed hold, reset). This loop calls the
//! housekeeping callback on every poll instead, and gives up when the
//! callback asks it to.

use core::ops::ControlFlow;

use torchlift_hal::PinBank;

/// How a wait ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum WaitOutcome {
    /// Pin reached the level after this many unsuccessful polls
    Reached { polls: u32 },
    /// Housekeeping requested an abort
    Aborted,
}

/// Poll `pin` until it reads `high`, running `housekeeping` before each poll
pub fn wait_for_pin<B, H>(pins: &mut B, pin: u8, high: bool, mut housekeeping: H) -> WaitOutcome
where
    B: PinBank,
    H: FnMut() -> ControlFlow<()>,
{
    let mut polls: u32 = 0;
    loop {
        if housekeeping().is_break() {
            return WaitOutcome::Aborted;
        }
        if pins.read(pin) == high {
            return WaitOutcome::Reached { polls };
        }
        polls = polls.saturating_add(1);
    }
}
