//! Fault line monitoring task
//!
//! Samples every fault port each period and hands the levels to the
//! fault monitor. The monitor runs on every sample, not only on a level
//! change, so a line that is still faulted latches again as soon as a
//! re-arm makes it sensitive.

use defmt::*;
use embassy_time::{Duration, Ticker};

use torchlift_core::command::FaultAccess;

use crate::board::FaultInputs;
use crate::channels::{FAULTS, FAULT_LATCHED, THC};

/// Fault line sample period
const FAULT_POLL_US: u64 = 100;

/// Fault task - latches the first faulting line into a feed hold
#[embassy_executor::task]
pub async fn fault_task(inputs: FaultInputs) {
    info!("Fault task started");

    let mut ticker = Ticker::every(Duration::from_micros(FAULT_POLL_US));

    let mut last = None;

    loop {
        let levels = inputs.levels();

        if last != Some(levels) {
            last = Some(levels);
            trace!("Fault ports: {}", levels);
        }

        if let Some(source) = FAULTS.with_monitor(|m| m.on_pin_change(levels, &THC)) {
            error!("Fault on {}{}, feed hold requested", source.port, source.bit);
            FAULT_LATCHED.signal(source);
        }

        ticker.next().await;
    }
}
