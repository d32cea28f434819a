//! Tick timer task
//!
//! Drives the Z axis toward the current jog intent, one step per period,
//! and stops stepping while a feed hold is pending.

use defmt::*;
use embassy_time::{Duration, Ticker};

use torchlift_core::motion::{TickDriver, TickState};

use crate::board::ZAxis;
use crate::channels::THC;

/// Tick task - runs the tick driver every `period_us`
#[embassy_executor::task]
pub async fn tick_task(mut driver: TickDriver<ZAxis>, period_us: u32) {
    info!("Tick task started ({} us)", period_us);

    let mut ticker = Ticker::every(Duration::from_micros(u64::from(period_us)));

    let mut held = false;

    loop {
        ticker.next().await;

        let now_held = driver.on_tick(&THC) == TickState::Held;
        if now_held != held {
            held = now_held;
            if held {
                warn!("Feed hold: stepping suspended at {}", THC.position());
            } else {
                info!("Cycle start: stepping resumed");
            }
        }
    }
}
