//! Arc voltage sampling task
//!
//! The RP2040 ADC finishes a conversion within 2us, well before the next
//! period, so each period is treated as one conversion-complete
//! notification.

use defmt::*;
use embassy_time::{Duration, Ticker};

use torchlift_core::sampler::Sampler;

use crate::board::ArcConverter;
use crate::channels::THC;

/// Sampler task - publishes one reading per period
#[embassy_executor::task]
pub async fn sampler_task(mut sampler: Sampler<ArcConverter>, period_us: u32) {
    info!("Sampler task started ({} us)", period_us);

    let mut ticker = Ticker::every(Duration::from_micros(u64::from(period_us)));
    let mut reported_errors = 0;

    sampler.start_conversion();

    loop {
        ticker.next().await;

        if let Some(reading) = sampler.on_conversion_complete(&THC) {
            trace!("Arc voltage: {} (sample {})", reading, sampler.completed());
        }

        let errors = sampler.converter().errors();
        if errors != reported_errors {
            warn!("ADC conversion failed ({} total)", errors);
            reported_errors = errors;
        }
    }
}
