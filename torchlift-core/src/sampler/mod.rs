//! Continuous arc voltage sampler
//!
//! Drives a single-channel converter one conversion at a time. Each
//! conversion-complete notification reads the result, publishes it and
//! immediately starts the next conversion. The converter's free-running
//! mode is not used since it races with the result read.

use torchlift_hal::ConversionRegisters;

use crate::shared::ThcShared;

/// Mask of the significant bits in the high data register
const HIGH_BITS_MASK: u8 = 0b0000_0011;

/// Sampler state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SamplerState {
    /// No conversion in progress
    Idle,
    /// Conversion started, waiting for completion
    Converting,
}

/// Single-channel continuous sampler
pub struct Sampler<C> {
    converter: C,
    state: SamplerState,
    completed: u32,
}

impl<C: ConversionRegisters> Sampler<C> {
    /// Create an idle sampler
    pub fn new(converter: C) -> Self {
        Self {
            converter,
            state: SamplerState::Idle,
            completed: 0,
        }
    }

    /// Start the first conversion
    ///
    /// Ignored while a conversion is already in progress.
    pub fn start_conversion(&mut self) {
        if self.state == SamplerState::Converting {
            return;
        }
        self.converter.start();
        self.state = SamplerState::Converting;
    }

    /// Conversion-complete handler
    ///
    /// Returns the published reading, or `None` for a notification that
    /// does not match a started conversion.
    pub fn on_conversion_complete(&mut self, shared: &ThcShared) -> Option<u16> {
        if self.state != SamplerState::Converting {
            return None;
        }

        // Low first: it locks the high register until read
        let low = self.converter.read_low();
        let high = self.converter.read_high() & HIGH_BITS_MASK;
        let reading = (u16::from(high) << 8) | u16::from(low);

        shared.publish_voltage(reading);
        self.completed = self.completed.wrapping_add(1);

        self.converter.start();
        Some(reading)
    }

    /// Number of completed conversions
    pub fn completed(&self) -> u32 {
        self.completed
    }

    /// Get access to the underlying converter
    pub fn converter(&self) -> &C {
        &self.converter
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Converter model with the hardware's high-register lock
    ///
    /// `incoming` is a conversion result that lands in the data registers
    /// at the first register read where the lock allows it.
    struct MockConverter {
        low: u8,
        high: u8,
        locked: bool,
        incoming: Option<u16>,
        starts: u32,
    }

    impl MockConverter {
        fn new(value: u16) -> Self {
            Self {
                low: value as u8,
                high: (value >> 8) as u8,
                locked: false,
                incoming: None,
                starts: 0,
            }
        }

        fn deliver(&mut self) {
            if self.locked {
                return;
            }
            if let Some(value) = self.incoming.take() {
                self.low = value as u8;
                self.high = (value >> 8) as u8;
            }
        }
    }

    impl ConversionRegisters for MockConverter {
        fn start(&mut self) {
            self.starts += 1;
        }

        fn read_low(&mut self) -> u8 {
            let low = self.low;
            self.locked = true;
            self.deliver();
            low
        }

        fn read_high(&mut self) -> u8 {
            let high = self.high;
            self.locked = false;
            self.deliver();
            high
        }
    }

    #[test]
    fn test_publishes_completed_conversion() {
        let shared = ThcShared::new();
        let mut sampler = Sampler::new(MockConverter::new(0x02A5));

        sampler.start_conversion();
        assert_eq!(sampler.on_conversion_complete(&shared), Some(0x02A5));
        assert_eq!(shared.voltage(), 0x02A5);
    }

    #[test]
    fn test_restarts_after_each_completion() {
        let shared = ThcShared::new();
        let mut sampler = Sampler::new(MockConverter::new(100));

        sampler.start_conversion();
        for _ in 0..3 {
            sampler.on_conversion_complete(&shared);
        }
        assert_eq!(sampler.converter().starts, 4);
        assert_eq!(sampler.completed(), 3);
    }

    #[test]
    fn test_second_start_while_converting_is_ignored() {
        let shared = ThcShared::new();
        let mut sampler = Sampler::new(MockConverter::new(300));

        sampler.start_conversion();
        sampler.start_conversion();
        assert_eq!(sampler.converter().starts, 1);

        assert_eq!(sampler.on_conversion_complete(&shared), Some(300));
        assert_eq!(sampler.completed(), 1);
    }

    #[test]
    fn test_ignores_notification_without_start() {
        let shared = ThcShared::new();
        let mut sampler = Sampler::new(MockConverter::new(500));

        assert_eq!(sampler.on_conversion_complete(&shared), None);
        assert_eq!(shared.voltage(), 0);
        assert_eq!(sampler.converter().starts, 0);
    }

    #[test]
    fn test_high_byte_change_between_reads_is_not_torn() {
        let shared = ThcShared::new();
        // 0x01FF -> 0x0200 flips every bit of both bytes
        let mut converter = MockConverter::new(0x01FF);
        converter.incoming = Some(0x0200);
        let mut sampler = Sampler::new(converter);

        sampler.start_conversion();
        assert_eq!(sampler.on_conversion_complete(&shared), Some(0x01FF));

        // The newer result is delivered whole on the next completion
        assert_eq!(sampler.on_conversion_complete(&shared), Some(0x0200));
    }

    #[test]
    fn test_reserved_high_bits_are_masked() {
        let shared = ThcShared::new();
        let mut sampler = Sampler::new(MockConverter::new(0xFC10));

        sampler.start_conversion();
        assert_eq!(sampler.on_conversion_complete(&shared), Some(0x0010));
    }

    #[test]
    fn test_high_first_read_order_tears() {
        let mut converter = MockConverter::new(0x01FF);
        converter.incoming = Some(0x0200);

        let high = converter.read_high();
        let low = converter.read_low();
        let torn = (u16::from(high & HIGH_BITS_MASK) << 8) | u16::from(low);
        assert_eq!(torn, 0x0100);
    }
}
