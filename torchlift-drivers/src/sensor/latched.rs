//! Two-register latch for whole-sample converters
//!
//! Some converters (the RP2040 SAR ADC among them) return a whole 12-bit
//! sample from one blocking call instead of exposing split data
//! registers. This adapter presents such a converter through
//! [`ConversionRegisters`], including the lock that holds the high byte
//! once the low byte has been read, and scales the sample down to the
//! 10-bit range the height controller works in.

use torchlift_hal::ConversionRegisters;

/// Converter returning one whole sample per call
pub trait SampleSource {
    /// Error type for a failed conversion
    type Error;

    /// Resolution of the returned samples in bits
    const BITS: u32;

    /// Run one conversion
    fn convert(&mut self) -> Result<u16, Self::Error>;
}

/// Output resolution
const OUTPUT_BITS: u32 = 10;

/// Register-latch adapter
pub struct LatchedConverter<S> {
    source: S,
    result: u16,
    locked_high: Option<u8>,
    errors: u32,
}

impl<S: SampleSource> LatchedConverter<S> {
    /// Wrap a sample source
    pub fn new(source: S) -> Self {
        Self {
            source,
            result: 0,
            locked_high: None,
            errors: 0,
        }
    }

    /// Number of failed conversions
    ///
    /// A failed conversion keeps the previous result in the registers.
    pub fn errors(&self) -> u32 {
        self.errors
    }

    fn scale(sample: u16) -> u16 {
        if S::BITS > OUTPUT_BITS {
            sample >> (S::BITS - OUTPUT_BITS)
        } else {
            sample << (OUTPUT_BITS - S::BITS)
        }
    }
}

impl<S: SampleSource> ConversionRegisters for LatchedConverter<S> {
    fn start(&mut self) {
        match self.source.convert() {
            Ok(sample) => self.result = Self::scale(sample),
            Err(_) => self.errors = self.errors.wrapping_add(1),
        }
    }

    fn read_low(&mut self) -> u8 {
        self.locked_high = Some((self.result >> 8) as u8);
        self.result as u8
    }

    fn read_high(&mut self) -> u8 {
        self.locked_high
            .take()
            .unwrap_or((self.result >> 8) as u8)
    }
}
