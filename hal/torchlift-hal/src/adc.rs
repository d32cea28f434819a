//! Analog converter abstraction
//!
//! Models a single-channel converter whose result is split over two
//! 8-bit data registers:
//!
//! ```text
//! ---------------------------------------------------------
//! |      |      |      |      |      |      | ADC9 | ADC8 | HIGH
//! ---------------------------------------------------------
//! | ADC7 | ADC6 | ADC5 | ADC4 | ADC3 | ADC2 | ADC1 | ADC0 | LOW
//! ---------------------------------------------------------
//! ```
//!
//! Reading the low register locks the high register until it has been
//! read. A high-then-low read sequence can therefore pair the high bits of
//! one conversion with the low bits of the next.

/// Converter data and control registers
pub trait ConversionRegisters {
    /// Start a single conversion
    fn start(&mut self);

    /// Read the low data register (locks the high register)
    fn read_low(&mut self) -> u8;

    /// Read the high data register (releases the lock)
    fn read_high(&mut self) -> u8;
}
