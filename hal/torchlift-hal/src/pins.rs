//! Numbered general-purpose pins
//!
//! The command layer addresses board pins by their connector number
//! rather than by typed handles. This trait is the runtime-dispatched
//! counterpart of [`crate::gpio`].

/// Pin direction and pull configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PinMode {
    /// Floating input
    Input,
    /// Push-pull output
    Output,
    /// Input with internal pull-up
    InputPullUp,
}

impl PinMode {
    /// Decode the numeric mode used on the command line (0, 1, 2)
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(PinMode::Input),
            1 => Some(PinMode::Output),
            2 => Some(PinMode::InputPullUp),
            _ => None,
        }
    }
}

/// Bank of pins addressed by number
pub trait PinBank {
    /// Configure a pin
    fn set_mode(&mut self, pin: u8, mode: PinMode);

    /// Drive an output pin
    fn write(&mut self, pin: u8, high: bool);

    /// Read the current level of a pin
    fn read(&mut self, pin: u8) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_codes() {
        assert_eq!(PinMode::from_code(0), Some(PinMode::Input));
        assert_eq!(PinMode::from_code(1), Some(PinMode::Output));
        assert_eq!(PinMode::from_code(2), Some(PinMode::InputPullUp));
        assert_eq!(PinMode::from_code(3), None);
    }
}
