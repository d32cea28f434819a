//! Pins reserved by the machine wiring
//!
//! Connector numbers of the motion controller board. The command layer
//! refuses to reconfigure or drive any of these.

/// Step outputs
pub const STEP_X: u8 = 54;
pub const STEP_Y: u8 = 60;
pub const STEP_Z: u8 = 46;
pub const STEP_A: u8 = 26;

/// Direction outputs
pub const DIR_X: u8 = 55;
pub const DIR_Y: u8 = 61;
pub const DIR_Z: u8 = 48;
pub const DIR_A: u8 = 28;

/// Shared stepper enable
pub const ENABLE: u8 = 40;

/// Cycle control buttons
pub const PROBE: u8 = 31;
pub const PAUSE: u8 = 23;
pub const STOP: u8 = 22;
pub const PLAY: u8 = 13;

/// Every pin owned by the machine wiring
pub const RESERVED_PINS: [u8; 38] = [
    STEP_X, STEP_Y, STEP_Z, STEP_A, //
    DIR_X, DIR_Y, DIR_Z, DIR_A, //
    ENABLE, //
    38, 39, // relays
    3, 15, 19, // max limits
    2, 14, 18, // min limits
    PROBE, PAUSE, STOP, PLAY, //
    10, 11, 12, // jog velocity select
    4, 5, 6, 7, 8, 9, // jog axis inputs
    94, 95, 92, 93, // analog inputs
    50, 51, 52, 53, // SPI
];

/// Highest addressable pin number
pub const MAX_PIN: u8 = 97;

/// Check if a pin belongs to the machine wiring
pub fn is_reserved(pin: u8) -> bool {
    RESERVED_PINS.contains(&pin)
}
