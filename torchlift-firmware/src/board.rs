//! RP2040 board adapters
//!
//! Bridges embassy-rp peripherals to the torchlift-hal traits, and fixes
//! the pin assignment of the reference board:
//!
//! | Function            | GPIO          |
//! |---------------------|---------------|
//! | Console UART TX/RX  | 0 / 1         |
//! | Z step / dir        | 2 / 3         |
//! | Fault port B bits 0-3 | 4-7         |
//! | Fault port J bits 0-3 | 8-11        |
//! | Fault port K bits 0-3 | 12-15       |
//! | General pins 41, 42, 43, 30 | 25, 26, 27, 28 |
//! | Arc voltage divider | 29 (ADC3)     |

use defmt::*;
use embassy_rp::adc::{Adc, Blocking, Channel, Error as AdcError};
use embassy_rp::gpio::{Flex, Input, Level, Output, Pull};
use embassy_time::Delay;

use torchlift_core::config::FaultConfig;
use torchlift_core::safety::{FaultPort, PortLevels, FAULT_PORT_COUNT};
use torchlift_drivers::sensor::{LatchedConverter, SampleSource};
use torchlift_drivers::stepper::GpioStepAxis;
use torchlift_hal::{OutputPin, PinBank, PinMode};

/// Step/dir output of the controlled axis
pub type ZAxis = GpioStepAxis<RpOutput, RpOutput, Delay>;

/// Arc voltage converter
pub type ArcConverter = LatchedConverter<RpAdcSource>;

/// Push-pull output
pub struct RpOutput(pub Output<'static>);

impl OutputPin for RpOutput {
    fn set_high(&mut self) {
        self.0.set_high();
    }

    fn set_low(&mut self) {
        self.0.set_low();
    }

    fn is_set_high(&self) -> bool {
        self.0.is_set_high()
    }
}

/// RP2040 SAR ADC on one channel
pub struct RpAdcSource {
    adc: Adc<'static, Blocking>,
    channel: Channel<'static>,
}

impl RpAdcSource {
    pub fn new(adc: Adc<'static, Blocking>, channel: Channel<'static>) -> Self {
        Self { adc, channel }
    }
}

impl SampleSource for RpAdcSource {
    type Error = AdcError;
    const BITS: u32 = 12;

    fn convert(&mut self) -> Result<u16, AdcError> {
        self.adc.blocking_read(&mut self.channel)
    }
}

/// Lines wired per fault port
const LINES_PER_PORT: usize = 8;

/// Fault input lines grouped by port
pub struct FaultInputs {
    lines: [[Option<Input<'static>>; LINES_PER_PORT]; FAULT_PORT_COUNT],
    config: FaultConfig,
}

impl FaultInputs {
    pub fn new(config: FaultConfig) -> Self {
        Self {
            lines: core::array::from_fn(|_| core::array::from_fn(|_| None)),
            config,
        }
    }

    /// Wire one line of a port
    pub fn attach(&mut self, port: FaultPort, bit: usize, input: Input<'static>) {
        if let Some(line) = self.lines[port.index()].get_mut(bit) {
            *line = Some(input);
        }
    }

    /// Watched lines with no input behind them
    pub fn unwired(&self, port: FaultPort) -> u8 {
        let watched = self.config.port(port).watch_mask;
        let wired = self.lines[port.index()]
            .iter()
            .enumerate()
            .filter(|(_, line)| line.is_some())
            .fold(0u8, |mask, (bit, _)| mask | (1 << bit));
        watched & !wired
    }

    /// Sample every port; unwired lines read at their idle level
    pub fn levels(&self) -> PortLevels {
        FaultPort::SCAN_ORDER
            .iter()
            .fold(PortLevels::default(), |levels, &port| {
                let mut bits = self.config.port(port).idle_mask;
                for (bit, line) in self.lines[port.index()].iter().enumerate() {
                    if let Some(input) = line {
                        if input.is_high() {
                            bits |= 1 << bit;
                        } else {
                            bits &= !(1 << bit);
                        }
                    }
                }
                levels.with(port, bits)
            })
    }
}

/// General-purpose pins addressed by connector number
pub struct GpioBank {
    pins: [(u8, Flex<'static>); 4],
}

impl GpioBank {
    pub fn new(pins: [(u8, Flex<'static>); 4]) -> Self {
        Self { pins }
    }

    fn pin(&mut self, number: u8) -> Option<&mut Flex<'static>> {
        let found = self
            .pins
            .iter_mut()
            .find(|(n, _)| *n == number)
            .map(|(_, flex)| flex);
        if found.is_none() {
            debug!("Pin {} is not wired on this board", number);
        }
        found
    }
}

impl PinBank for GpioBank {
    fn set_mode(&mut self, pin: u8, mode: PinMode) {
        if let Some(flex) = self.pin(pin) {
            match mode {
                PinMode::Input => {
                    flex.set_pull(Pull::None);
                    flex.set_as_input();
                }
                PinMode::InputPullUp => {
                    flex.set_pull(Pull::Up);
                    flex.set_as_input();
                }
                PinMode::Output => flex.set_as_output(),
            }
        }
    }

    fn write(&mut self, pin: u8, high: bool) {
        if let Some(flex) = self.pin(pin) {
            flex.set_level(if high { Level::High } else { Level::Low });
        }
    }

    fn read(&mut self, pin: u8) -> bool {
        self.pin(pin).is_some_and(|flex| flex.is_high())
    }
}
