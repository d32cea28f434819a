//! Configuration type definitions
//!
//! These values are owned by the command layer. The realtime handlers
//! only ever read them.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::safety::{FaultPort, FAULT_PORT_COUNT};
use crate::traits::Axis;

/// Largest value the 10-bit converter can produce
pub const MAX_READING: u16 = 1023;

/// Highest converter channel the mux field can select
pub const MAX_ADC_CHANNEL: u8 = 15;

/// Configuration errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Target or hysteresis outside the converter range
    SetpointOutOfRange,
    /// Control divisor of zero
    InvalidDivisor,
    /// Converter channel beyond the mux range
    InvalidChannel,
    /// Step timing does not fit inside one tick period
    TickTooShort,
    /// Stored configuration could not be decoded
    Deserialize,
    /// Buffer too small to encode configuration
    Serialize,
}

/// Arc voltage setpoint with its tolerance band
///
/// Both values are in raw converter counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ControlSetpoint {
    /// Voltage to stabilize on
    pub target: u16,
    /// Allowable deviation either side of the target
    pub hysteresis: u16,
}

impl Default for ControlSetpoint {
    fn default() -> Self {
        Self::BOOT
    }
}

impl ControlSetpoint {
    /// Values loaded at power-on
    pub const BOOT: Self = Self {
        target: 3,
        hysteresis: 1,
    };

    /// Pack into one word so it can be published atomically
    pub const fn pack(self) -> u32 {
        ((self.target as u32) << 16) | self.hysteresis as u32
    }

    /// Inverse of [`ControlSetpoint::pack`]
    pub const fn unpack(word: u32) -> Self {
        Self {
            target: (word >> 16) as u16,
            hysteresis: word as u16,
        }
    }

    /// Check both values are inside the converter range
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.target > MAX_READING || self.hysteresis > MAX_READING {
            return Err(ConfigError::SetpointOutOfRange);
        }
        Ok(())
    }
}

/// Tick driver timing and axis configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TickConfig {
    /// Tick timer period in microseconds
    pub tick_period_us: u32,
    /// Ticks per control evaluation
    pub control_divisor: u8,
    /// Minimum step pulse width in microseconds
    pub step_pulse_us: u32,
    /// Direction setup time before the step edge in microseconds
    pub dir_setup_us: u32,
    /// Axis driven by the height controller
    pub axis: Axis,
    /// Direction inversion mask (bit per axis)
    pub dir_invert_mask: u8,
}

impl Default for TickConfig {
    fn default() -> Self {
        Self {
            tick_period_us: 125,
            control_divisor: 8, // 8 x 125us = 1ms control interval
            step_pulse_us: 10,
            dir_setup_us: 10,
            axis: Axis::Z,
            dir_invert_mask: 0,
        }
    }
}

impl TickConfig {
    /// Control evaluation interval in microseconds
    ///
    /// Saturates at `u32::MAX`; [`TickConfig::validate`] rejects such periods.
    pub fn control_interval_us(&self) -> u32 {
        self.tick_period_us
            .saturating_mul(u32::from(self.control_divisor))
    }

    /// Check if the configured axis has its direction inverted
    pub fn direction_inverted(&self) -> bool {
        self.dir_invert_mask & self.axis.bit() != 0
    }

    /// Validate timing
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.control_divisor == 0 {
            return Err(ConfigError::InvalidDivisor);
        }
        let step_us = self
            .step_pulse_us
            .checked_add(self.dir_setup_us)
            .ok_or(ConfigError::TickTooShort)?;
        if step_us >= self.tick_period_us {
            return Err(ConfigError::TickTooShort);
        }
        self.tick_period_us
            .checked_mul(u32::from(self.control_divisor))
            .ok_or(ConfigError::TickTooShort)?;
        Ok(())
    }
}

/// Fault lines on one 8-bit port
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FaultPortConfig {
    /// Lines that are monitored
    pub watch_mask: u8,
    /// Level of each line when no fault is present
    pub idle_mask: u8,
}

impl FaultPortConfig {
    /// Port with no monitored lines
    pub const fn unused() -> Self {
        Self {
            watch_mask: 0,
            idle_mask: 0,
        }
    }
}

/// Fault line configuration for every port, in scan order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FaultConfig {
    /// Ports indexed in scan order
    pub ports: [FaultPortConfig; FAULT_PORT_COUNT],
}

impl Default for FaultConfig {
    fn default() -> Self {
        Self::none()
    }
}

impl FaultConfig {
    /// No fault lines monitored
    pub const fn none() -> Self {
        Self {
            ports: [FaultPortConfig::unused(); FAULT_PORT_COUNT],
        }
    }

    /// Set the watched lines and idle levels of one port
    pub const fn with_port(mut self, port: FaultPort, watch_mask: u8, idle_mask: u8) -> Self {
        self.ports[port.index()] = FaultPortConfig {
            watch_mask,
            idle_mask,
        };
        self
    }

    /// Configuration of one port
    pub fn port(&self, port: FaultPort) -> &FaultPortConfig {
        &self.ports[port.index()]
    }
}

/// Complete torch height controller configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ThcConfig {
    /// Boot setpoint
    pub setpoint: ControlSetpoint,
    /// Controller engaged at boot
    pub engaged: bool,
    /// Converter input channel
    pub adc_channel: u8,
    /// Tick driver configuration
    pub tick: TickConfig,
    /// Fault lines
    pub faults: FaultConfig,
}

impl Default for ThcConfig {
    fn default() -> Self {
        Self {
            setpoint: ControlSetpoint::default(),
            engaged: false,
            adc_channel: 3,
            tick: TickConfig::default(),
            faults: FaultConfig::default(),
        }
    }
}

impl ThcConfig {
    /// Validate every section
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.setpoint.validate()?;
        self.tick.validate()?;
        if self.adc_channel > MAX_ADC_CHANNEL {
            return Err(ConfigError::InvalidChannel);
        }
        Ok(())
    }

    /// Decode and validate a stored configuration
    #[cfg(feature = "serde")]
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ConfigError> {
        let config: Self = postcard::from_bytes(bytes).map_err(|_| ConfigError::Deserialize)?;
        config.validate()?;
        Ok(config)
    }

    /// Encode into `buf`, returning the used prefix
    #[cfg(feature = "serde")]
    pub fn to_slice<'a>(&self, buf: &'a mut [u8]) -> Result<&'a mut [u8], ConfigError> {
        postcard::to_slice(self, buf).map_err(|_| ConfigError::Serialize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_boot_defaults() {
        let config = ThcConfig::default();
        assert_eq!(config.setpoint.target, 3);
        assert_eq!(config.setpoint.hysteresis, 1);
        assert!(!config.engaged);
        assert_eq!(config.adc_channel, 3);
        assert_eq!(config.tick.control_interval_us(), 1000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_setpoint_pack() {
        let sp = ControlSetpoint {
            target: 1023,
            hysteresis: 7,
        };
        assert_eq!(ControlSetpoint::unpack(sp.pack()), sp);
    }

    #[test]
    fn test_rejects_out_of_range_setpoint() {
        let mut config = ThcConfig::default();
        config.setpoint.target = 1024;
        assert_eq!(config.validate(), Err(ConfigError::SetpointOutOfRange));
    }

    #[test]
    fn test_rejects_step_longer_than_tick() {
        let tick = TickConfig {
            tick_period_us: 20,
            ..Default::default()
        };
        assert_eq!(tick.validate(), Err(ConfigError::TickTooShort));

        let tick = TickConfig {
            control_divisor: 0,
            ..Default::default()
        };
        assert_eq!(tick.validate(), Err(ConfigError::InvalidDivisor));
    }

    #[test]
    fn test_rejects_overflowing_timing() {
        let tick = TickConfig {
            step_pulse_us: u32::MAX,
            dir_setup_us: 10,
            ..Default::default()
        };
        assert_eq!(tick.validate(), Err(ConfigError::TickTooShort));

        let tick = TickConfig {
            tick_period_us: u32::MAX,
            ..Default::default()
        };
        assert_eq!(tick.validate(), Err(ConfigError::TickTooShort));
        assert_eq!(tick.control_interval_us(), u32::MAX);

        let tick = TickConfig {
            tick_period_us: u32::MAX / 8,
            ..Default::default()
        };
        assert!(tick.validate().is_ok());
    }

    #[test]
    fn test_direction_inversion_follows_axis() {
        let tick = TickConfig {
            dir_invert_mask: 1 << 2,
            ..Default::default()
        };
        assert!(tick.direction_inverted());

        let tick = TickConfig {
            dir_invert_mask: 1 << 0,
            ..Default::default()
        };
        assert!(!tick.direction_inverted());
    }

    #[test]
    fn test_fault_port_builder() {
        let faults = FaultConfig::none().with_port(FaultPort::K, 0x0F, 0x0F);
        assert_eq!(faults.port(FaultPort::K).watch_mask, 0x0F);
        assert_eq!(faults.port(FaultPort::B).watch_mask, 0);
        assert_eq!(*faults.port(FaultPort::J), FaultPortConfig::unused());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_stored_config_roundtrip() {
        let mut config = ThcConfig::default();
        config.setpoint.target = 512;
        config.faults = FaultConfig::none().with_port(FaultPort::J, 0x03, 0x00);

        let mut buf = [0u8; 64];
        let used = config.to_slice(&mut buf).unwrap().len();
        assert_eq!(ThcConfig::from_bytes(&buf[..used]), Ok(config));
        assert_eq!(ThcConfig::from_bytes(&[0xFF]), Err(ConfigError::Deserialize));
    }
}
