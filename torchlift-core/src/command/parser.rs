//! Command line tokenizer
//!
//! Turns one received line into a typed [`Command`]. Every read goes
//! through the cursor, so short or malformed lines produce an error
//! instead of reading past the end of the buffer.
//!
//! | Line              | Command                   |
//! |-------------------|---------------------------|
//! | `$THC-`           | controller status         |
//! | `$THC=<n>`        | set target voltage        |
//! | `$THCH=<n>`       | set hysteresis            |
//! | `$THC1` / `$THC0` | engage / disengage        |
//! | `$133`            | report target setting     |
//! | `$IOP<n>M<m>`     | set pin mode              |
//! | `$IOP<n>S<s>`     | drive pin                 |
//! | `$IOP<n>R`        | read pin                  |
//! | `$WFP<n>S<s>`     | wait for pin level        |
//! | `$FLT`            | fault monitor status      |
//! | `$REARM=<p><b>`   | re-arm fault line         |
//! | `~`               | restore movement          |

use torchlift_hal::PinMode;

use super::pins::{is_reserved, MAX_PIN};
use crate::config::MAX_READING;
use crate::safety::{FaultPort, FaultSource};

/// Longest number accepted in any field
const MAX_DIGITS: usize = 5;

/// Parsed operator command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Command {
    /// Report controller status
    ThcStatus,
    /// Set the target voltage
    SetTarget(u16),
    /// Set the hysteresis band
    SetHysteresis(u16),
    /// Engage or disengage height control
    Engage(bool),
    /// Report the target as a numbered setting
    ReportSetting,
    /// Configure a general-purpose pin
    PinMode { pin: u8, mode: PinMode },
    /// Drive a general-purpose pin
    PinWrite { pin: u8, high: bool },
    /// Read a general-purpose pin
    PinRead { pin: u8 },
    /// Wait until a pin reaches a level
    WaitForPin { pin: u8, high: bool },
    /// Report fault monitor status
    FaultStatus,
    /// Re-arm one fault line
    Rearm(FaultSource),
    /// Ask the motion engine to resume
    RestoreMovement,
}

/// Errors that can occur while parsing a command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CommandError {
    /// Blank line
    Empty,
    /// Line does not start with a known command
    UnknownCommand,
    /// Expected a number
    MissingValue,
    /// Number too long
    InvalidNumber,
    /// Value outside the accepted range
    OutOfRange,
    /// Pin belongs to the machine wiring
    PinReserved,
    /// Unexpected characters after the command
    TrailingInput,
}

/// Parse one command line
pub fn parse(line: &str) -> Result<Command, CommandError> {
    let mut cursor = Cursor::new(line);
    if cursor.is_empty() {
        return Err(CommandError::Empty);
    }

    let command = if cursor.eat("~") {
        Command::RestoreMovement
    } else if cursor.eat("$THCH=") {
        Command::SetHysteresis(cursor.reading()?)
    } else if cursor.eat("$THC=") {
        Command::SetTarget(cursor.reading()?)
    } else if cursor.eat("$THC-") {
        Command::ThcStatus
    } else if cursor.eat("$THC1") {
        Command::Engage(true)
    } else if cursor.eat("$THC0") {
        Command::Engage(false)
    } else if cursor.eat("$133") {
        Command::ReportSetting
    } else if cursor.eat("$IOP") {
        parse_pin_command(&mut cursor)?
    } else if cursor.eat("$WFP") {
        let pin = cursor.pin()?;
        cursor.expect('S')?;
        Command::WaitForPin {
            pin,
            high: cursor.level()?,
        }
    } else if cursor.eat("$FLT") {
        Command::FaultStatus
    } else if cursor.eat("$REARM=") {
        Command::Rearm(cursor.fault_source()?)
    } else {
        return Err(CommandError::UnknownCommand);
    };

    cursor.finish()?;
    Ok(command)
}

fn parse_pin_command(cursor: &mut Cursor<'_>) -> Result<Command, CommandError> {
    let pin = cursor.pin()?;
    if is_reserved(pin) {
        return Err(CommandError::PinReserved);
    }

    if cursor.eat("M") {
        let code = cursor.number()?;
        let mode = u8::try_from(code)
            .ok()
            .and_then(PinMode::from_code)
            .ok_or(CommandError::OutOfRange)?;
        Ok(Command::PinMode { pin, mode })
    } else if cursor.eat("S") {
        Ok(Command::PinWrite {
            pin,
            high: cursor.level()?,
        })
    } else if cursor.eat("R") {
        Ok(Command::PinRead { pin })
    } else {
        Err(CommandError::UnknownCommand)
    }
}

/// Bounds-checked reader over one line
struct Cursor<'a> {
    rest: &'a str,
}

impl<'a> Cursor<'a> {
    fn new(line: &'a str) -> Self {
        Self { rest: line.trim() }
    }

    fn is_empty(&self) -> bool {
        self.rest.is_empty()
    }

    /// Consume `token` if the line continues with it (ASCII case-insensitive)
    fn eat(&mut self, token: &str) -> bool {
        match self.rest.get(..token.len()) {
            Some(head) if head.eq_ignore_ascii_case(token) => {
                self.rest = &self.rest[token.len()..];
                true
            }
            _ => false,
        }
    }

    fn expect(&mut self, c: char) -> Result<(), CommandError> {
        let mut buf = [0u8; 4];
        if self.eat(c.encode_utf8(&mut buf)) {
            Ok(())
        } else {
            Err(CommandError::UnknownCommand)
        }
    }

    fn number(&mut self) -> Result<u32, CommandError> {
        let len = self
            .rest
            .bytes()
            .take_while(u8::is_ascii_digit)
            .count();
        if len == 0 {
            return Err(CommandError::MissingValue);
        }
        if len > MAX_DIGITS {
            return Err(CommandError::InvalidNumber);
        }

        let (digits, rest) = self.rest.split_at(len);
        self.rest = rest;
        digits.parse().map_err(|_| CommandError::InvalidNumber)
    }

    /// Converter-range value (target, hysteresis)
    fn reading(&mut self) -> Result<u16, CommandError> {
        let value = self.number()?;
        u16::try_from(value)
            .ok()
            .filter(|v| *v <= MAX_READING)
            .ok_or(CommandError::OutOfRange)
    }

    fn pin(&mut self) -> Result<u8, CommandError> {
        let value = self.number()?;
        u8::try_from(value)
            .ok()
            .filter(|p| *p <= MAX_PIN)
            .ok_or(CommandError::OutOfRange)
    }

    fn level(&mut self) -> Result<bool, CommandError> {
        match self.number()? {
            0 => Ok(false),
            1 => Ok(true),
            _ => Err(CommandError::OutOfRange),
        }
    }

    fn fault_source(&mut self) -> Result<FaultSource, CommandError> {
        let port = self
            .rest
            .chars()
            .next()
            .and_then(FaultPort::from_letter)
            .ok_or(CommandError::OutOfRange)?;
        self.rest = &self.rest[1..];

        let bit = u8::try_from(self.number()?).map_err(|_| CommandError::OutOfRange)?;
        FaultSource::new(port, bit).ok_or(CommandError::OutOfRange)
    }

    fn finish(&self) -> Result<(), CommandError> {
        if self.rest.is_empty() {
            Ok(())
        } else {
            Err(CommandError::TrailingInput)
        }
    }
}
