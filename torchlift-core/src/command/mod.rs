//! Command layer
//!
//! Operator commands that configure the height controller, poke general
//! purpose pins and acknowledge faults. Runs in the main loop, never in a
//! realtime handler.

pub mod exec;
pub mod parser;
pub mod pins;
pub mod wait;

pub use exec::{CommandContext, FaultAccess, Response};
pub use parser::{parse, Command, CommandError};
pub use pins::{is_reserved, RESERVED_PINS};
pub use wait::{wait_for_pin, WaitOutcome};
