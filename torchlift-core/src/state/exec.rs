//! Execution request flags
//!
//! Bit layout matches the motion engine's realtime execution word so the
//! two can be merged without translation.

/// Set of realtime execution requests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ExecFlags(u8);

impl ExecFlags {
    /// Resume motion
    pub const CYCLE_START: Self = Self(1 << 1);
    /// Decelerate to a controlled hold
    pub const FEED_HOLD: Self = Self(1 << 3);

    /// No requests
    pub const fn empty() -> Self {
        Self(0)
    }

    /// Construct from raw bits
    pub const fn from_bits(bits: u8) -> Self {
        Self(bits)
    }

    /// Raw bits
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Check if every bit of `other` is set
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Check if no request is pending
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Union of two flag sets
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }
}
