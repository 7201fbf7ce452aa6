//! Shared types used across the ping-pong firmware
//!
//! This module defines domain-specific types that enforce invariants
//! at compile time and provide type safety throughout the codebase.

use core::fmt;

/// Monotonic clock reading in milliseconds
///
/// The link core never reads a clock itself; shells convert their own
/// time base (embassy `Instant`, simulator clock) into ticks.
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Tick(u64);

impl Tick {
    /// Clock origin
    pub const ZERO: Self = Self(0);

    /// Create a tick from milliseconds since the clock origin
    #[must_use]
    pub const fn from_millis(ms: u64) -> Self {
        Self(ms)
    }

    /// Milliseconds since the clock origin
    #[must_use]
    pub const fn as_millis(self) -> u64 {
        self.0
    }

    /// Tick `ms` milliseconds later (saturating)
    #[must_use]
    pub const fn after_ms(self, ms: u32) -> Self {
        Self(self.0.saturating_add(ms as u64))
    }

    /// Milliseconds elapsed since `earlier`, zero if `earlier` is later
    #[must_use]
    pub const fn ms_since(self, earlier: Self) -> u64 {
        self.0.saturating_sub(earlier.0)
    }
}

impl fmt::Debug for Tick {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Tick({} ms)", self.0)
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for Tick {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "{}ms", self.0);
    }
}

/// Current radio intent of the link
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum LinkMode {
    /// Not started
    #[default]
    Idle,
    /// Probe handed to the radio, waiting for TX done
    Transmitting,
    /// Receive window open
    Listening,
}

impl LinkMode {
    /// Check if a receive window is open
    #[must_use]
    pub const fn is_listening(self) -> bool {
        matches!(self, Self::Listening)
    }

    /// Check if a transmission is in progress
    #[must_use]
    pub const fn is_transmitting(self) -> bool {
        matches!(self, Self::Transmitting)
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for LinkMode {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::Idle => defmt::write!(f, "IDLE"),
            Self::Transmitting => defmt::write!(f, "TX"),
            Self::Listening => defmt::write!(f, "RX"),
        }
    }
}

/// Named timer slots; arming a name twice replaces the first deadline
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TimerId {
    /// Periodic probe transmission
    Transmit,
    /// End of the current listening window
    ReceiveTimeout,
}

impl TimerId {
    /// Number of timer slots
    pub const COUNT: usize = 2;

    /// All timers in slot order
    pub const ALL: [Self; Self::COUNT] = [Self::Transmit, Self::ReceiveTimeout];

    /// Slot index of this timer
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Transmit => 0,
            Self::ReceiveTimeout => 1,
        }
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for TimerId {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::Transmit => defmt::write!(f, "tx"),
            Self::ReceiveTimeout => defmt::write!(f, "rx-timeout"),
        }
    }
}

/// Status LED state
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum LedState {
    /// LED is off
    #[default]
    Off,
    /// LED is on
    On,
}

impl LedState {
    /// LED state for an asserted/deasserted signal
    #[must_use]
    pub const fn from_asserted(asserted: bool) -> Self {
        if asserted {
            Self::On
        } else {
            Self::Off
        }
    }

    /// Toggle the LED state
    #[must_use]
    pub const fn toggle(self) -> Self {
        match self {
            Self::Off => Self::On,
            Self::On => Self::Off,
        }
    }

    /// Check if the LED is lit
    #[must_use]
    pub const fn is_on(self) -> bool {
        matches!(self, Self::On)
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for LedState {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::Off => defmt::write!(f, "OFF"),
            Self::On => defmt::write!(f, "ON"),
        }
    }
}
