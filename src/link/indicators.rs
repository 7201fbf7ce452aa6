//! Link Status Indicators
//!
//! Two LED outputs derived from link state:
//! - Liveness: toggled each time a listening window opens (heartbeat only)
//! - Degraded: lit while unmatched frames are outstanding
//!
//! Both are recomputed from explicit state on every transition.

use crate::config::MAX_MISSED_WINDOWS;
use crate::types::LedState;

/// Saturating count of consecutive frames that failed validation
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MissCounter {
    count: u8,
    ceiling: u8,
}

impl MissCounter {
    /// Create an empty counter that saturates at `ceiling`
    #[must_use]
    pub const fn new(ceiling: u8) -> Self {
        Self { count: 0, ceiling }
    }

    /// Current count
    #[must_use]
    pub const fn count(&self) -> u8 {
        self.count
    }

    /// Saturation ceiling
    #[must_use]
    pub const fn ceiling(&self) -> u8 {
        self.ceiling
    }

    /// Check if any mismatch is outstanding
    #[must_use]
    pub const fn is_degraded(&self) -> bool {
        self.count > 0
    }

    /// Check if the counter sits at its ceiling
    #[must_use]
    pub const fn is_saturated(&self) -> bool {
        self.count >= self.ceiling
    }

    /// A frame matched the probe
    pub fn record_match(&mut self) {
        self.count = 0;
    }

    /// A frame did not match the probe
    pub fn record_mismatch(&mut self) {
        if self.count < self.ceiling {
            self.count += 1;
        }
    }
}

impl Default for MissCounter {
    fn default() -> Self {
        Self::new(MAX_MISSED_WINDOWS)
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for MissCounter {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "{}/{}", self.count, self.ceiling);
    }
}

/// Snapshot of both status outputs
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct Indicators {
    /// Heartbeat LED
    pub liveness: LedState,
    /// Degraded-link LED
    pub degraded: LedState,
}

impl Indicators {
    /// Derive both outputs from the liveness bit and the miss counter
    #[must_use]
    pub const fn derive(liveness: bool, missed: &MissCounter) -> Self {
        Self {
            liveness: LedState::from_asserted(liveness),
            degraded: LedState::from_asserted(missed.is_degraded()),
        }
    }

    /// Check if the degraded-link alarm is asserted
    #[must_use]
    pub const fn is_degraded(&self) -> bool {
        self.degraded.is_on()
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for Indicators {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "ping={} degraded={}", self.liveness, self.degraded);
    }
}
