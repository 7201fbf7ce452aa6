//! Probe Payload
//!
//! The fixed byte string both peers send and expect. It travels as the
//! raw radio payload: no header, no length prefix.

use crate::config::{MAX_FRAME_LEN, PROBE_PAYLOAD};

/// Probe payload known to both peers at build time
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Probe(&'static [u8]);

impl Probe {
    /// The configured probe, `"Hello, world!"`
    pub const DEFAULT: Self = Self(PROBE_PAYLOAD);

    /// Create a probe, returns None if empty or larger than a radio frame
    #[must_use]
    pub const fn new(bytes: &'static [u8]) -> Option<Self> {
        if bytes.is_empty() || bytes.len() > MAX_FRAME_LEN {
            None
        } else {
            Some(Self(bytes))
        }
    }

    /// Payload bytes
    #[must_use]
    pub const fn as_bytes(&self) -> &'static [u8] {
        self.0
    }

    /// Payload length in bytes
    #[must_use]
    pub const fn byte_len(&self) -> usize {
        self.0.len()
    }

    /// Check a received frame against this probe
    ///
    /// True only for an exact copy: same length and every byte equal.
    #[must_use]
    pub fn validate(&self, received: &[u8]) -> bool {
        received == self.0
    }
}

impl Default for Probe {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Check a received frame against the default probe
#[must_use]
pub fn validate(received: &[u8]) -> bool {
    Probe::DEFAULT.validate(received)
}
