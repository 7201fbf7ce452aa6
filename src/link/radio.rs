//! Radio Command Interface
//!
//! The link issues radio commands through [`RadioLink`] and never waits on
//! them. Completions come back later as [`RadioEvent`]s delivered by the
//! shell that owns the real (or simulated) transceiver.
//!
//! [`RadioRequest`] is the shell-side implementation: it records the most
//! recent command so the event loop can execute it after the callback
//! returns.

use heapless::Vec;

use crate::config::MAX_FRAME_LEN;
use crate::fmt::{trace, warn};
use crate::types::Tick;

/// Radio frame buffer
pub type Frame = Vec<u8, MAX_FRAME_LEN>;

/// Commands the link sends to the transceiver
pub trait RadioLink {
    /// Start sending `payload`; completion is reported as [`RadioEvent::TxDone`]
    fn transmit(&mut self, payload: &[u8]);

    /// Start continuous receive; the first captured frame is reported as
    /// [`RadioEvent::Frame`] and the receiver then stops until re-armed
    fn begin_continuous_receive(&mut self);

    /// Stop any transmit or receive in flight; no effect when idle
    fn abort_current_operation(&mut self);

    /// Monotonic clock
    fn now(&self) -> Tick;
}

/// Operation the transceiver should be performing
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub enum RadioOp {
    /// Standby
    #[default]
    Idle,
    /// Send this frame once
    Transmit(Frame),
    /// Receive until one frame is captured
    Receive,
}

impl RadioOp {
    /// Check if the radio is in standby
    #[must_use]
    pub const fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for RadioOp {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::Idle => defmt::write!(f, "Idle"),
            Self::Transmit(frame) => defmt::write!(f, "Transmit({} bytes)", frame.len()),
            Self::Receive => defmt::write!(f, "Receive"),
        }
    }
}

/// Completion reported by the transceiver
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RadioEvent {
    /// The last transmission left the antenna
    TxDone,
    /// A frame was captured; the receiver is stopped
    Frame(Frame),
}

#[cfg(feature = "embedded")]
impl defmt::Format for RadioEvent {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::TxDone => defmt::write!(f, "TxDone"),
            Self::Frame(frame) => defmt::write!(f, "Frame({} bytes)", frame.len()),
        }
    }
}

/// Radio command slot filled by the link and drained by a shell
#[derive(Clone, Debug, Default)]
pub struct RadioRequest {
    /// Operation the link last asked for
    op: RadioOp,
    /// Command not yet picked up by the shell
    pending: Option<RadioOp>,
    /// Clock reading handed to the link
    now: Tick,
}

impl RadioRequest {
    /// Create an idle request slot with the clock at `now`
    #[must_use]
    pub const fn new(now: Tick) -> Self {
        Self {
            op: RadioOp::Idle,
            pending: None,
            now,
        }
    }

    /// Update the clock the link will read
    pub fn set_now(&mut self, now: Tick) {
        self.now = now;
    }

    /// Operation the link last asked for
    #[must_use]
    pub const fn op(&self) -> &RadioOp {
        &self.op
    }

    /// Check if a command is waiting for the shell
    #[must_use]
    pub const fn has_command(&self) -> bool {
        self.pending.is_some()
    }

    /// Take the latest command issued since the last call
    ///
    /// Several commands in one callback collapse into the last one; an
    /// abort followed by a transmit is just a transmit.
    pub fn take_command(&mut self) -> Option<RadioOp> {
        self.pending.take()
    }

    fn issue(&mut self, op: RadioOp) {
        trace!("radio command issued");
        self.op = op.clone();
        self.pending = Some(op);
    }
}

impl RadioLink for RadioRequest {
    fn transmit(&mut self, payload: &[u8]) {
        match Frame::from_slice(payload) {
            Ok(frame) => self.issue(RadioOp::Transmit(frame)),
            Err(()) => warn!("payload of {} bytes exceeds frame buffer", payload.len()),
        }
    }

    fn begin_continuous_receive(&mut self) {
        self.issue(RadioOp::Receive);
    }

    fn abort_current_operation(&mut self) {
        if !self.op.is_idle() {
            self.issue(RadioOp::Idle);
        }
    }

    fn now(&self) -> Tick {
        self.now
    }
}
