//! Link State Machine
//!
//! Owns the transmit / listen / timeout cycle of one node.
//!
//! ```text
//!            start            TX done
//!   Idle ─────────► Transmitting ─────────► Listening ◄──┐
//!                        ▲                     │   │      │ frame / rx timeout
//!                        └──── tx timer ───────┘   └──────┘
//! ```
//!
//! Every callback runs to completion, issues at most one radio command
//! (abort-then-transmit counts as one) and re-arms timers. Radio and timer
//! collaborators are borrowed per call; the machine owns everything else.

use crate::config::LinkConfig;
use crate::fmt::{debug, info};
use crate::link::indicators::{Indicators, MissCounter};
use crate::link::pacing::TxPacing;
use crate::link::probe::Probe;
use crate::link::radio::{RadioEvent, RadioLink};
use crate::link::timers::Scheduler;
use crate::types::{LinkMode, TimerId};

/// Event delivered to the link by its shell
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LinkEvent {
    /// A named timer elapsed
    Timer(TimerId),
    /// The radio reported a completion
    Radio(RadioEvent),
}

/// Running totals kept for diagnostics
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct LinkStats {
    /// Probes handed to the radio
    pub tx_attempts: u32,
    /// Transmissions the radio reported finished
    pub tx_completions: u32,
    /// Frames captured while listening
    pub frames_received: u32,
    /// Frames equal to the probe
    pub probe_matches: u32,
    /// Frames that differed from the probe
    pub probe_mismatches: u32,
    /// Listening windows that ended without a frame
    pub rx_timeouts: u32,
    /// Events that arrived in a mode that could not use them
    pub stale_events: u32,
}

#[cfg(feature = "embedded")]
impl defmt::Format for LinkStats {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(
            f,
            "tx={}/{} rx={} ok={} bad={} timeouts={}",
            self.tx_completions,
            self.tx_attempts,
            self.frames_received,
            self.probe_matches,
            self.probe_mismatches,
            self.rx_timeouts
        );
    }
}

/// Ping-pong link state for one node
#[derive(Debug)]
pub struct LinkStateMachine {
    /// Current radio intent
    mode: LinkMode,
    /// Consecutive unmatched frames
    missed: MissCounter,
    /// Heartbeat bit, flipped at each listening window
    liveness: bool,
    /// Set by a transmit attempt, cleared by its TX done
    awaiting_tx_done: bool,
    probe: Probe,
    pacing: TxPacing,
    stats: LinkStats,
}

impl LinkStateMachine {
    /// Create an idle link that sends the default probe
    #[must_use]
    pub fn new(config: &LinkConfig) -> Self {
        Self::with_probe(config, Probe::DEFAULT)
    }

    /// Create an idle link that sends `probe`
    #[must_use]
    pub fn with_probe(config: &LinkConfig, probe: Probe) -> Self {
        Self {
            mode: LinkMode::Idle,
            missed: MissCounter::new(config.max_missed_windows()),
            liveness: false,
            awaiting_tx_done: false,
            probe,
            pacing: TxPacing::new(config),
            stats: LinkStats::default(),
        }
    }

    /// Current mode
    #[must_use]
    pub const fn mode(&self) -> LinkMode {
        self.mode
    }

    /// Consecutive unmatched frames (saturating)
    #[must_use]
    pub const fn missed_windows(&self) -> u8 {
        self.missed.count()
    }

    /// Liveness bit
    #[must_use]
    pub const fn liveness(&self) -> bool {
        self.liveness
    }

    /// Current LED outputs
    #[must_use]
    pub const fn indicators(&self) -> Indicators {
        Indicators::derive(self.liveness, &self.missed)
    }

    /// Diagnostic counters
    #[must_use]
    pub const fn stats(&self) -> LinkStats {
        self.stats
    }

    /// Probe this link sends and expects
    #[must_use]
    pub const fn probe(&self) -> Probe {
        self.probe
    }

    /// Host entry point; same as [`Self::start_periodic_transmit`]
    pub fn start<R: RadioLink, S: Scheduler>(&mut self, radio: &R, timers: &mut S) {
        self.start_periodic_transmit(radio, timers);
    }

    /// Arm the first transmit attempt with zero delay
    ///
    /// Called once at startup; the cycle keeps itself going afterwards.
    pub fn start_periodic_transmit<R: RadioLink, S: Scheduler>(&mut self, radio: &R, timers: &mut S) {
        info!("Starting");
        timers.schedule_at(TimerId::Transmit, radio.now());
    }

    /// Dispatch an event to its handler
    pub fn handle<R: RadioLink, S: Scheduler>(&mut self, event: &LinkEvent, radio: &mut R, timers: &mut S) {
        match event {
            LinkEvent::Timer(timer) => self.on_timer(*timer, radio, timers),
            LinkEvent::Radio(RadioEvent::TxDone) => self.on_transmit_complete(radio, timers),
            LinkEvent::Radio(RadioEvent::Frame(frame)) => self.on_frame_received(frame, radio, timers),
        }
    }

    /// Dispatch an elapsed timer to its handler
    pub fn on_timer<R: RadioLink, S: Scheduler>(&mut self, timer: TimerId, radio: &mut R, timers: &mut S) {
        match timer {
            TimerId::Transmit => self.on_transmit_attempt(radio, timers),
            TimerId::ReceiveTimeout => self.on_receive_timeout(),
        }
    }

    /// Periodic transmit timer fired
    ///
    /// The timer is re-armed before anything can fail, so a radio that
    /// never reports TX done still gets a fresh attempt every period.
    pub fn on_transmit_attempt<R: RadioLink, S: Scheduler>(&mut self, radio: &mut R, timers: &mut S) {
        radio.abort_current_operation();
        radio.transmit(self.probe.as_bytes());
        self.mode = LinkMode::Transmitting;

        let next = self.pacing.next_transmit(radio.now());
        timers.schedule_at(TimerId::Transmit, next);

        self.awaiting_tx_done = true;
        self.stats.tx_attempts = self.stats.tx_attempts.saturating_add(1);
        info!("TX");
    }

    /// Radio finished sending the probe
    pub fn on_transmit_complete<R: RadioLink, S: Scheduler>(&mut self, radio: &mut R, timers: &mut S) {
        if !self.awaiting_tx_done || !self.mode.is_transmitting() {
            self.stale("tx done");
            return;
        }
        self.awaiting_tx_done = false;
        self.stats.tx_completions = self.stats.tx_completions.saturating_add(1);
        self.enter_listening(radio, timers);
    }

    /// Open a listening window
    ///
    /// Flips the liveness bit, starts continuous receive and arms the
    /// receive timeout `rx_timeout_periods` intervals out.
    pub fn enter_listening<R: RadioLink, S: Scheduler>(&mut self, radio: &mut R, timers: &mut S) {
        self.liveness = !self.liveness;
        self.mode = LinkMode::Listening;
        radio.begin_continuous_receive();
        timers.schedule_at(TimerId::ReceiveTimeout, self.pacing.receive_deadline(radio.now()));
        info!("RX");
    }

    /// Listening window ended without a frame
    ///
    /// Diagnostic only: silence does not touch the miss counter.
    pub fn on_receive_timeout(&mut self) {
        if !self.mode.is_listening() {
            self.stale("rx timeout");
            return;
        }
        self.stats.rx_timeouts = self.stats.rx_timeouts.saturating_add(1);
        info!("rx timeout");
    }

    /// Radio captured a frame while listening
    pub fn on_frame_received<R: RadioLink, S: Scheduler>(&mut self, frame: &[u8], radio: &mut R, timers: &mut S) {
        if !self.mode.is_listening() {
            self.stale("frame");
            return;
        }
        let now = radio.now();
        timers.schedule_at(TimerId::ReceiveTimeout, self.pacing.receive_deadline(now));
        // Half-interval re-pace puts this node out of phase with the sender
        timers.schedule_at(TimerId::Transmit, self.pacing.repaced_transmit(now));

        let matched = self.probe.validate(frame);
        if matched {
            self.missed.record_match();
            self.stats.probe_matches = self.stats.probe_matches.saturating_add(1);
        } else {
            self.missed.record_mismatch();
            self.stats.probe_mismatches = self.stats.probe_mismatches.saturating_add(1);
        }
        self.stats.frames_received = self.stats.frames_received.saturating_add(1);
        info!(
            "Got {} bytes, match={}, missed={}",
            frame.len(),
            matched,
            self.missed.count()
        );

        self.enter_listening(radio, timers);
    }

    fn stale(&mut self, what: &'static str) {
        self.stats.stale_events = self.stats.stale_events.saturating_add(1);
        debug!("ignoring stale {}", what);
    }
}
