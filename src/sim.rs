//! Two-node host simulator
//!
//! Runs two [`LinkStateMachine`]s against a shared simulated channel on a
//! virtual millisecond clock. Each node has its own timer table and radio
//! request slot, exactly as on target; only the transceiver is replaced.
//!
//! The channel is half duplex: a frame reaches a peer only if that peer was
//! already receiving when the transmission started and still is when it
//! ends. Transmissions that overlap in time collide and are both lost.
//! Faults can be queued to drop, corrupt or truncate upcoming deliveries.
//!
//! Events are processed one at a time. At equal times, transmissions that
//! finish are handled before timers, and node 0 before node 1.

use std::collections::VecDeque;

use crate::config::LinkConfig;
use crate::link::radio::{Frame, RadioEvent, RadioOp, RadioRequest};
use crate::link::state::{LinkEvent, LinkStateMachine};
use crate::link::timers::TimerTable;
use crate::types::Tick;

/// Default on-air time of one probe (13 bytes at SF9/125 kHz is ~190 ms)
pub const DEFAULT_AIRTIME_MS: u32 = 190;

/// Fault applied to the next frame delivered to a listening node
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SimFault {
    /// Frame never arrives
    Drop,
    /// Last byte flipped
    Corrupt,
    /// Last byte removed
    Truncate,
}

/// Channel counters
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SimAirStats {
    /// Frames handed to a listening node
    pub delivered: usize,
    /// Frames nobody was listening for, or dropped by a fault
    pub lost: usize,
    /// Frames lost to overlapping transmissions
    pub collided: usize,
    /// Frames altered by a fault
    pub altered: usize,
}

#[derive(Clone, Debug)]
struct Transmission {
    from: usize,
    frame: Frame,
    started_at: Tick,
    done_at: Tick,
    collided: bool,
}

/// Shared simulated channel
#[derive(Clone, Debug)]
pub struct SimAir {
    airtime_ms: u32,
    in_flight: Vec<Transmission>,
    faults: VecDeque<SimFault>,
    stats: SimAirStats,
}

impl SimAir {
    /// Create an empty channel where each frame takes `airtime_ms`
    #[must_use]
    pub fn new(airtime_ms: u32) -> Self {
        Self {
            airtime_ms,
            in_flight: Vec::new(),
            faults: VecDeque::new(),
            stats: SimAirStats::default(),
        }
    }

    /// Queue a fault for an upcoming delivery
    pub fn inject(&mut self, fault: SimFault) {
        self.faults.push_back(fault);
    }

    /// Faults not yet applied
    #[must_use]
    pub fn pending_faults(&self) -> usize {
        self.faults.len()
    }

    /// Channel counters
    #[must_use]
    pub const fn stats(&self) -> SimAirStats {
        self.stats
    }

    fn start(&mut self, from: usize, frame: Frame, now: Tick) {
        self.cancel(from);
        // Anything still on air overlaps the new frame
        let collided = !self.in_flight.is_empty();
        for other in &mut self.in_flight {
            other.collided = true;
        }
        self.in_flight.push(Transmission {
            from,
            frame,
            started_at: now,
            done_at: now.after_ms(self.airtime_ms),
            collided,
        });
    }

    fn cancel(&mut self, from: usize) {
        self.in_flight.retain(|tx| tx.from != from);
    }

    fn next_done(&self) -> Option<Tick> {
        self.in_flight.iter().map(|tx| tx.done_at).min()
    }

    fn pop_done(&mut self, now: Tick) -> Option<Transmission> {
        let pos = self
            .in_flight
            .iter()
            .enumerate()
            .filter(|(_, tx)| tx.done_at <= now)
            .min_by_key(|(_, tx)| (tx.done_at, tx.from))
            .map(|(pos, _)| pos)?;
        Some(self.in_flight.remove(pos))
    }

    /// Apply the next queued fault; `None` means the frame is lost
    fn deliver(&mut self, mut frame: Frame) -> Option<Frame> {
        match self.faults.pop_front() {
            None => {}
            Some(SimFault::Drop) => {
                self.stats.lost += 1;
                return None;
            }
            Some(SimFault::Corrupt) => {
                if let Some(last) = frame.last_mut() {
                    *last ^= 0xFF;
                }
                self.stats.altered += 1;
            }
            Some(SimFault::Truncate) => {
                frame.pop();
                self.stats.altered += 1;
            }
        }
        self.stats.delivered += 1;
        Some(frame)
    }
}

impl Default for SimAir {
    fn default() -> Self {
        Self::new(DEFAULT_AIRTIME_MS)
    }
}

/// One simulated node
#[derive(Debug)]
pub struct SimNode {
    link: LinkStateMachine,
    timers: TimerTable,
    request: RadioRequest,
    active: RadioOp,
    /// When the current receive began
    receiving_since: Option<Tick>,
}

impl SimNode {
    /// Create an idle node
    #[must_use]
    pub fn new(config: &LinkConfig) -> Self {
        Self {
            link: LinkStateMachine::new(config),
            timers: TimerTable::new(),
            request: RadioRequest::new(Tick::ZERO),
            active: RadioOp::Idle,
            receiving_since: None,
        }
    }

    /// Link state
    #[must_use]
    pub const fn link(&self) -> &LinkStateMachine {
        &self.link
    }

    /// Armed timers
    #[must_use]
    pub const fn timers(&self) -> &TimerTable {
        &self.timers
    }

    /// Operation the simulated transceiver is performing
    #[must_use]
    pub const fn active(&self) -> &RadioOp {
        &self.active
    }

    /// Check if this node has been receiving since `at` without a break
    fn heard_from(&self, at: Tick) -> bool {
        self.receiving_since.is_some_and(|since| since <= at)
    }

    fn set_active(&mut self, op: RadioOp, now: Tick) {
        self.receiving_since = match op {
            RadioOp::Receive => Some(now),
            RadioOp::Idle | RadioOp::Transmit(_) => None,
        };
        self.active = op;
    }

    fn dispatch(&mut self, event: &LinkEvent, now: Tick) {
        self.request.set_now(now);
        self.link.handle(event, &mut self.request, &mut self.timers);
    }

    /// Move the latest radio command onto the channel
    fn apply_command(&mut self, index: usize, air: &mut SimAir, now: Tick) {
        let Some(op) = self.request.take_command() else {
            return;
        };
        match &op {
            RadioOp::Transmit(frame) => air.start(index, frame.clone(), now),
            RadioOp::Receive | RadioOp::Idle => air.cancel(index),
        }
        self.set_active(op, now);
    }
}

/// Two nodes on one channel
#[derive(Debug)]
pub struct PairSim {
    now: Tick,
    air: SimAir,
    nodes: [SimNode; 2],
}

impl PairSim {
    /// Create two idle nodes with their own configurations
    #[must_use]
    pub fn new(a: &LinkConfig, b: &LinkConfig) -> Self {
        Self::with_air(a, b, SimAir::default())
    }

    /// Create two idle nodes on a prepared channel
    #[must_use]
    pub fn with_air(a: &LinkConfig, b: &LinkConfig, air: SimAir) -> Self {
        Self {
            now: Tick::ZERO,
            air,
            nodes: [SimNode::new(a), SimNode::new(b)],
        }
    }

    /// Current virtual time
    #[must_use]
    pub const fn now(&self) -> Tick {
        self.now
    }

    /// Node 0 or 1
    ///
    /// # Panics
    ///
    /// Panics if `index` is not 0 or 1.
    #[must_use]
    pub fn node(&self, index: usize) -> &SimNode {
        &self.nodes[index]
    }

    /// Shared channel
    pub fn air(&mut self) -> &mut SimAir {
        &mut self.air
    }

    /// Start both nodes at the current time
    pub fn start(&mut self) {
        for node in &mut self.nodes {
            node.request.set_now(self.now);
            node.link.start(&node.request, &mut node.timers);
        }
    }

    /// Start only one node, leaving its peer idle
    pub fn start_node(&mut self, index: usize) {
        let node = &mut self.nodes[index];
        node.request.set_now(self.now);
        node.link.start(&node.request, &mut node.timers);
    }

    /// Time of the next event, if any
    #[must_use]
    pub fn next_event_at(&self) -> Option<Tick> {
        let timers = self.nodes.iter().filter_map(|node| node.timers.next_deadline());
        timers.chain(self.air.next_done()).min()
    }

    /// Process the next event, advancing the clock to it
    ///
    /// Returns false when no event is pending.
    pub fn step(&mut self) -> bool {
        let Some(at) = self.next_event_at() else {
            return false;
        };
        self.now = self.now.max(at);
        let now = self.now;

        if let Some(tx) = self.air.pop_done(now) {
            self.finish_transmission(tx);
            return true;
        }

        for index in 0..self.nodes.len() {
            let node = &mut self.nodes[index];
            if let Some(id) = node.timers.pop_due(now) {
                node.dispatch(&LinkEvent::Timer(id), now);
                node.apply_command(index, &mut self.air, now);
                return true;
            }
        }
        false
    }

    /// Process events until the clock would pass `end`
    pub fn run_until(&mut self, end: Tick) {
        while self.next_event_at().is_some_and(|at| at <= end) {
            if !self.step() {
                break;
            }
        }
        self.now = self.now.max(end);
    }

    /// Process events for `ms` more milliseconds
    pub fn run_for(&mut self, ms: u32) {
        let end = self.now.after_ms(ms);
        self.run_until(end);
    }

    fn finish_transmission(&mut self, tx: Transmission) {
        let now = self.now;

        let sender = &mut self.nodes[tx.from];
        sender.set_active(RadioOp::Idle, now);
        sender.dispatch(&LinkEvent::Radio(RadioEvent::TxDone), now);
        sender.apply_command(tx.from, &mut self.air, now);

        if tx.collided {
            self.air.stats.collided += 1;
            return;
        }
        let peer = 1 - tx.from;
        if !self.nodes[peer].heard_from(tx.started_at) {
            self.air.stats.lost += 1;
            return;
        }
        let Some(frame) = self.air.deliver(tx.frame) else {
            return;
        };
        let receiver = &mut self.nodes[peer];
        receiver.set_active(RadioOp::Idle, now);
        receiver.dispatch(&LinkEvent::Radio(RadioEvent::Frame(frame)), now);
        receiver.apply_command(peer, &mut self.air, now);
    }
}
