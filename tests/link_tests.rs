//! Link State Machine Tests
//!
//! Drives one `LinkStateMachine` with a recording radio and a real timer
//! table, checking the transmit / listen / timeout cycle.
//! Run with: cargo test --no-default-features --features std --test link_tests

use pingpong_firmware::prelude::*;

// =============================================================================
// Test Harness
// =============================================================================

#[derive(Clone, Debug, PartialEq, Eq)]
enum Call {
    Abort,
    Transmit(Vec<u8>),
    Receive,
}

/// Radio that records every command it is given
#[derive(Default)]
struct RecordingRadio {
    now: Tick,
    calls: Vec<Call>,
}

impl RadioLink for RecordingRadio {
    fn transmit(&mut self, payload: &[u8]) {
        self.calls.push(Call::Transmit(payload.to_vec()));
    }

    fn begin_continuous_receive(&mut self) {
        self.calls.push(Call::Receive);
    }

    fn abort_current_operation(&mut self) {
        self.calls.push(Call::Abort);
    }

    fn now(&self) -> Tick {
        self.now
    }
}

struct Harness {
    link: LinkStateMachine,
    radio: RecordingRadio,
    timers: TimerTable,
}

impl Harness {
    fn new(config: &LinkConfig) -> Self {
        Self {
            link: LinkStateMachine::new(config),
            radio: RecordingRadio::default(),
            timers: TimerTable::new(),
        }
    }

    fn default_config() -> Self {
        Self::new(&LinkConfig::DEFAULT)
    }

    fn no_jitter() -> Self {
        Self::new(&LinkConfig::new(TX_INTERVAL_MS, 0, RX_TIMEOUT_PERIODS, MAX_MISSED_WINDOWS).unwrap())
    }

    fn at(&mut self, ms: u64) -> &mut Self {
        self.radio.now = Tick::from_millis(ms);
        self
    }

    fn start(&mut self) {
        self.link.start(&self.radio, &mut self.timers);
    }

    fn event(&mut self, event: LinkEvent) {
        self.link.handle(&event, &mut self.radio, &mut self.timers);
    }

    fn fire_transmit(&mut self) {
        self.event(LinkEvent::Timer(TimerId::Transmit));
    }

    fn fire_rx_timeout(&mut self) {
        self.event(LinkEvent::Timer(TimerId::ReceiveTimeout));
    }

    fn tx_done(&mut self) {
        self.event(LinkEvent::Radio(RadioEvent::TxDone));
    }

    fn frame(&mut self, bytes: &[u8]) {
        let frame = Frame::from_slice(bytes).unwrap();
        self.event(LinkEvent::Radio(RadioEvent::Frame(frame)));
    }

    /// Start, transmit at `t` and finish the transmission at `t + 100`
    fn listening_at(&mut self, t: u64) {
        self.at(t).fire_transmit();
        self.at(t + 100).tx_done();
        self.radio.calls.clear();
    }

    fn deadline(&self, timer: TimerId) -> Option<u64> {
        self.timers.deadline(timer).map(Tick::as_millis)
    }
}

// =============================================================================
// Startup Tests
// =============================================================================

#[test]
fn test_new_link_idle() {
    let h = Harness::default_config();
    assert_eq!(h.link.mode(), LinkMode::Idle);
    assert_eq!(h.link.missed_windows(), 0);
    assert!(!h.link.liveness());
    assert_eq!(h.link.indicators(), Indicators::default());
    assert_eq!(h.link.probe(), Probe::DEFAULT);
}

#[test]
fn test_start_arms_transmit_immediately() {
    let mut h = Harness::default_config();
    h.at(1_234).start();
    assert_eq!(h.deadline(TimerId::Transmit), Some(1_234));
    assert!(!h.timers.is_armed(TimerId::ReceiveTimeout));
    assert!(h.radio.calls.is_empty());
    assert_eq!(h.link.mode(), LinkMode::Idle);
}

#[test]
fn test_start_then_fire_transmits() {
    let mut h = Harness::default_config();
    h.start();
    let id = h.timers.pop_due(Tick::ZERO).unwrap();
    h.link.on_timer(id, &mut h.radio, &mut h.timers);
    assert_eq!(h.link.mode(), LinkMode::Transmitting);
}

// =============================================================================
// Transmit Attempt Tests
// =============================================================================

#[test]
fn test_transmit_aborts_then_sends_probe() {
    let mut h = Harness::default_config();
    h.at(0).fire_transmit();
    assert_eq!(h.radio.calls, vec![Call::Abort, Call::Transmit(b"Hello, world!".to_vec())]);
    assert_eq!(h.link.mode(), LinkMode::Transmitting);
}

#[test]
fn test_transmit_rearms_with_jitter() {
    let mut h = Harness::default_config();
    h.at(10_000).fire_transmit();
    let next = h.deadline(TimerId::Transmit).unwrap();
    assert!((12_000..12_500).contains(&next), "next transmit at {next}");
}

#[test]
fn test_transmit_without_jitter_exact_period() {
    let mut h = Harness::no_jitter();
    h.at(500).fire_transmit();
    assert_eq!(h.deadline(TimerId::Transmit), Some(2_500));
}

#[test]
fn test_jitter_range_across_attempts() {
    let mut h = Harness::default_config();
    let mut delays = Vec::new();
    let mut now = 0;
    for _ in 0..200 {
        h.at(now).fire_transmit();
        let next = h.deadline(TimerId::Transmit).unwrap();
        let delay = next - now;
        assert!((2_000..2_500).contains(&delay), "delay {delay}");
        delays.push(delay);
        now = next;
    }
    delays.sort_unstable();
    delays.dedup();
    assert!(delays.len() > 50, "jitter should vary, got {} distinct", delays.len());
}

#[test]
fn test_distinct_seeds_desynchronize() {
    let mut a = Harness::new(&LinkConfig::DEFAULT.with_seed(seed_from_device_id(&[1; 12])));
    let mut b = Harness::new(&LinkConfig::DEFAULT.with_seed(seed_from_device_id(&[2; 12])));
    let mut diverged = false;
    let mut now = 0;
    for _ in 0..8 {
        a.at(now).fire_transmit();
        b.at(now).fire_transmit();
        diverged |= a.deadline(TimerId::Transmit) != b.deadline(TimerId::Transmit);
        now += 3_000;
    }
    assert!(diverged);
}

#[test]
fn test_same_seed_stays_in_phase() {
    let mut a = Harness::default_config();
    let mut b = Harness::default_config();
    for k in 0..8 {
        a.at(k * 3_000).fire_transmit();
        b.at(k * 3_000).fire_transmit();
        assert_eq!(a.deadline(TimerId::Transmit), b.deadline(TimerId::Transmit));
    }
}

#[test]
fn test_transmit_rearmed_without_tx_done() {
    let mut h = Harness::no_jitter();
    h.at(0).fire_transmit();
    h.at(2_000).fire_transmit();
    assert_eq!(h.deadline(TimerId::Transmit), Some(4_000));
    assert_eq!(h.link.mode(), LinkMode::Transmitting);
    assert_eq!(h.link.stats().tx_attempts, 2);
    assert_eq!(h.link.stats().tx_completions, 0);
}

#[test]
fn test_transmit_from_listening_aborts_receive() {
    let mut h = Harness::no_jitter();
    h.listening_at(0);
    h.at(2_000).fire_transmit();
    assert_eq!(h.radio.calls[0], Call::Abort);
    assert_eq!(h.link.mode(), LinkMode::Transmitting);
}

// =============================================================================
// Transmit Complete Tests
// =============================================================================

#[test]
fn test_tx_done_enters_listening() {
    let mut h = Harness::default_config();
    h.at(0).fire_transmit();
    h.radio.calls.clear();
    h.at(190).tx_done();

    assert_eq!(h.link.mode(), LinkMode::Listening);
    assert_eq!(h.radio.calls, vec![Call::Receive]);
    assert_eq!(h.deadline(TimerId::ReceiveTimeout), Some(190 + 6_000));
    assert!(h.link.liveness());
}

#[test]
fn test_tx_done_keeps_transmit_timer() {
    let mut h = Harness::no_jitter();
    h.at(0).fire_transmit();
    h.at(190).tx_done();
    assert_eq!(h.deadline(TimerId::Transmit), Some(2_000));
}

#[test]
fn test_tx_done_while_listening_ignored() {
    let mut h = Harness::default_config();
    h.listening_at(0);
    let liveness = h.link.liveness();
    let timeout = h.deadline(TimerId::ReceiveTimeout);

    h.at(500).tx_done();

    assert!(h.radio.calls.is_empty());
    assert_eq!(h.link.liveness(), liveness);
    assert_eq!(h.deadline(TimerId::ReceiveTimeout), timeout);
    assert_eq!(h.link.stats().stale_events, 1);
}

#[test]
fn test_duplicate_tx_done_ignored() {
    let mut h = Harness::default_config();
    h.at(0).fire_transmit();
    h.at(100).tx_done();
    h.at(110).tx_done();
    assert_eq!(h.link.stats().tx_completions, 1);
    assert_eq!(h.link.stats().stale_events, 1);
}

#[test]
fn test_tx_done_before_start_ignored() {
    let mut h = Harness::default_config();
    h.tx_done();
    assert_eq!(h.link.mode(), LinkMode::Idle);
    assert!(h.radio.calls.is_empty());
}

// =============================================================================
// Frame Reception Tests
// =============================================================================

#[test]
fn test_matching_frame_clears_counter() {
    let mut h = Harness::default_config();
    h.listening_at(0);
    h.at(500).frame(b"Hello, world");
    h.at(900).frame(b"Hello, world");
    assert_eq!(h.link.missed_windows(), 2);

    h.at(1_200).frame(b"Hello, world!");
    assert_eq!(h.link.missed_windows(), 0);
    assert!(!h.link.indicators().is_degraded());
}

#[test]
fn test_truncated_frame_counts_miss() {
    let mut h = Harness::default_config();
    h.listening_at(0);
    h.at(500).frame(b"Hello, world");
    assert_eq!(h.link.missed_windows(), 1);
    assert_eq!(h.link.indicators().degraded, LedState::On);
    assert_eq!(h.link.stats().probe_mismatches, 1);
}

#[test]
fn test_miss_counter_saturates_at_three() {
    let mut h = Harness::default_config();
    h.listening_at(0);
    for i in 0..6 {
        h.at(200 + i * 100).frame(b"garbage");
        assert!(h.link.missed_windows() <= MAX_MISSED_WINDOWS);
    }
    assert_eq!(h.link.missed_windows(), 3);
}

#[test]
fn test_frame_rearms_both_timers() {
    let mut h = Harness::default_config();
    h.listening_at(0);
    h.at(700).frame(b"Hello, world!");
    assert_eq!(h.deadline(TimerId::ReceiveTimeout), Some(700 + 6_000));
    assert_eq!(h.deadline(TimerId::Transmit), Some(700 + 1_000));
}

#[test]
fn test_repace_strictly_earlier_than_periodic() {
    let mut h = Harness::default_config();
    h.at(0).fire_transmit();
    let periodic = h.deadline(TimerId::Transmit).unwrap();
    h.at(150).tx_done();

    // Peer heard well inside the first half period
    h.at(400).frame(b"Hello, world!");
    let repaced = h.deadline(TimerId::Transmit).unwrap();
    assert_eq!(repaced, 1_400);
    assert!(repaced < periodic);
}

#[test]
fn test_frame_reopens_listening_window() {
    let mut h = Harness::default_config();
    h.listening_at(0);
    let liveness = h.link.liveness();

    h.at(500).frame(b"Hello, world!");

    assert_eq!(h.link.mode(), LinkMode::Listening);
    assert_eq!(h.radio.calls, vec![Call::Receive]);
    assert_ne!(h.link.liveness(), liveness);
}

#[test]
fn test_frame_while_transmitting_ignored() {
    let mut h = Harness::no_jitter();
    h.at(0).fire_transmit();
    h.radio.calls.clear();

    h.at(50).frame(b"Hello, world");

    assert_eq!(h.link.mode(), LinkMode::Transmitting);
    assert_eq!(h.link.missed_windows(), 0);
    assert_eq!(h.deadline(TimerId::Transmit), Some(2_000));
    assert!(h.radio.calls.is_empty());
    assert_eq!(h.link.stats().stale_events, 1);
}

#[test]
fn test_empty_frame_is_mismatch() {
    let mut h = Harness::default_config();
    h.listening_at(0);
    h.at(300).frame(&[]);
    assert_eq!(h.link.missed_windows(), 1);
}

// =============================================================================
// Receive Timeout Tests
// =============================================================================

#[test]
fn test_timeout_leaves_counter_unchanged() {
    let mut h = Harness::default_config();
    h.listening_at(0);
    h.at(500).frame(b"Hello, world");
    let before = h.link.indicators();

    h.at(6_500).fire_rx_timeout();

    assert_eq!(h.link.missed_windows(), 1);
    assert_eq!(h.link.indicators(), before);
    assert_eq!(h.link.stats().rx_timeouts, 1);
}

#[test]
fn test_silence_never_degrades() {
    let mut h = Harness::no_jitter();
    h.listening_at(0);
    for k in 1..=10 {
        h.at(k * 6_000).fire_rx_timeout();
    }
    assert_eq!(h.link.missed_windows(), 0);
    assert_eq!(h.link.indicators().degraded, LedState::Off);
}

#[test]
fn test_timeout_issues_no_radio_command() {
    let mut h = Harness::default_config();
    h.listening_at(0);
    h.at(6_100).fire_rx_timeout();
    assert!(h.radio.calls.is_empty());
    assert_eq!(h.link.mode(), LinkMode::Listening);
}

#[test]
fn test_timeout_while_transmitting_ignored() {
    let mut h = Harness::default_config();
    h.at(0).fire_transmit();
    h.fire_rx_timeout();
    assert_eq!(h.link.stats().rx_timeouts, 0);
    assert_eq!(h.link.stats().stale_events, 1);
}

#[test]
fn test_timeout_deadline_is_three_periods() {
    let config = LinkConfig::new(1_000, 0, 3, 3).unwrap();
    let mut h = Harness::new(&config);
    h.at(0).fire_transmit();
    h.at(50).tx_done();
    assert_eq!(h.deadline(TimerId::ReceiveTimeout), Some(3_050));
}

// =============================================================================
// Indicator Tests
// =============================================================================

#[test]
fn test_liveness_toggles_per_window() {
    let mut h = Harness::no_jitter();
    let mut seen = Vec::new();
    for cycle in 0..4 {
        let t = cycle * 2_000;
        h.at(t).fire_transmit();
        h.at(t + 100).tx_done();
        seen.push(h.link.indicators().liveness);
    }
    assert_eq!(seen, vec![LedState::On, LedState::Off, LedState::On, LedState::Off]);
}

#[test]
fn test_indicators_track_state() {
    let mut h = Harness::default_config();
    h.listening_at(0);
    h.at(400).frame(b"nope");
    let shown = h.link.indicators();
    assert_eq!(shown.liveness, LedState::from_asserted(h.link.liveness()));
    assert_eq!(shown.degraded, LedState::On);
}

#[test]
fn test_stats_totals() {
    let mut h = Harness::default_config();
    h.listening_at(0);
    h.at(300).frame(b"Hello, world!");
    h.at(600).frame(b"Hello");
    h.at(7_000).fire_rx_timeout();

    let stats = h.link.stats();
    assert_eq!(stats.tx_attempts, 1);
    assert_eq!(stats.tx_completions, 1);
    assert_eq!(stats.frames_received, 2);
    assert_eq!(stats.probe_matches, 1);
    assert_eq!(stats.probe_mismatches, 1);
    assert_eq!(stats.rx_timeouts, 1);
}

// =============================================================================
// Radio Request Tests
// =============================================================================

#[test]
fn test_abort_when_idle_is_noop() {
    let mut request = RadioRequest::new(Tick::ZERO);
    request.abort_current_operation();
    request.abort_current_operation();
    assert!(!request.has_command());
    assert!(request.op().is_idle());
}

#[test]
fn test_abort_when_idle_leaves_link_untouched() {
    let mut link = LinkStateMachine::new(&LinkConfig::DEFAULT);
    let mut request = RadioRequest::new(Tick::from_millis(40));
    let mut timers = TimerTable::new();

    // Before start: nothing armed
    request.abort_current_operation();
    assert_eq!(link.mode(), LinkMode::Idle);
    assert_eq!(timers.armed_count(), 0);
    assert!(!request.has_command());

    link.start(&request, &mut timers);
    let armed: Vec<_> = TimerId::ALL.iter().map(|&id| timers.deadline(id)).collect();

    request.abort_current_operation();
    request.abort_current_operation();

    assert_eq!(link.mode(), LinkMode::Idle);
    let after: Vec<_> = TimerId::ALL.iter().map(|&id| timers.deadline(id)).collect();
    assert_eq!(after, armed);
    assert_eq!(timers.deadline(TimerId::Transmit), Some(Tick::from_millis(40)));
    assert!(request.take_command().is_none());
    assert_eq!(link.stats(), LinkStats::default());
}

#[test]
fn test_abort_then_transmit_collapses() {
    let mut request = RadioRequest::new(Tick::ZERO);
    request.begin_continuous_receive();
    let _ = request.take_command();

    request.abort_current_operation();
    request.transmit(b"Hello, world!");

    match request.take_command() {
        Some(RadioOp::Transmit(frame)) => assert_eq!(&frame[..], b"Hello, world!"),
        other => panic!("unexpected command {other:?}"),
    }
    assert!(request.take_command().is_none());
}

#[test]
fn test_abort_after_receive_goes_idle() {
    let mut request = RadioRequest::new(Tick::ZERO);
    request.begin_continuous_receive();
    let _ = request.take_command();
    request.abort_current_operation();
    assert_eq!(request.take_command(), Some(RadioOp::Idle));
    request.abort_current_operation();
    assert!(request.take_command().is_none());
}

#[test]
fn test_oversize_transmit_dropped() {
    let mut request = RadioRequest::new(Tick::ZERO);
    request.transmit(&[0u8; MAX_FRAME_LEN + 1]);
    assert!(!request.has_command());
}

#[test]
fn test_request_clock() {
    let mut request = RadioRequest::new(Tick::from_millis(5));
    assert_eq!(request.now(), Tick::from_millis(5));
    request.set_now(Tick::from_millis(9));
    assert_eq!(request.now(), Tick::from_millis(9));
}

#[test]
fn test_link_through_request_slot() {
    let mut link = LinkStateMachine::new(&LinkConfig::DEFAULT);
    let mut request = RadioRequest::new(Tick::ZERO);
    let mut timers = TimerTable::new();

    link.start(&request, &mut timers);
    let id = timers.pop_due(request.now()).unwrap();
    link.on_timer(id, &mut request, &mut timers);
    assert!(matches!(request.take_command(), Some(RadioOp::Transmit(_))));

    request.set_now(Tick::from_millis(200));
    link.handle(&LinkEvent::Radio(RadioEvent::TxDone), &mut request, &mut timers);
    assert_eq!(request.take_command(), Some(RadioOp::Receive));
}
