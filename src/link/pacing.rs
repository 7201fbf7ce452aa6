//! Transmit Pacing
//!
//! Computes the deadlines the link arms:
//! - periodic transmit: one interval plus random jitter, so two nodes on a
//!   shared channel drift apart instead of colliding forever
//! - re-paced transmit: half an interval after hearing the peer, which puts
//!   the two nodes half a period out of phase
//! - receive timeout: a fixed number of periods, so one lost packet does
//!   not end the listening window

use core::fmt;

use rand_core::{RngCore, SeedableRng};
use rand_wyrand::WyRand;

use crate::config::LinkConfig;
use crate::types::Tick;

/// Deadline policy for the transmit and receive-timeout timers
pub struct TxPacing {
    tx_interval_ms: u32,
    jitter_max_ms: u32,
    repace_ms: u32,
    rx_timeout_ms: u32,
    rng: WyRand,
}

impl TxPacing {
    /// Create a pacing policy from link configuration
    #[must_use]
    pub fn new(config: &LinkConfig) -> Self {
        Self {
            tx_interval_ms: config.tx_interval_ms(),
            jitter_max_ms: config.jitter_max_ms(),
            repace_ms: config.repace_ms(),
            rx_timeout_ms: config.rx_timeout_ms(),
            rng: WyRand::seed_from_u64(config.rng_seed()),
        }
    }

    /// Draw a jitter value in `[0, jitter_max_ms)`
    pub fn jitter_ms(&mut self) -> u32 {
        if self.jitter_max_ms == 0 {
            return 0;
        }
        self.rng.next_u32() % self.jitter_max_ms
    }

    /// Deadline of the next periodic transmit
    pub fn next_transmit(&mut self, now: Tick) -> Tick {
        let jitter = self.jitter_ms();
        now.after_ms(self.tx_interval_ms.saturating_add(jitter))
    }

    /// Deadline of the transmit that follows a received frame
    #[must_use]
    pub const fn repaced_transmit(&self, now: Tick) -> Tick {
        now.after_ms(self.repace_ms)
    }

    /// Deadline of the receive timeout for a window opened at `now`
    #[must_use]
    pub const fn receive_deadline(&self, now: Tick) -> Tick {
        now.after_ms(self.rx_timeout_ms)
    }

    /// Nominal transmit period in milliseconds
    #[must_use]
    pub const fn tx_interval_ms(&self) -> u32 {
        self.tx_interval_ms
    }
}

impl fmt::Debug for TxPacing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TxPacing")
            .field("tx_interval_ms", &self.tx_interval_ms)
            .field("jitter_max_ms", &self.jitter_max_ms)
            .field("repace_ms", &self.repace_ms)
            .field("rx_timeout_ms", &self.rx_timeout_ms)
            .finish_non_exhaustive()
    }
}
