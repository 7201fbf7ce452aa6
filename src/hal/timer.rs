//! Timer Abstractions
//!
//! Bridges the embassy time driver to the link's millisecond [`Tick`].

use embassy_time::{Instant, Timer};

use crate::types::Tick;

/// Current embassy time as a link tick
#[must_use]
pub fn now() -> Tick {
    Tick::from_millis(Instant::now().as_millis())
}

/// Embassy instant for a link tick
#[must_use]
pub const fn instant_at(tick: Tick) -> Instant {
    Instant::from_millis(tick.as_millis())
}

/// Wait until `deadline`, or forever when nothing is armed
pub async fn wait_until(deadline: Option<Tick>) {
    match deadline {
        Some(tick) => Timer::at(instant_at(tick)).await,
        None => core::future::pending::<()>().await,
    }
}
