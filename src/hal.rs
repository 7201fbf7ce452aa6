//! Hardware Abstraction Layer
//!
//! Provides safe abstractions over the board peripherals the link uses.
//! GPIO is written against `embedded-hal` traits so it also runs on the
//! host; the clock bridge needs embassy and only exists on target.

pub mod gpio;
#[cfg(feature = "embedded")]
pub mod timer;
