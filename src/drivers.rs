//! Peripheral Drivers
//!
//! The SX1276 transceiver, configured once for the fixed link channel.

pub mod sx1276;
