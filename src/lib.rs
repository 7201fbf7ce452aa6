//! LoRa Ping-Pong Link Firmware Library
//!
//! This library implements a bidirectional liveness check for a pair of
//! single-channel LoRa nodes. Each node alternates between transmitting a
//! fixed probe payload and listening for its peer's probe, validates what
//! it hears, and reports link health on two status LEDs.
//!
//! # Architecture
//!
//! The firmware is organized in layers:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    APPLICATION LAYER                         │
//! │  link_task (select loop)  │  indicator_task (LEDs)           │
//! ├─────────────────────────────────────────────────────────────┤
//! │                      LINK CORE                               │
//! │  LinkStateMachine │ Probe │ Pacing │ Indicators │ Timers     │
//! ├─────────────────────────────────────────────────────────────┤
//! │                   HAL / DRIVER LAYER                         │
//! │  SX1276 (lora-phy over SPI)  │  GPIO  │  Clock               │
//! ├─────────────────────────────────────────────────────────────┤
//! │                    RTOS / SCHEDULER                          │
//! │           embassy-rs (async/await executor)                  │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! On the host the same core runs inside [`sim`], a deterministic
//! two-node simulator driven by a virtual millisecond clock.
//!
//! # Design Principles
//!
//! - **Functional core, imperative shell**: the link core never awaits; it
//!   records radio commands and timer deadlines that a shell executes
//! - **Single owner**: all link state lives in one `LinkStateMachine`
//!   passed by `&mut`, so no locking is needed
//! - **Type-driven design**: ticks, timer names and LED levels are types
//! - **No unsafe in application code**

#![cfg_attr(not(feature = "std"), no_std)]
#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

// Re-export dependencies needed by applications (only in embedded mode)
#[cfg(feature = "embedded")]
pub use embassy_executor;
#[cfg(feature = "embedded")]
pub use embassy_stm32;
#[cfg(feature = "embedded")]
pub use embassy_time;

mod fmt;

/// Hardware Abstraction Layer
///
/// Status LED pins and the embassy clock bridge.
pub mod hal;

/// Peripheral Drivers
///
/// SX1276 LoRa transceiver on top of lora-phy.
#[cfg(feature = "embedded")]
pub mod drivers;

/// Link Control Logic
///
/// The ping-pong state machine and its collaborators.
pub mod link;

/// Two-node host simulator
#[cfg(feature = "std")]
pub mod sim;

/// Shared types used across modules
pub mod types;

/// System configuration and constants
pub mod config;

/// Prelude module for common imports
pub mod prelude {
    //! Convenient re-exports for common types and traits.

    pub use crate::config::*;
    pub use crate::types::*;

    pub use crate::link::indicators::{Indicators, MissCounter};
    pub use crate::link::probe::Probe;
    pub use crate::link::radio::{Frame, RadioEvent, RadioLink, RadioOp, RadioRequest};
    pub use crate::link::state::{LinkEvent, LinkStateMachine, LinkStats};
    pub use crate::link::timers::{Scheduler, TimerTable};

    // Embassy
    #[cfg(feature = "embedded")]
    pub use embassy_time::{Duration, Instant, Timer};

    // Logging
    #[cfg(feature = "embedded")]
    pub use defmt::{debug, error, info, trace, warn};
}
