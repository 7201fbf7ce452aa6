//! Link Control Logic
//!
//! The ping-pong state machine and the pieces it is built from.
//! Implements the functional core of the link checker.

pub mod indicators;
pub mod pacing;
pub mod probe;
pub mod radio;
pub mod state;
pub mod timers;
