//! GPIO Abstractions
//!
//! Drives the two status LEDs from [`Indicators`] snapshots.
//! Pins are any `embedded-hal` output, active high.

use embedded_hal::digital::OutputPin;

use crate::link::indicators::Indicators;
use crate::types::LedState;

/// Single status LED that remembers what it last showed
pub struct StatusLed<P> {
    pin: P,
    state: LedState,
}

impl<P: OutputPin> StatusLed<P> {
    /// Create a status LED and drive it to `initial`
    ///
    /// # Errors
    ///
    /// Returns the pin error if the initial write fails.
    pub fn new(pin: P, initial: LedState) -> Result<Self, P::Error> {
        let mut led = Self {
            pin,
            state: LedState::Off,
        };
        led.set(initial)?;
        Ok(led)
    }

    /// Drive the LED to `state`
    ///
    /// # Errors
    ///
    /// Returns the pin error; the remembered state is left unchanged.
    pub fn set(&mut self, state: LedState) -> Result<(), P::Error> {
        match state {
            LedState::On => self.pin.set_high()?,
            LedState::Off => self.pin.set_low()?,
        }
        self.state = state;
        Ok(())
    }

    /// Get current state
    #[must_use]
    pub const fn state(&self) -> LedState {
        self.state
    }
}

/// Liveness and degraded-link LEDs
pub struct StatusLeds<P> {
    ping: StatusLed<P>,
    degraded: StatusLed<P>,
}

impl<P: OutputPin> StatusLeds<P> {
    /// Create both LEDs showing the startup pattern (both off)
    ///
    /// # Errors
    ///
    /// Returns the first pin error.
    pub fn new(ping: P, degraded: P) -> Result<Self, P::Error> {
        let initial = Indicators::default();
        Ok(Self {
            ping: StatusLed::new(ping, initial.liveness)?,
            degraded: StatusLed::new(degraded, initial.degraded)?,
        })
    }

    /// Show an indicator snapshot, writing only the LEDs that changed
    ///
    /// # Errors
    ///
    /// Returns the first pin error.
    pub fn apply(&mut self, indicators: Indicators) -> Result<(), P::Error> {
        if self.ping.state() != indicators.liveness {
            self.ping.set(indicators.liveness)?;
        }
        if self.degraded.state() != indicators.degraded {
            self.degraded.set(indicators.degraded)?;
        }
        Ok(())
    }

    /// What the LEDs currently show
    #[must_use]
    pub const fn shown(&self) -> Indicators {
        Indicators {
            liveness: self.ping.state(),
            degraded: self.degraded.state(),
        }
    }
}
