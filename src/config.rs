//! System configuration and hardware constants
//!
//! This module defines compile-time constants for the ping-pong node.
//! Link timing, the probe payload, the radio channel and pin mappings are
//! centralized here.

use core::fmt;

/// Nominal period between probe transmissions in milliseconds
///
/// This bypasses any duty-cycle limiting. When the payload length,
/// frequency or spreading factor changes, check the airtime again.
pub const TX_INTERVAL_MS: u32 = 2_000;

/// Upper bound (exclusive) of the random delay added to each transmit period
pub const TX_JITTER_MAX_MS: u32 = 500;

/// Number of transmit periods a listening window lasts before timing out
pub const RX_TIMEOUT_PERIODS: u32 = 3;

/// Ceiling of the consecutive-mismatch counter
pub const MAX_MISSED_WINDOWS: u8 = 3;

/// Probe payload transmitted and expected by both peers
pub const PROBE_PAYLOAD: &[u8] = b"Hello, world!";

/// Largest radio frame handled by the link, in bytes
pub const MAX_FRAME_LEN: usize = 64;

/// Seed for the transmit jitter generator
///
/// Only a fallback: nodes on target seed from their device ID, see
/// [`seed_from_device_id`].
pub const DEFAULT_RNG_SEED: u64 = 0x5EED_0F_B0A7_1E55;

/// Fold a device unique ID into a jitter seed (FNV-1a, 64 bit)
///
/// Peers must draw different jitter or they re-arm to the same deadlines
/// and talk over each other forever.
#[must_use]
pub const fn seed_from_device_id(id: &[u8]) -> u64 {
    const FNV_OFFSET: u64 = 0xCBF2_9CE4_8422_2325;
    const FNV_PRIME: u64 = 0x0000_0100_0000_01B3;

    let mut hash = FNV_OFFSET;
    let mut i = 0;
    while i < id.len() {
        hash ^= id[i] as u64;
        hash = hash.wrapping_mul(FNV_PRIME);
        i += 1;
    }
    hash
}

/// Carrier frequency (EU868 g3 sub-band, 10% duty cycle allowed)
pub const RADIO_FREQUENCY_HZ: u32 = 869_525_000;

/// LoRa spreading factor
pub const RADIO_SPREADING_FACTOR: u8 = 9;

/// LoRa bandwidth in kHz
pub const RADIO_BANDWIDTH_KHZ: u32 = 125;

/// Transmit power in dBm (SX1276 PA_BOOST maximum)
pub const RADIO_TX_POWER_DBM: i32 = 20;

/// LoRa preamble length in symbols
pub const RADIO_PREAMBLE_LEN: u16 = 8;

/// Invert IQ on receive (disabled so two nodes hear each other)
pub const RADIO_RX_IQ_INVERTED: bool = false;

/// SPI clock for the SX1276
pub const SPI_FREQUENCY_HZ: u32 = 1_000_000;

// The SX1276 driver maps these onto lora-phy enums
const _: () = assert!(RADIO_SPREADING_FACTOR >= 7 && RADIO_SPREADING_FACTOR <= 12);
const _: () = assert!(matches!(RADIO_BANDWIDTH_KHZ, 125 | 250 | 500));
const _: () = assert!(PROBE_PAYLOAD.len() <= MAX_FRAME_LEN && MAX_FRAME_LEN <= 255);

/// Pin assignments for GPIO
pub mod pins {
    //! GPIO pin assignments matching the schematic

    /// Liveness LED, toggled at each listening window
    pub const LED_PING: &str = "PB0";

    /// Degraded-link LED
    pub const LED_ACK: &str = "PB1";

    /// SPI1 SCK (SX1276)
    pub const SPI1_SCK: &str = "PA5";

    /// SPI1 MISO (SX1276)
    pub const SPI1_MISO: &str = "PA6";

    /// SPI1 MOSI (SX1276)
    pub const SPI1_MOSI: &str = "PA7";

    /// SX1276 chip select (active low)
    pub const LORA_NSS: &str = "PA4";

    /// SX1276 reset (active low)
    pub const LORA_RST: &str = "PB10";

    /// SX1276 DIO0 (TX done / RX done interrupt)
    pub const LORA_DIO0: &str = "PB11";
}

/// DMA channel assignments
pub mod dma {
    //! DMA channel assignments for SPI transfers

    /// SPI1 TX DMA channel
    pub const SPI1_TX: u8 = 1;

    /// SPI1 RX DMA channel
    pub const SPI1_RX: u8 = 2;
}

/// Reasons a [`LinkConfig`] is rejected
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// Transmit interval of zero
    ZeroInterval,
    /// Jitter window not shorter than the transmit interval
    JitterTooLarge,
    /// Listening window of zero periods
    ZeroTimeoutPeriods,
    /// Miss counter ceiling of zero
    ZeroMissCeiling,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZeroInterval => write!(f, "transmit interval must be non-zero"),
            Self::JitterTooLarge => write!(f, "jitter window must be shorter than the transmit interval"),
            Self::ZeroTimeoutPeriods => write!(f, "receive timeout must span at least one period"),
            Self::ZeroMissCeiling => write!(f, "miss counter ceiling must be non-zero"),
        }
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for ConfigError {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::ZeroInterval => defmt::write!(f, "ZeroInterval"),
            Self::JitterTooLarge => defmt::write!(f, "JitterTooLarge"),
            Self::ZeroTimeoutPeriods => defmt::write!(f, "ZeroTimeoutPeriods"),
            Self::ZeroMissCeiling => defmt::write!(f, "ZeroMissCeiling"),
        }
    }
}

/// Validated link timing parameters
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LinkConfig {
    tx_interval_ms: u32,
    jitter_max_ms: u32,
    rx_timeout_periods: u32,
    max_missed_windows: u8,
    rng_seed: u64,
}

impl LinkConfig {
    /// Configuration built from the constants in this module
    pub const DEFAULT: Self = Self {
        tx_interval_ms: TX_INTERVAL_MS,
        jitter_max_ms: TX_JITTER_MAX_MS,
        rx_timeout_periods: RX_TIMEOUT_PERIODS,
        max_missed_windows: MAX_MISSED_WINDOWS,
        rng_seed: DEFAULT_RNG_SEED,
    };

    /// Create a configuration, rejecting values the link cannot run with
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] naming the first invalid field.
    pub const fn new(
        tx_interval_ms: u32,
        jitter_max_ms: u32,
        rx_timeout_periods: u32,
        max_missed_windows: u8,
    ) -> Result<Self, ConfigError> {
        if tx_interval_ms == 0 {
            return Err(ConfigError::ZeroInterval);
        }
        if jitter_max_ms >= tx_interval_ms {
            return Err(ConfigError::JitterTooLarge);
        }
        if rx_timeout_periods == 0 {
            return Err(ConfigError::ZeroTimeoutPeriods);
        }
        if max_missed_windows == 0 {
            return Err(ConfigError::ZeroMissCeiling);
        }
        Ok(Self {
            tx_interval_ms,
            jitter_max_ms,
            rx_timeout_periods,
            max_missed_windows,
            rng_seed: DEFAULT_RNG_SEED,
        })
    }

    /// Replace the jitter seed (returns new config)
    ///
    /// Give each node its own seed; two nodes sharing one draw identical
    /// jitter and stay in phase.
    #[must_use]
    pub const fn with_seed(self, rng_seed: u64) -> Self {
        Self { rng_seed, ..self }
    }

    /// Nominal transmit period in milliseconds
    #[must_use]
    pub const fn tx_interval_ms(&self) -> u32 {
        self.tx_interval_ms
    }

    /// Exclusive upper bound of the transmit jitter in milliseconds
    #[must_use]
    pub const fn jitter_max_ms(&self) -> u32 {
        self.jitter_max_ms
    }

    /// Listening window length in transmit periods
    #[must_use]
    pub const fn rx_timeout_periods(&self) -> u32 {
        self.rx_timeout_periods
    }

    /// Listening window length in milliseconds
    #[must_use]
    pub const fn rx_timeout_ms(&self) -> u32 {
        self.tx_interval_ms.saturating_mul(self.rx_timeout_periods)
    }

    /// Delay to the next transmit after hearing the peer
    #[must_use]
    pub const fn repace_ms(&self) -> u32 {
        self.tx_interval_ms / 2
    }

    /// Ceiling of the miss counter
    #[must_use]
    pub const fn max_missed_windows(&self) -> u8 {
        self.max_missed_windows
    }

    /// Jitter generator seed
    #[must_use]
    pub const fn rng_seed(&self) -> u64 {
        self.rng_seed
    }
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}
