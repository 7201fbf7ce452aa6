//! SX1276 LoRa Transceiver Driver
//!
//! Wraps `lora-phy` with the fixed channel from [`crate::config`] and
//! exposes the two operations the link shell needs: send one frame, and
//! receive until one frame is captured.
//!
//! Both operations are plain futures. Dropping a pending receive is how
//! the shell aborts it; the next `prepare_for_*` call puts the chip back
//! in standby first.

use embassy_stm32::exti::ExtiInput;
use embassy_stm32::gpio::Output;
use embassy_stm32::mode::Async;
use embassy_stm32::spi::Spi;
use embassy_time::Delay;
use embedded_hal_bus::spi::ExclusiveDevice;
use lora_phy::iv::GenericSx127xInterfaceVariant;
use lora_phy::mod_params::{
    Bandwidth, CodingRate, ModulationParams, PacketParams, RadioError, RxMode, SpreadingFactor,
};
use lora_phy::sx127x::{self, Sx1276, Sx127x};
use lora_phy::LoRa;

use crate::config::{
    MAX_FRAME_LEN, RADIO_BANDWIDTH_KHZ, RADIO_FREQUENCY_HZ, RADIO_PREAMBLE_LEN,
    RADIO_RX_IQ_INVERTED, RADIO_SPREADING_FACTOR, RADIO_TX_POWER_DBM,
};
use crate::link::radio::Frame;

/// Radio operation result
pub type RadioResult<T> = Result<T, RadioError>;

/// SPI device the SX1276 sits on
pub type Sx1276Spi = ExclusiveDevice<Spi<'static, Async>, Output<'static>, Delay>;

/// Reset and DIO0 lines
pub type Sx1276Iv = GenericSx127xInterfaceVariant<Output<'static>, ExtiInput<'static>>;

type Sx1276Lora = LoRa<Sx127x<Sx1276Spi, Sx1276Iv, Sx1276>, Delay>;

/// Map a configured spreading factor onto lora-phy's enum
///
/// Only evaluated in const context, so an unsupported value fails the build.
const fn spreading_factor(sf: u8) -> SpreadingFactor {
    match sf {
        7 => SpreadingFactor::_7,
        8 => SpreadingFactor::_8,
        9 => SpreadingFactor::_9,
        10 => SpreadingFactor::_10,
        11 => SpreadingFactor::_11,
        12 => SpreadingFactor::_12,
        _ => panic!("unsupported spreading factor"),
    }
}

/// Map a configured bandwidth onto lora-phy's enum
const fn bandwidth(khz: u32) -> Bandwidth {
    match khz {
        125 => Bandwidth::_125KHz,
        250 => Bandwidth::_250KHz,
        500 => Bandwidth::_500KHz,
        _ => panic!("unsupported bandwidth"),
    }
}

const SPREADING_FACTOR: SpreadingFactor = spreading_factor(RADIO_SPREADING_FACTOR);
const BANDWIDTH: Bandwidth = bandwidth(RADIO_BANDWIDTH_KHZ);

/// SX1276 on a fixed channel
pub struct Sx1276Radio {
    lora: Sx1276Lora,
    modulation: ModulationParams,
    tx_params: PacketParams,
    rx_params: PacketParams,
    rx_buffer: [u8; MAX_FRAME_LEN],
}

impl Sx1276Radio {
    /// Reset the chip and configure the channel
    ///
    /// # Errors
    ///
    /// Returns the lora-phy error of the first step that fails.
    pub async fn new(spi: Sx1276Spi, iv: Sx1276Iv) -> RadioResult<Self> {
        let config = sx127x::Config {
            chip: Sx1276,
            tcxo_used: false,
            tx_boost: true,
            rx_boost: false,
        };
        let mut lora = LoRa::new(Sx127x::new(spi, iv, config), false, Delay).await?;

        let modulation = lora.create_modulation_params(
            SPREADING_FACTOR,
            BANDWIDTH,
            CodingRate::_4_5,
            RADIO_FREQUENCY_HZ,
        )?;
        let tx_params = lora.create_tx_packet_params(RADIO_PREAMBLE_LEN, false, true, false, &modulation)?;
        let rx_params = lora.create_rx_packet_params(
            RADIO_PREAMBLE_LEN,
            false,
            MAX_FRAME_LEN as u8,
            true,
            RADIO_RX_IQ_INVERTED,
            &modulation,
        )?;

        Ok(Self {
            lora,
            modulation,
            tx_params,
            rx_params,
            rx_buffer: [0; MAX_FRAME_LEN],
        })
    }

    /// Send one frame and wait for TX done
    ///
    /// # Errors
    ///
    /// Returns the lora-phy error if the chip rejects or fails the send.
    pub async fn transmit(&mut self, payload: &[u8]) -> RadioResult<()> {
        self.lora
            .prepare_for_tx(&self.modulation, &mut self.tx_params, RADIO_TX_POWER_DBM, payload)
            .await?;
        self.lora.tx().await
    }

    /// Listen until one frame is captured
    ///
    /// # Errors
    ///
    /// Returns the lora-phy error on a failed setup or a bad packet.
    pub async fn receive(&mut self) -> RadioResult<Frame> {
        self.lora
            .prepare_for_rx(RxMode::Continuous, &self.modulation, &self.rx_params)
            .await?;
        let (len, _status) = self.lora.rx(&self.rx_params, &mut self.rx_buffer).await?;
        let len = usize::from(len).min(MAX_FRAME_LEN);
        let mut frame = Frame::new();
        // len is clamped to the frame capacity
        frame.extend_from_slice(&self.rx_buffer[..len]).ok();
        Ok(frame)
    }
}
