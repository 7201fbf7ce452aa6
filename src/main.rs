//! Ping-Pong Node Main Application
//!
//! Entry point for the STM32G474 + SX1276 link checker firmware.
//! Initializes hardware and spawns async tasks.

#![no_std]
#![no_main]

use defmt::{info, warn};
use embassy_executor::Spawner;
use embassy_futures::select::{select, Either};
use embassy_stm32::exti::ExtiInput;
use embassy_stm32::gpio::{Level, Output, Pull, Speed};
use embassy_stm32::spi::{self, Spi};
use embassy_stm32::time::Hertz;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use embassy_time::Delay;
use embedded_hal_bus::spi::ExclusiveDevice;
use lora_phy::iv::GenericSx127xInterfaceVariant;
use {defmt_rtt as _, panic_probe as _};

use pingpong_firmware::drivers::sx1276::Sx1276Radio;
use pingpong_firmware::hal::gpio::StatusLeds;
use pingpong_firmware::hal::timer;
use pingpong_firmware::prelude::*;

/// Latest LED snapshot, published by the link task
static INDICATORS: Signal<CriticalSectionRawMutex, Indicators> = Signal::new();

/// Main entry point
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("Ping-pong node v{}", env!("CARGO_PKG_VERSION"));

    // Initialize STM32G474 peripherals with default clock configuration
    let p = embassy_stm32::init(embassy_stm32::Config::default());

    // Status LEDs: PB0 = ping, PB1 = degraded link
    let Ok(leds) = StatusLeds::new(
        Output::new(p.PB0, Level::Low, Speed::Low),
        Output::new(p.PB1, Level::Low, Speed::Low),
    ) else {
        defmt::panic!("status LED setup failed");
    };

    // SPI1 for the SX1276: PA5 = SCK, PA7 = MOSI, PA6 = MISO, PA4 = NSS
    let mut spi_config = spi::Config::default();
    spi_config.frequency = Hertz(SPI_FREQUENCY_HZ);
    let spi = Spi::new(p.SPI1, p.PA5, p.PA7, p.PA6, p.DMA1_CH1, p.DMA1_CH2, spi_config);
    let nss = Output::new(p.PA4, Level::High, Speed::VeryHigh);
    let Ok(spi_device) = ExclusiveDevice::new(spi, nss, Delay) else {
        defmt::panic!("SX1276 SPI device setup failed");
    };

    // PB10 = reset, PB11 = DIO0
    let reset = Output::new(p.PB10, Level::High, Speed::Low);
    let dio0 = ExtiInput::new(p.PB11, p.EXTI11, Pull::Down);
    let Ok(iv) = GenericSx127xInterfaceVariant::new(reset, dio0, None, None) else {
        defmt::panic!("SX1276 interface setup failed");
    };

    let radio = match Sx1276Radio::new(spi_device, iv).await {
        Ok(radio) => radio,
        Err(err) => defmt::panic!("SX1276 init failed: {}", defmt::Debug2Format(&err)),
    };

    info!("Frequency: {} Hz", RADIO_FREQUENCY_HZ);
    info!("Spreading factor: SF{}", RADIO_SPREADING_FACTOR);
    info!("TX power: {} dBm", RADIO_TX_POWER_DBM);

    spawner.spawn(indicator_task(leds)).unwrap();
    // Per-device jitter seed keeps two nodes powered on together apart
    let seed = seed_from_device_id(embassy_stm32::uid::uid());
    info!("Jitter seed: {=u64:x}", seed);
    spawner.spawn(link_task(radio, LinkConfig::DEFAULT.with_seed(seed))).unwrap();

    info!("Started");
}

/// Outcome of one wait in the link loop
enum Wake {
    /// Radio reported a completion
    Radio(RadioEvent),
    /// Radio operation failed or stalled; the transceiver is left in standby
    RadioFailed,
    /// A timer deadline passed, or a receive error needs a restart
    Tick,
}

/// Link task - owns the state machine, its timers and the radio
///
/// Each iteration fires at most one due timer, or waits for the current
/// radio operation raced against a deadline. A receive loses the race to
/// any timer. A transmission is only cut short by the next transmit
/// attempt, so a stale receive timeout cannot abort it.
#[embassy_executor::task]
async fn link_task(mut radio: Sx1276Radio, config: LinkConfig) {
    let mut link = LinkStateMachine::new(&config);
    let mut timers = TimerTable::new();
    let mut request = RadioRequest::new(timer::now());
    let mut active = RadioOp::Idle;

    link.start(&request, &mut timers);

    loop {
        request.set_now(timer::now());

        if let Some(id) = timers.pop_due(request.now()) {
            link.on_timer(id, &mut request, &mut timers);
        } else {
            let deadline = timers.next_deadline();
            let wake = match &active {
                RadioOp::Transmit(frame) => {
                    let next_attempt = timers.deadline(TimerId::Transmit);
                    match select(radio.transmit(frame), timer::wait_until(next_attempt)).await {
                        Either::First(Ok(())) => Wake::Radio(RadioEvent::TxDone),
                        Either::First(Err(err)) => {
                            warn!("TX failed: {}", defmt::Debug2Format(&err));
                            Wake::RadioFailed
                        }
                        Either::Second(()) => {
                            warn!("TX did not complete before the next attempt");
                            Wake::RadioFailed
                        }
                    }
                }
                RadioOp::Receive => match select(radio.receive(), timer::wait_until(deadline)).await {
                    Either::First(Ok(frame)) => Wake::Radio(RadioEvent::Frame(frame)),
                    Either::First(Err(err)) => {
                        warn!("RX failed: {}", defmt::Debug2Format(&err));
                        Wake::Tick
                    }
                    Either::Second(()) => Wake::Tick,
                },
                RadioOp::Idle => {
                    timer::wait_until(deadline).await;
                    Wake::Tick
                }
            };

            match wake {
                Wake::Radio(event) => {
                    // Both completions leave the transceiver in standby
                    active = RadioOp::Idle;
                    request.set_now(timer::now());
                    link.handle(&LinkEvent::Radio(event), &mut request, &mut timers);
                }
                Wake::RadioFailed => active = RadioOp::Idle,
                Wake::Tick => {}
            }
        }

        if let Some(op) = request.take_command() {
            active = op;
        }
        INDICATORS.signal(link.indicators());
    }
}

/// Indicator task - mirrors the latest snapshot onto the LEDs
#[embassy_executor::task]
async fn indicator_task(mut leds: StatusLeds<Output<'static>>) {
    loop {
        let indicators = INDICATORS.wait().await;
        if leds.apply(indicators).is_err() {
            warn!("LED update failed");
        }
    }
}
