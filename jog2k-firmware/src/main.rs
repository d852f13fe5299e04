//! JOG2K - CNC Pendant Firmware
//!
//! Firmware for the RP2040 pendant board. The pendant is an I2C responder:
//! the host streams status packets into a shared 256-byte window and reads
//! back single command bytes announced on the strobe line.
//!
//! Task layout:
//! - `responder_task` (interrupt executor): serves host bus transactions
//! - `panel_task`: status packets, keys, jogs, command handshakes
//! - `settings_task`: persists the screen orientation and restarts
//! - `heartbeat_task`: blinks the on-board LED

#![no_std]
#![no_main]

use defmt::*;
use embassy_executor::{InterruptExecutor, Spawner};
use embassy_rp::bind_interrupts;
use embassy_rp::gpio::{Input, Level, Output, Pull};
use embassy_rp::i2c_slave::{self, I2cSlave};
use embassy_rp::interrupt;
use embassy_rp::interrupt::{InterruptExt, Priority};
use embassy_rp::peripherals::I2C1;
use {defmt_rtt as _, panic_probe as _};

use jog2k_core::config::SettingsStore;
use jog2k_hal_rp2040::flash::Rp2040FlashStorage;
use jog2k_hal_rp2040::gpio::{KeyBank, RpOutput};
use jog2k_hal_rp2040::responder::Responder;
use jog2k_protocol::{BusHandler, DEFAULT_REGISTRY};

use crate::channels::REGION;
use crate::config::PANEL_CONFIG;
use crate::tasks::{heartbeat_task, panel_task, responder_task, settings_task, PanelIo};

mod channels;
mod config;
mod tasks;

bind_interrupts!(struct Irqs {
    I2C1_IRQ => embassy_rp::i2c::InterruptHandler<I2C1>;
});

/// Runs the responder above the thread executor
static EXECUTOR_HIGH: InterruptExecutor = InterruptExecutor::new();

#[interrupt]
unsafe fn SWI_IRQ_1() {
    EXECUTOR_HIGH.on_interrupt()
}

/// Main entry point
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("JOG2K firmware starting...");

    let p = embassy_rp::init(Default::default());

    // Persisted settings
    let mut store = SettingsStore::new(Rp2040FlashStorage::new(p.FLASH, p.DMA_CH0));
    let settings = match store.load().await {
        Ok(settings) => settings,
        Err(e) => {
            warn!("Failed to load settings, using defaults: {}", e);
            Default::default()
        }
    };
    info!("Settings: screen_flip={}", settings.screen_flip);

    // Host bus (I2C1: SDA=GPIO2, SCL=GPIO3)
    let mut bus_config = i2c_slave::Config::default();
    bus_config.addr = PANEL_CONFIG.responder_address as u16;
    let device = I2cSlave::new(p.I2C1, p.PIN_3, p.PIN_2, Irqs, bus_config);
    let responder = Responder::new(device, BusHandler::new(&REGION, &DEFAULT_REGISTRY));
    info!(
        "Responder at 0x{:02x} ({} Hz bus)",
        PANEL_CONFIG.responder_address, PANEL_CONFIG.bus_frequency_hz
    );

    // Keys are active high; order follows Key::ALL
    let keys = KeyBank::new([
        Input::new(p.PIN_5, Pull::Down),  // Halt
        Input::new(p.PIN_19, Pull::Down), // Hold
        Input::new(p.PIN_20, Pull::Down), // Run
        Input::new(p.PIN_15, Pull::Down), // Spindle override up
        Input::new(p.PIN_16, Pull::Down), // Spindle override down
        Input::new(p.PIN_26, Pull::Down), // Spindle override reset
        Input::new(p.PIN_4, Pull::Down),  // Feed override up
        Input::new(p.PIN_12, Pull::Down), // Feed override down
        Input::new(p.PIN_13, Pull::Down), // Feed override reset
        Input::new(p.PIN_27, Pull::Down), // Home
        Input::new(p.PIN_18, Pull::Down), // Mist
        Input::new(p.PIN_17, Pull::Down), // Flood
        Input::new(p.PIN_21, Pull::Down), // Spindle
        Input::new(p.PIN_14, Pull::Down), // Jog select
        Input::new(p.PIN_6, Pull::Down),  // Up
        Input::new(p.PIN_9, Pull::Down),  // Right
        Input::new(p.PIN_7, Pull::Down),  // Down
        Input::new(p.PIN_8, Pull::Down),  // Left
        Input::new(p.PIN_11, Pull::Down), // Raise
        Input::new(p.PIN_10, Pull::Down), // Lower
    ]);

    let strobe = RpOutput::new(Output::new(p.PIN_28, Level::Low));
    let led = RpOutput::new(Output::new(p.PIN_25, Level::Low));

    interrupt::SWI_IRQ_1.set_priority(Priority::P2);
    let high_spawner = EXECUTOR_HIGH.start(interrupt::SWI_IRQ_1);
    high_spawner.spawn(responder_task(responder)).unwrap();

    spawner
        .spawn(panel_task(PanelIo { keys, strobe }))
        .unwrap();
    spawner.spawn(settings_task(store, settings)).unwrap();
    spawner.spawn(heartbeat_task(led)).unwrap();

    info!("JOG2K firmware initialized");
}
