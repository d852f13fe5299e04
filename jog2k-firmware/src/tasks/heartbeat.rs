//! On-board LED heartbeat

use defmt::*;
use jog2k_hal::OutputPin;
use jog2k_hal_rp2040::gpio::RpOutput;

use crate::channels::HEARTBEAT;

#[embassy_executor::task]
pub async fn heartbeat_task(mut led: RpOutput<'static>) {
    info!("Heartbeat task started");

    loop {
        HEARTBEAT.wait().await;
        led.toggle();
    }
}
