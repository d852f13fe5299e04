//! Host bus responder task
//!
//! Runs on the high-priority interrupt executor so host transactions are
//! served even while the panel loop is blocked in a command handshake.

use defmt::*;
use embassy_rp::peripherals::I2C1;
use jog2k_hal_rp2040::responder::{Responder, Transaction};

#[embassy_executor::task]
pub async fn responder_task(mut responder: Responder<'static, I2C1>) {
    info!("Responder task started");

    loop {
        match responder.serve().await {
            Ok(Transaction::PartialWrite(len)) => {
                warn!("Host write overflowed the receive buffer after {} bytes", len)
            }
            Ok(Transaction::GeneralCall(len)) => trace!("General call ignored ({} bytes)", len),
            Ok(transaction) => trace!("{}", transaction),
            Err(e) => warn!("Responder error: {}", e),
        }
    }
}
