//! I2C responder glue
//!
//! Runs the `embassy-rp` I2C target peripheral and feeds every transaction
//! into a [`BusHandler`]. The peripheral delivers writes as blocks, so the
//! handler sees the addressing byte and data in one go followed by the
//! transaction end. Reads are served one byte at a time straight from the
//! cursor, so the cursor only moves once the host is actually clocking a
//! byte out. A byte the host stops short of is handed back with
//! [`BusHandler::unread`], which leaves the cursor alone if a new command
//! was posted in the meantime.
//!
//! Must run at a higher priority than the panel loop so host traffic is
//! never held up by a command handshake.

use embassy_rp::i2c::Instance;
use embassy_rp::i2c_slave::{Command, Error, I2cSlave, ReadStatus};
use jog2k_protocol::{BusHandler, REGION_SIZE};

/// Address byte plus a full lap of the region
const RX_BUFFER_SIZE: usize = REGION_SIZE + 1;

/// Bytes staged per read response
///
/// Anything staged counts as read by the dispatcher, so stay at one.
const READ_CHUNK: usize = 1;

/// A completed host transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Transaction {
    /// Write of `len` bytes including the addressing byte
    Write(usize),
    /// Write followed by a repeated-start read
    WriteRead { written: usize, read: usize },
    /// Plain read of `len` bytes
    Read(usize),
    /// General call, not forwarded to the handler
    GeneralCall(usize),
    /// Write longer than the receive buffer; the part received was applied
    PartialWrite(usize),
}

/// Serves host transactions on one I2C peripheral
pub struct Responder<'d, T: Instance> {
    device: I2cSlave<'d, T>,
    bus: BusHandler<'d>,
    rx: [u8; RX_BUFFER_SIZE],
}

impl<'d, T: Instance> Responder<'d, T> {
    pub fn new(device: I2cSlave<'d, T>, bus: BusHandler<'d>) -> Self {
        Self {
            device,
            bus,
            rx: [0; RX_BUFFER_SIZE],
        }
    }

    /// Wait for and serve the next transaction
    ///
    /// The region is never left armed on return, error or not.
    pub async fn serve(&mut self) -> Result<Transaction, Error> {
        let command = match self.device.listen(&mut self.rx).await {
            Ok(command) => command,
            Err(Error::PartialWrite(len)) => {
                self.apply_write(len);
                return Ok(Transaction::PartialWrite(len));
            }
            Err(e) => {
                self.bus.on_transaction_end();
                return Err(e);
            }
        };

        match command {
            Command::Write(len) => {
                self.apply_write(len);
                Ok(Transaction::Write(len))
            }
            Command::WriteRead(len) => {
                // Repeated start ends the write phase
                self.apply_write(len);
                let read = self.serve_read().await?;
                Ok(Transaction::WriteRead { written: len, read })
            }
            Command::Read => Ok(Transaction::Read(self.serve_read().await?)),
            Command::GeneralCall(len) => Ok(Transaction::GeneralCall(len)),
        }
    }

    fn apply_write(&mut self, len: usize) {
        self.bus.receive(&self.rx[..len]);
        self.bus.on_transaction_end();
    }

    async fn serve_read(&mut self) -> Result<usize, Error> {
        let mut sent = 0;
        let result = loop {
            let mut chunk = [0u8; READ_CHUNK];
            let staged = self.bus.stage(&mut chunk);

            match self.device.respond_to_read(&chunk).await {
                Ok(ReadStatus::NeedMoreBytes) => sent += READ_CHUNK,
                Ok(ReadStatus::Done) => break Ok(sent + READ_CHUNK),
                Ok(ReadStatus::LeftoverBytes(left)) => {
                    let left = (left as usize).min(READ_CHUNK);
                    self.bus.unread(staged, left);
                    break Ok(sent + READ_CHUNK - left);
                }
                Err(e) => break Err(e),
            }
        };
        self.bus.on_transaction_end();
        result
    }
}
