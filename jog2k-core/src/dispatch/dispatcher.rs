//! Outbound command handshake
//!
//! ```text
//!   wait while host is mid-write ──▶ mailbox = byte, cursor = 0
//!        │                                   │
//!        │                          strobe set-up delay
//!        ▼                                   ▼
//!     BusBusy                          strobe HIGH
//!                                            │
//!                              poll until cursor leaves 0
//!                                 │                 │
//!                               Ok(())           Timeout
//!                                 └──── strobe LOW if requested ────┘
//! ```

use embedded_hal::delay::DelayNs;
use jog2k_hal::OutputPin;
use jog2k_protocol::{Command, SharedRegion};

use super::wait::bounded_wait;

/// Default budget for each wait phase (µs)
pub const DEFAULT_TIMEOUT_US: u32 = 100_000;

/// Default delay between posting the mailbox and raising the strobe (µs)
pub const DEFAULT_STROBE_SETUP_US: u32 = 1_000;

/// Default polling granularity (µs)
pub const DEFAULT_POLL_STEP_US: u32 = 1;

/// Errors from a command handshake
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DispatchError {
    /// The host stayed mid-transaction; the mailbox was not touched
    BusBusy,
    /// The host never read the mailbox after the strobe was raised
    Timeout,
}

/// Timing of the handshake
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DispatchTiming {
    pub timeout_us: u32,
    pub strobe_setup_us: u32,
    pub poll_step_us: u32,
}

impl Default for DispatchTiming {
    fn default() -> Self {
        Self {
            timeout_us: DEFAULT_TIMEOUT_US,
            strobe_setup_us: DEFAULT_STROBE_SETUP_US,
            poll_step_us: DEFAULT_POLL_STEP_US,
        }
    }
}

/// Places command bytes in the mailbox and strobes the host
///
/// Owns the strobe line. Only one command is ever in flight because
/// [`send`](Self::send) does not return until the host consumed the byte or
/// the wait timed out.
pub struct CommandDispatcher<P, D> {
    strobe: P,
    delay: D,
    timing: DispatchTiming,
    command_error: bool,
    status_request: bool,
    sent: u32,
    failed: u32,
}

impl<P: OutputPin, D: DelayNs> CommandDispatcher<P, D> {
    /// Create a dispatcher; the strobe is driven low
    pub fn new(mut strobe: P, delay: D, timing: DispatchTiming) -> Self {
        strobe.set_low();
        Self {
            strobe,
            delay,
            timing,
            command_error: false,
            status_request: false,
            sent: 0,
            failed: 0,
        }
    }

    /// Send a typed command
    pub fn send(
        &mut self,
        region: &SharedRegion,
        command: Command,
        clear_strobe_after: bool,
        request_status_update: bool,
    ) -> Result<(), DispatchError> {
        self.send_byte(
            region,
            command.to_byte(),
            clear_strobe_after,
            request_status_update,
        )
    }

    /// Send a raw command byte
    ///
    /// The command error flag is cleared at the start and set again on any
    /// failure. Nothing is retried. When `clear_strobe_after` is set the
    /// strobe is lowered on both success and timeout; otherwise it stays
    /// high (held jogs).
    pub fn send_byte(
        &mut self,
        region: &SharedRegion,
        byte: u8,
        clear_strobe_after: bool,
        request_status_update: bool,
    ) -> Result<(), DispatchError> {
        self.command_error = false;
        if request_status_update {
            self.status_request = true;
        }

        let timing = self.timing;

        // Don't clobber a host write in progress
        if bounded_wait(&mut self.delay, timing.timeout_us, timing.poll_step_us, || {
            !(region.is_armed() && region.cursor() > 0)
        })
        .is_err()
        {
            return Err(self.fail(DispatchError::BusBusy));
        }

        region.post_mailbox(byte);
        self.delay.delay_us(timing.strobe_setup_us);
        self.strobe.set_high();

        let consumed = bounded_wait(
            &mut self.delay,
            timing.timeout_us,
            timing.poll_step_us,
            || region.cursor() != 0,
        );

        if clear_strobe_after {
            self.strobe.set_low();
        }

        match consumed {
            Ok(_) => {
                self.sent = self.sent.wrapping_add(1);
                Ok(())
            }
            Err(_) => Err(self.fail(DispatchError::Timeout)),
        }
    }

    fn fail(&mut self, err: DispatchError) -> DispatchError {
        self.command_error = true;
        self.failed = self.failed.wrapping_add(1);
        err
    }

    /// Lower the strobe, ending a held jog
    pub fn release_strobe(&mut self) {
        self.strobe.set_low();
    }

    /// Whether the strobe line is currently raised
    pub fn strobe_active(&self) -> bool {
        self.strobe.is_set_high()
    }

    /// Whether the last command failed
    pub fn command_error(&self) -> bool {
        self.command_error
    }

    /// Take the pending status refresh request, if any
    pub fn take_status_request(&mut self) -> bool {
        core::mem::take(&mut self.status_request)
    }

    /// Commands consumed by the host since start-up
    pub fn sent_count(&self) -> u32 {
        self.sent
    }

    /// Commands that failed since start-up
    pub fn failed_count(&self) -> u32 {
        self.failed
    }
}
