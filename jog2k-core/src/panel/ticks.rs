//! Periodic tick counters
//!
//! Advanced from the periodic timer; the panel loop consumes the flags.

/// Tick-driven countdowns
#[derive(Debug, Clone)]
pub struct TickCounters {
    heartbeat: u16,
    heartbeat_period: u16,
    heartbeat_due: bool,
    status_request: u16,
    status_request_period: u16,
    led_update: u16,
    led_update_period: u16,
    led_update_due: bool,
}

impl TickCounters {
    pub fn new(heartbeat_period: u16, status_request_period: u16, led_update_period: u16) -> Self {
        Self {
            heartbeat: heartbeat_period,
            heartbeat_period,
            heartbeat_due: false,
            status_request: status_request_period,
            status_request_period,
            led_update: led_update_period,
            led_update_period,
            led_update_due: false,
        }
    }

    /// Advance by one tick
    pub fn tick(&mut self) {
        if self.heartbeat == 0 {
            self.heartbeat = self.heartbeat_period;
            self.heartbeat_due = true;
        } else {
            self.heartbeat -= 1;
        }

        self.status_request = self.status_request.saturating_sub(1);

        self.led_update = self.led_update.saturating_sub(1);
        if self.led_update == 0 {
            self.led_update = self.led_update_period;
            self.led_update_due = true;
        }
    }

    /// Heartbeat LED should toggle
    pub fn take_heartbeat(&mut self) -> bool {
        core::mem::take(&mut self.heartbeat_due)
    }

    /// LEDs should be refreshed from the packet
    pub fn take_led_update(&mut self) -> bool {
        core::mem::take(&mut self.led_update_due)
    }

    /// A periodic forced refresh is due; restarts the countdown when it is
    pub fn take_status_request(&mut self) -> bool {
        if self.status_request == 0 {
            self.status_request = self.status_request_period;
            true
        } else {
            false
        }
    }
}
