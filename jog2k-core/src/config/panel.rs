//! Panel configuration
//!
//! Timing and bus parameters. The firmware build validates `panel.toml`
//! against these types and bakes the result in as a constant; `Default`
//! holds the stock values.

use serde::{Deserialize, Serialize};

use crate::dispatch::DispatchTiming;

/// Lowest 7-bit address that is not reserved
pub const MIN_RESPONDER_ADDRESS: u8 = 0x08;

/// Highest 7-bit address that is not reserved
pub const MAX_RESPONDER_ADDRESS: u8 = 0x77;

/// Stock responder address
pub const DEFAULT_RESPONDER_ADDRESS: u8 = 0x49;

/// Configuration validation errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Responder address is in a reserved range
    ReservedAddress(u8),
    /// Bus frequency outside 10 kHz - 1 MHz
    BusFrequency(u32),
    /// A tick or timeout value is zero
    ZeroPeriod,
    /// Transition clamp minimum above maximum
    TransitionRange,
}

/// Panel configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[serde(default)]
pub struct PanelConfig {
    /// 7-bit I2C responder address
    pub responder_address: u8,
    /// Bus clock the host drives, in Hz
    ///
    /// The responder follows the host's clock, so this is not programmed
    /// into the peripheral. It is range-checked and logged at start-up so a
    /// mismatched host setup shows up in the boot log.
    pub bus_frequency_hz: u32,

    /// Budget for each handshake wait (µs)
    pub dispatch_timeout_us: u32,
    /// Delay between posting a command and raising the strobe (µs)
    pub strobe_setup_us: u32,
    /// Handshake polling step (µs)
    pub poll_step_us: u32,

    /// Period of the panel tick (ms)
    pub tick_ms: u32,
    /// Ticks between forced status refreshes while idle
    pub status_request_ticks: u16,
    /// Ticks between indicator refreshes
    pub led_update_ticks: u16,
    /// Ticks per heartbeat LED toggle
    pub heartbeat_ticks: u16,
    /// Ticks a jog chord must settle before it is sent
    pub rollover_ticks: u8,
    /// Lower clamp of the jog transition delay (ticks)
    pub transition_min_ticks: u16,
    /// Upper clamp of the jog transition delay (ticks)
    pub transition_max_ticks: u16,
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            responder_address: DEFAULT_RESPONDER_ADDRESS,
            bus_frequency_hz: 100_000,
            dispatch_timeout_us: 100_000,
            strobe_setup_us: 1_000,
            poll_step_us: 1,
            tick_ms: 10,
            status_request_ticks: 100,
            led_update_ticks: 10,
            heartbeat_ticks: 20,
            rollover_ticks: 7,
            transition_min_ticks: 30,
            transition_max_ticks: 250,
        }
    }
}

impl PanelConfig {
    /// Check that every value is usable
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(MIN_RESPONDER_ADDRESS..=MAX_RESPONDER_ADDRESS).contains(&self.responder_address) {
            return Err(ConfigError::ReservedAddress(self.responder_address));
        }
        if !(10_000..=1_000_000).contains(&self.bus_frequency_hz) {
            return Err(ConfigError::BusFrequency(self.bus_frequency_hz));
        }
        if self.dispatch_timeout_us == 0
            || self.tick_ms == 0
            || self.status_request_ticks == 0
            || self.led_update_ticks == 0
            || self.heartbeat_ticks == 0
        {
            return Err(ConfigError::ZeroPeriod);
        }
        if self.transition_min_ticks > self.transition_max_ticks {
            return Err(ConfigError::TransitionRange);
        }
        Ok(())
    }

    /// Handshake timing for the command dispatcher
    pub fn dispatch_timing(&self) -> DispatchTiming {
        DispatchTiming {
            timeout_us: self.dispatch_timeout_us,
            strobe_setup_us: self.strobe_setup_us,
            poll_step_us: self.poll_step_us,
        }
    }
}

/// Cut `line` to at most `width` characters for fixed-width diagnostics
///
/// Returns the kept prefix and whether anything was cut. Never splits a
/// multi-byte character.
pub fn clip_line(line: &str, width: usize) -> (&str, bool) {
    match line.char_indices().nth(width) {
        Some((end, _)) => (&line[..end], true),
        None => (line, false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = PanelConfig::default();
        assert_eq!(config.validate(), Ok(()));
        assert_eq!(config.responder_address, 0x49);
        assert_eq!(config.dispatch_timing(), DispatchTiming::default());
    }

    #[test]
    fn test_reserved_address_rejected() {
        let config = PanelConfig {
            responder_address: 0x03,
            ..PanelConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::ReservedAddress(0x03)));
    }

    #[test]
    fn test_transition_range() {
        let config = PanelConfig {
            transition_min_ticks: 300,
            ..PanelConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::TransitionRange));
    }

    #[test]
    fn test_zero_tick_rejected() {
        let config = PanelConfig {
            tick_ms: 0,
            ..PanelConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::ZeroPeriod));
    }

    #[test]
    fn test_bus_frequency_range() {
        let config = PanelConfig {
            bus_frequency_hz: 2_000_000,
            ..PanelConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::BusFrequency(2_000_000)));
    }

    #[test]
    fn test_clip_line_ascii() {
        assert_eq!(clip_line("short", 61), ("short", false));
        assert_eq!(clip_line("abcdef", 6), ("abcdef", false));
        assert_eq!(clip_line("abcdefg", 6), ("abcdef", true));
    }

    #[test]
    fn test_clip_line_multibyte() {
        // 'é' is two bytes; a byte-indexed cut at 61 would land inside one
        let line = "é".repeat(40);
        let (kept, cut) = clip_line(&line, 31);
        assert!(cut);
        assert_eq!(kept.chars().count(), 31);
        assert_eq!(kept.len(), 62);
    }
}
