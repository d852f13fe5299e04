//! Board-agnostic panel logic for the JOG2K pendant firmware
//!
//! Everything here runs on the host in tests:
//!
//! - [`dispatch`] - bounded waits and the command/strobe handshake
//! - [`panel`] - packet polling, host link, keypad, jog chords, ticks
//! - [`config`] - panel configuration and persisted settings

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod config;
pub mod dispatch;
pub mod panel;
