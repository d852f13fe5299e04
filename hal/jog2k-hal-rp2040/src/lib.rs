//! RP2040-specific HAL for the JOG2K pendant
//!
//! Implements the `jog2k-hal` traits on top of `embassy-rp` and adds the
//! chip-specific glue:
//!
//! - GPIO wrappers for the strobe line, LEDs and panel keys
//! - I2C responder loop driving the protocol bus handler
//! - Flash storage driver (implements `jog2k_hal::FlashStorage`)

#![no_std]

pub mod flash;
pub mod gpio;
pub mod responder;

pub use jog2k_hal::{FlashStorage as FlashStorageTrait, StorageKey};
