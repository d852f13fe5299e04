//! JOG2K Hardware Abstraction Layer
//!
//! Traits the panel logic is written against, implemented per chip.
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  jog2k-core / jog2k-firmware            │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  jog2k-hal (this crate - traits)        │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//!             ┌───────────────┐
//!             │ jog2k-hal-    │
//!             │    rp2040     │
//!             └───────────────┘
//! ```
//!
//! # Traits
//!
//! - [`gpio::OutputPin`], [`gpio::InputPin`] - strobe line, buttons, LEDs
//! - [`flash::FlashStorage`] - persisted settings

#![no_std]
#![deny(unsafe_code)]

pub mod flash;
pub mod gpio;

pub use flash::{FlashError, FlashStorage, StorageKey};
pub use gpio::{InputPin, OutputPin};
