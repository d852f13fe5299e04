//! JOG2K Responder Protocol
//!
//! This crate defines the I2C protocol between a CNC host (the bus
//! controller) and the JOG2K pendant (the bus responder). The two sides
//! share a 256-byte memory window addressed with an auto-incrementing
//! cursor.
//!
//! # Protocol Overview
//!
//! Host writes carry a status packet:
//! ```text
//! ┌────────────────┬───────────────────────────────────────────┐
//! │ ADDR / VERSION │ DATA (streamed to cursor, wraps at 256)   │
//! │ 1B             │ 0–256B                                    │
//! └────────────────┴───────────────────────────────────────────┘
//! ```
//!
//! A first byte equal to a registered version tag (`0x02`) places the
//! payload at offset 1 and selects the matching layout. Any other first
//! byte is a raw address and the payload is decoded with the legacy layout.
//!
//! The pendant answers with single command bytes: it posts the byte at
//! offset 0, rewinds the cursor and raises a strobe line; the host then
//! reads one byte.

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod commands;
pub mod handler;
pub mod layout;
pub mod packet;
pub mod region;
pub mod registry;

pub use commands::{Command, JogDirection};
pub use handler::{BusHandler, BusState, StagedRead};
pub use packet::{DecodeError, HostMessage, StatusCode, StatusPacket, SystemState};
pub use region::{RegionSnapshot, SharedRegion, WriteRecord, REGION_SIZE};
pub use registry::{LayoutRegistry, DEFAULT_REGISTRY};
