//! Canonical packet layout, selected by version tag `0x02`
//!
//! ```text
//!  0  tag/mailbox   1  state        2  status       3  alarm
//!  4  modes         5  coolant      6  feed ovr     7  spindle ovr
//!  8  spindle stop  9  jog mode    10  wcs         11  reserved
//! 12  spindle rpm (i32)            16  feed rate (f32)
//! 20  jog step (f32)               24  x   28  y   32  z   36  a (f32)
//! 40  message type                 41.. message text
//! ```
//!
//! All multi-byte fields are little-endian.

use super::{require, Layout};
use crate::packet::{
    CoolantState, Coordinates, DecodeError, HostMessage, JogSettings, MachineModes, SpindleStop,
    StatusCode, StatusPacket, SystemState, Wcs,
};
use crate::region::{RegionSnapshot, WriteRecord};

/// Version tag that selects this layout
pub const VERSION_TAG: u8 = 0x02;

/// Absolute field offsets
pub mod offsets {
    pub const STATE: usize = 1;
    pub const STATUS: usize = 2;
    pub const ALARM: usize = 3;
    pub const MODES: usize = 4;
    pub const COOLANT: usize = 5;
    pub const FEED_OVERRIDE: usize = 6;
    pub const SPINDLE_OVERRIDE: usize = 7;
    pub const SPINDLE_STOP: usize = 8;
    pub const JOG_MODE: usize = 9;
    pub const WCS: usize = 10;
    pub const SPINDLE_RPM: usize = 12;
    pub const FEED_RATE: usize = 16;
    pub const JOG_STEP: usize = 20;
    pub const X: usize = 24;
    pub const Y: usize = 28;
    pub const Z: usize = 32;
    pub const A: usize = 36;
    pub const MSG_TYPE: usize = 40;
    pub const MSG_TEXT: usize = 41;
}

/// Offset of the first payload byte
pub const PAYLOAD_OFFSET: u8 = 1;

/// Exclusive end of the fixed part
pub const FIXED_END: usize = offsets::MSG_TYPE;

/// Layout descriptor for the registry
pub const LAYOUT: Layout = Layout {
    name: "v2",
    payload_offset: PAYLOAD_OFFSET,
    fixed_end: FIXED_END as u16,
    decode,
};

/// Decode a v2 packet
pub fn decode(snap: &RegionSnapshot, record: &WriteRecord) -> Result<StatusPacket, DecodeError> {
    use offsets::*;

    require(record, PAYLOAD_OFFSET as usize, FIXED_END)?;
    let b = &snap.bytes;

    // Message region is optional and only trusted as far as it was written
    let written_end = record.end();
    let message = if written_end > MSG_TYPE {
        let text_end = written_end.max(MSG_TEXT);
        HostMessage::decode(b[MSG_TYPE], &b[MSG_TEXT..text_end])
    } else {
        HostMessage::None
    };

    Ok(StatusPacket {
        version: Some(VERSION_TAG),
        state: SystemState::from_byte(b[STATE]),
        status: StatusCode::from_byte(b[STATUS]),
        alarm: b[ALARM],
        modes: MachineModes::from_byte(b[MODES]),
        coolant: CoolantState(b[COOLANT]),
        feed_override: b[FEED_OVERRIDE],
        spindle_override: b[SPINDLE_OVERRIDE],
        spindle_stop: SpindleStop(b[SPINDLE_STOP]),
        jog: JogSettings::from_byte(b[JOG_MODE]),
        wcs: Wcs(b[WCS]),
        spindle_rpm: snap.i32_at(SPINDLE_RPM),
        feed_rate: snap.f32_at(FEED_RATE),
        jog_step_size: snap.f32_at(JOG_STEP),
        position: Coordinates {
            x: snap.f32_at(X),
            y: snap.f32_at(Y),
            z: snap.f32_at(Z),
            a: snap.f32_at(A),
        },
        message,
    })
}
