//! Legacy keypad packet, used when the first byte is a raw address
//!
//! Field offsets follow the natural alignment of the legacy keypad
//! structure overlaid on the region. Byte 0 is the address itself, so the
//! payload the host streams starts at offset 1.

use super::{require, Layout};
use crate::packet::{
    CoolantState, Coordinates, DecodeError, HostMessage, JogSettings, MachineMode, MachineModes,
    SpindleStop, StatusCode, StatusPacket, SystemState, Wcs,
};
use crate::region::{RegionSnapshot, WriteRecord};

/// Absolute field offsets
pub mod offsets {
    /// bits 0-3 state, bits 4-6 machine mode, bit 7 disconnected
    pub const MACHINE_STATE: usize = 1;
    pub const ALARM: usize = 2;
    pub const HOME_STATE: usize = 3;
    pub const FEED_OVERRIDE: usize = 4;
    pub const SPINDLE_OVERRIDE: usize = 5;
    pub const SPINDLE_STOP: usize = 6;
    pub const SPINDLE_RPM: usize = 8;
    pub const FEED_RATE: usize = 12;
    pub const COOLANT: usize = 16;
    pub const JOG_MODE: usize = 17;
    pub const JOG_STEP: usize = 20;
    pub const WCS: usize = 24;
    pub const X: usize = 28;
    pub const Y: usize = 32;
    pub const Z: usize = 36;
    pub const A: usize = 40;
}

pub const PAYLOAD_OFFSET: u8 = 1;

/// Size of the legacy structure
pub const FIXED_END: usize = 44;

const DISCONNECTED_BIT: u8 = 0x80;

/// Layout descriptor for the registry
pub const LAYOUT: Layout = Layout {
    name: "v1-legacy",
    payload_offset: PAYLOAD_OFFSET,
    fixed_end: FIXED_END as u16,
    decode,
};

/// Decode a legacy packet
pub fn decode(snap: &RegionSnapshot, record: &WriteRecord) -> Result<StatusPacket, DecodeError> {
    use offsets::*;

    require(record, PAYLOAD_OFFSET as usize, FIXED_END)?;
    let b = &snap.bytes;

    let machine_state = b[MACHINE_STATE];
    let status = if machine_state & DISCONNECTED_BIT != 0 {
        StatusCode::NoConnection
    } else {
        StatusCode::Ok
    };

    let modes = MachineModes {
        homed: b[HOME_STATE] != 0,
        mode: MachineMode::from_bits((machine_state >> 4) & 0x07),
        ..MachineModes::default()
    };

    Ok(StatusPacket {
        version: None,
        state: SystemState::from_byte(machine_state & 0x0F),
        status,
        alarm: b[ALARM],
        modes,
        coolant: CoolantState(b[COOLANT]),
        feed_override: b[FEED_OVERRIDE],
        spindle_override: b[SPINDLE_OVERRIDE],
        spindle_stop: SpindleStop(b[SPINDLE_STOP]),
        jog: JogSettings::from_byte(b[JOG_MODE]),
        // Enum stored as a 32-bit value; only the low byte is meaningful
        wcs: Wcs(snap.u32_at(WCS).min(u8::MAX as u32) as u8),
        spindle_rpm: snap.i32_at(SPINDLE_RPM),
        feed_rate: snap.f32_at(FEED_RATE),
        jog_step_size: snap.f32_at(JOG_STEP),
        position: Coordinates {
            x: snap.f32_at(X),
            y: snap.f32_at(Y),
            z: snap.f32_at(Z),
            a: snap.f32_at(A),
        },
        message: HostMessage::None,
    })
}
