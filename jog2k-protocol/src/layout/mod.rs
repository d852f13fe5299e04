//! Packet layouts
//!
//! A layout knows where each field of a status packet lives in the shared
//! region. Layouts read from a [`RegionSnapshot`] at absolute offsets and
//! refuse to decode unless the host's last write covered the fixed part of
//! the packet.

pub mod v1;
pub mod v2;

use crate::packet::{DecodeError, StatusPacket};
use crate::region::{RegionSnapshot, WriteRecord};

/// Signature of a layout decoder
pub type DecodeFn = fn(&RegionSnapshot, &WriteRecord) -> Result<StatusPacket, DecodeError>;

/// A packet layout
#[derive(Clone, Copy)]
pub struct Layout {
    /// Name for logs
    pub name: &'static str,
    /// Offset of the first payload byte
    pub payload_offset: u8,
    /// Exclusive end of the fixed part (absolute offset)
    pub fixed_end: u16,
    /// Decoder
    pub decode: DecodeFn,
}

impl core::fmt::Debug for Layout {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Layout")
            .field("name", &self.name)
            .field("payload_offset", &self.payload_offset)
            .field("fixed_end", &self.fixed_end)
            .finish()
    }
}

/// Check that `record` covers `start..end`
pub(crate) fn require(record: &WriteRecord, start: usize, end: usize) -> Result<(), DecodeError> {
    if record.covers(start, end) {
        Ok(())
    } else {
        Err(DecodeError::Truncated {
            needed: end as u16,
            written: record.end() as u16,
        })
    }
}
