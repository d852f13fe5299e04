//! Version tag registry
//!
//! The first byte of every host write is either a version tag or a raw
//! address. The registry decides which: a registered tag selects a layout
//! and places the cursor at that layout's payload offset; anything else is
//! taken literally as the start address and decoded with the legacy layout.

use crate::layout::{v1, v2, Layout};
use crate::packet::{DecodeError, StatusPacket};
use crate::region::RegionSnapshot;

/// Layout registered under a version tag
#[derive(Debug, Clone, Copy)]
pub struct VersionedLayout {
    pub tag: u8,
    pub layout: Layout,
}

/// Maps version tags to packet layouts
#[derive(Debug, Clone, Copy)]
pub struct LayoutRegistry<'a> {
    versioned: &'a [VersionedLayout],
    legacy: Option<Layout>,
}

const DEFAULT_VERSIONS: &[VersionedLayout] = &[VersionedLayout {
    tag: v2::VERSION_TAG,
    layout: v2::LAYOUT,
}];

/// Registry with the canonical v2 layout and the legacy fallback
pub static DEFAULT_REGISTRY: LayoutRegistry<'static> =
    LayoutRegistry::new(DEFAULT_VERSIONS, Some(v1::LAYOUT));

impl<'a> LayoutRegistry<'a> {
    /// Create a registry
    pub const fn new(versioned: &'a [VersionedLayout], legacy: Option<Layout>) -> Self {
        Self { versioned, legacy }
    }

    /// Layout registered for `tag`
    pub fn lookup(&self, tag: u8) -> Option<&Layout> {
        self.versioned
            .iter()
            .find(|entry| entry.tag == tag)
            .map(|entry| &entry.layout)
    }

    /// Where the cursor goes after the host's addressing byte
    ///
    /// Called from the bus handler: O(1) for the handful of registered tags
    /// and never fails.
    pub fn resolve_address(&self, first_byte: u8) -> u8 {
        match self.lookup(first_byte) {
            Some(layout) => layout.payload_offset,
            None => first_byte,
        }
    }

    /// Decode the packet from the host's last write
    pub fn decode(&self, snap: &RegionSnapshot) -> Result<StatusPacket, DecodeError> {
        let record = snap.last_write.ok_or(DecodeError::NoData)?;

        let layout = match self.lookup(record.tag) {
            Some(layout) => layout,
            None => self
                .legacy
                .as_ref()
                .ok_or(DecodeError::UnsupportedVersion(record.tag))?,
        };

        (layout.decode)(snap, &record)
    }
}
