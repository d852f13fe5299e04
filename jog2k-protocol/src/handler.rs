//! Bus transaction handler
//!
//! Translates responder bus events into region operations. Runs in
//! interrupt context: every method is O(1), never blocks and never fails.
//!
//! ```text
//!            byte received (unarmed)         byte received (armed)
//!   IDLE ───────────────────────────▶ STREAMING ◀─────┐
//!    ▲       cursor = resolve(byte)       │           │ bytes[cursor++] = b
//!    │                                    ├───────────┘
//!    └──────── transaction end ───────────┘
//! ```
//!
//! Reads (`on_byte_requested`) are served in either state from the cursor.

use crate::region::SharedRegion;
use crate::registry::LayoutRegistry;

/// Handler state, derived from the region's `armed` flag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BusState {
    /// Waiting for the addressing byte of a transaction
    Idle,
    /// Address consumed; data bytes go to the cursor
    Streaming,
}

/// Bytes handed to the bus before the host clocked them out
///
/// Returned by [`BusHandler::stage`]; give it back to
/// [`BusHandler::unread`] with the count the bus reported as left over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StagedRead {
    epoch: u32,
    len: u8,
}

impl StagedRead {
    pub fn len(&self) -> usize {
        self.len as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// Drives a [`SharedRegion`] from bus events
#[derive(Clone, Copy)]
pub struct BusHandler<'a> {
    region: &'a SharedRegion,
    registry: &'a LayoutRegistry<'a>,
}

impl<'a> BusHandler<'a> {
    pub fn new(region: &'a SharedRegion, registry: &'a LayoutRegistry<'a>) -> Self {
        Self { region, registry }
    }

    pub fn region(&self) -> &'a SharedRegion {
        self.region
    }

    pub fn state(&self) -> BusState {
        if self.region.is_armed() {
            BusState::Streaming
        } else {
            BusState::Idle
        }
    }

    /// The host wrote a byte
    pub fn on_byte_received(&self, byte: u8) {
        if self.region.is_armed() {
            self.region.write_next(byte);
        } else {
            let start = self.registry.resolve_address(byte);
            self.region.arm(byte, start);
        }
    }

    /// The host is reading a byte
    pub fn on_byte_requested(&self) -> u8 {
        self.region.read_next()
    }

    /// Stop or repeated start seen on the bus
    pub fn on_transaction_end(&self) {
        self.region.finish();
    }

    /// Feed a whole received write, as delivered by block-oriented
    /// responder peripherals
    pub fn receive(&self, bytes: &[u8]) {
        for &byte in bytes {
            self.on_byte_received(byte);
        }
    }

    /// Fill `buf` with the bytes a host read would clock out
    pub fn fill(&self, buf: &mut [u8]) {
        for slot in buf.iter_mut() {
            *slot = self.on_byte_requested();
        }
    }

    /// Fill `buf` ahead of the host and remember which mailbox it was
    /// staged from
    ///
    /// At most 255 bytes may be staged at once.
    pub fn stage(&self, buf: &mut [u8]) -> StagedRead {
        let epoch = self.region.mailbox_epoch();
        let len = buf.len().min(u8::MAX as usize);
        self.fill(&mut buf[..len]);
        StagedRead {
            epoch,
            len: len as u8,
        }
    }

    /// Give back the `leftover` staged bytes the host never read
    ///
    /// Does nothing if a command was posted since the bytes were staged.
    pub fn unread(&self, staged: StagedRead, leftover: usize) -> bool {
        let count = leftover.min(staged.len()) as u8;
        count == 0 || self.region.retract(count, staged.epoch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::DEFAULT_REGISTRY;
    use proptest::prelude::*;

    #[test]
    fn test_version_tag_sets_cursor_to_one() {
        let region = SharedRegion::new();
        let bus = BusHandler::new(&region, &DEFAULT_REGISTRY);

        bus.on_byte_received(0x02);
        assert_eq!(bus.state(), BusState::Streaming);
        assert_eq!(region.cursor(), 1);
    }

    #[test]
    fn test_raw_address() {
        let region = SharedRegion::new();
        let bus = BusHandler::new(&region, &DEFAULT_REGISTRY);

        bus.on_byte_received(0x10);
        assert_eq!(region.cursor(), 0x10);
        bus.on_byte_received(0xAA);
        assert_eq!(region.peek(0x10), 0xAA);
        assert_eq!(region.cursor(), 0x11);
    }

    #[test]
    fn test_transaction_end_rearms_addressing() {
        let region = SharedRegion::new();
        let bus = BusHandler::new(&region, &DEFAULT_REGISTRY);

        bus.receive(&[0x20, 1, 2, 3]);
        bus.on_transaction_end();
        assert_eq!(bus.state(), BusState::Idle);
        assert_eq!(region.cursor(), 0x23);

        // Next byte is an address again, not data at 0x23
        bus.on_byte_received(0x40);
        assert_eq!(region.cursor(), 0x40);
        assert_eq!(region.peek(0x23), 0);
    }

    #[test]
    fn test_read_while_unarmed() {
        let region = SharedRegion::new();
        region.post_mailbox(b'R');
        let bus = BusHandler::new(&region, &DEFAULT_REGISTRY);

        assert_eq!(bus.on_byte_requested(), b'R');
        assert_eq!(region.cursor(), 1);
        assert_eq!(bus.state(), BusState::Idle);
    }

    #[test]
    fn test_write_then_read_same_transaction() {
        let region = SharedRegion::new();
        let bus = BusHandler::new(&region, &DEFAULT_REGISTRY);

        bus.receive(&[0x30, 9, 8]);
        bus.on_transaction_end();
        bus.on_byte_received(0x30);

        let mut buf = [0u8; 2];
        bus.fill(&mut buf);
        bus.on_transaction_end();
        assert_eq!(buf, [9, 8]);
    }

    #[test]
    fn test_unread_restores_cursor() {
        let region = SharedRegion::new();
        region.post_mailbox(b'?');
        let bus = BusHandler::new(&region, &DEFAULT_REGISTRY);

        let mut chunk = [0u8; 4];
        let staged = bus.stage(&mut chunk);
        assert_eq!(staged.len(), 4);
        assert_eq!(chunk[0], b'?');
        assert!(bus.unread(staged, 3));
        bus.on_transaction_end();
        assert_eq!(region.cursor(), 1);
    }

    #[test]
    fn test_unread_leaves_reposted_mailbox_alone() {
        let region = SharedRegion::new();
        region.post_mailbox(0x81);
        let bus = BusHandler::new(&region, &DEFAULT_REGISTRY);

        let mut chunk = [0u8; 4];
        let staged = bus.stage(&mut chunk);
        region.post_mailbox(0x82);

        assert!(!bus.unread(staged, 3));
        bus.on_transaction_end();
        assert_eq!(region.cursor(), 0);
        assert_eq!(bus.on_byte_requested(), 0x82);
    }

    proptest! {
        #[test]
        fn prop_nth_write_lands_at_start_plus_n(start in any::<u8>(), data in proptest::collection::vec(any::<u8>(), 1..300)) {
            prop_assume!(start != 0x02);
            let region = SharedRegion::new();
            let bus = BusHandler::new(&region, &DEFAULT_REGISTRY);

            bus.on_byte_received(start);
            bus.receive(&data);

            prop_assert_eq!(region.cursor(), start.wrapping_add(data.len() as u8));
            // The last write to each slot wins
            let last = data.len() - 1;
            let slot = start.wrapping_add(last as u8);
            prop_assert_eq!(region.peek(slot), data[last]);
        }

        #[test]
        fn prop_full_lap_returns_cursor(start in any::<u8>()) {
            prop_assume!(start != 0x02);
            let region = SharedRegion::new();
            let bus = BusHandler::new(&region, &DEFAULT_REGISTRY);

            bus.on_byte_received(start);
            for i in 0..=255u8 {
                bus.on_byte_received(i);
            }
            prop_assert_eq!(region.cursor(), start);
        }

        #[test]
        fn prop_addressing_byte(byte in any::<u8>()) {
            let region = SharedRegion::new();
            let bus = BusHandler::new(&region, &DEFAULT_REGISTRY);
            bus.on_byte_received(byte);
            let expected = if byte == 0x02 { 1 } else { byte };
            prop_assert_eq!(region.cursor(), expected);
        }
    }
}
