//! Optimistic status packet reader
//!
//! The region is copied without locking. A copy taken while the host is
//! mid-write (or that a write overlapped) is discarded and the poll is
//! simply repeated on the next loop iteration.

use jog2k_protocol::{DecodeError, LayoutRegistry, SharedRegion, StatusPacket};

/// Result of one poll
#[derive(Debug, Clone, PartialEq)]
pub enum ReadOutcome {
    /// A transaction was in flight; try again later
    Busy,
    /// Nothing new since the last accepted packet
    Unchanged,
    /// A new packet was accepted
    Updated,
    /// The host wrote something that did not decode; the previous packet
    /// is kept
    Rejected(DecodeError),
}

/// Holds the last accepted packet
#[derive(Debug, Clone, Default)]
pub struct PacketReader {
    packet: StatusPacket,
    generation: Option<u32>,
}

impl PacketReader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last accepted packet (defaults until the host writes one)
    pub fn packet(&self) -> &StatusPacket {
        &self.packet
    }

    /// Mutable access for local state overrides, e.g. after a reset command
    pub fn packet_mut(&mut self) -> &mut StatusPacket {
        &mut self.packet
    }

    /// Check the region for a new packet
    pub fn poll(&mut self, region: &SharedRegion, registry: &LayoutRegistry<'_>) -> ReadOutcome {
        let Some(snap) = region.snapshot() else {
            return ReadOutcome::Busy;
        };

        if self.generation == Some(snap.generation) {
            return ReadOutcome::Unchanged;
        }
        self.generation = Some(snap.generation);

        match registry.decode(&snap) {
            Ok(packet) if packet.same_as(&self.packet) => ReadOutcome::Unchanged,
            Ok(packet) => {
                self.packet = packet;
                ReadOutcome::Updated
            }
            Err(DecodeError::NoData) => ReadOutcome::Unchanged,
            Err(err) => ReadOutcome::Rejected(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jog2k_protocol::layout::v2::{offsets, FIXED_END, VERSION_TAG};
    use jog2k_protocol::{BusHandler, StatusCode, SystemState, DEFAULT_REGISTRY};
    use proptest::prelude::*;

    /// v2 packet bytes from offset 1 up to and including the message type
    fn v2_payload(feed_override: u8, x: f32) -> std::vec::Vec<u8> {
        let mut bytes = vec![0u8; FIXED_END + 1];
        bytes[offsets::STATE] = 5;
        bytes[offsets::FEED_OVERRIDE] = feed_override;
        bytes[offsets::SPINDLE_OVERRIDE] = feed_override;
        bytes[offsets::X..offsets::X + 4].copy_from_slice(&x.to_le_bytes());
        bytes[offsets::A..offsets::A + 4].copy_from_slice(&f32::NAN.to_le_bytes());
        bytes.remove(0);
        bytes
    }

    fn host_write(bus: &BusHandler<'_>, payload: &[u8]) {
        bus.on_byte_received(VERSION_TAG);
        bus.receive(payload);
        bus.on_transaction_end();
    }

    #[test]
    fn test_no_data_is_unchanged() {
        let region = SharedRegion::new();
        let mut reader = PacketReader::new();
        assert_eq!(reader.poll(&region, &DEFAULT_REGISTRY), ReadOutcome::Unchanged);
        assert_eq!(reader.packet().status, StatusCode::NoConnection);
    }

    #[test]
    fn test_update_then_unchanged() {
        let region = SharedRegion::new();
        let bus = BusHandler::new(&region, &DEFAULT_REGISTRY);
        let mut reader = PacketReader::new();

        host_write(&bus, &v2_payload(120, 1.5));
        assert_eq!(reader.poll(&region, &DEFAULT_REGISTRY), ReadOutcome::Updated);
        assert_eq!(reader.packet().feed_override, 120);
        assert_eq!(reader.packet().state, SystemState::Idle);
        assert_eq!(reader.poll(&region, &DEFAULT_REGISTRY), ReadOutcome::Unchanged);

        // Same content again, new generation
        host_write(&bus, &v2_payload(120, 1.5));
        assert_eq!(reader.poll(&region, &DEFAULT_REGISTRY), ReadOutcome::Unchanged);
    }

    #[test]
    fn test_skips_while_armed() {
        let region = SharedRegion::new();
        let bus = BusHandler::new(&region, &DEFAULT_REGISTRY);
        let mut reader = PacketReader::new();

        let payload = v2_payload(80, 0.0);
        bus.on_byte_received(VERSION_TAG);
        bus.receive(&payload[..10]);
        assert_eq!(reader.poll(&region, &DEFAULT_REGISTRY), ReadOutcome::Busy);
        assert_eq!(reader.packet().feed_override, 0);

        bus.receive(&payload[10..]);
        bus.on_transaction_end();
        assert_eq!(reader.poll(&region, &DEFAULT_REGISTRY), ReadOutcome::Updated);
        assert_eq!(reader.packet().feed_override, 80);
    }

    #[test]
    fn test_short_write_keeps_previous_packet() {
        let region = SharedRegion::new();
        let bus = BusHandler::new(&region, &DEFAULT_REGISTRY);
        let mut reader = PacketReader::new();

        host_write(&bus, &v2_payload(90, 0.0));
        reader.poll(&region, &DEFAULT_REGISTRY);

        host_write(&bus, &[5, 0, 0]);
        assert!(matches!(
            reader.poll(&region, &DEFAULT_REGISTRY),
            ReadOutcome::Rejected(DecodeError::Truncated { .. })
        ));
        assert_eq!(reader.packet().feed_override, 90);
    }

    #[test]
    fn test_command_read_does_not_report_update() {
        let region = SharedRegion::new();
        let bus = BusHandler::new(&region, &DEFAULT_REGISTRY);
        let mut reader = PacketReader::new();

        host_write(&bus, &v2_payload(100, 0.0));
        reader.poll(&region, &DEFAULT_REGISTRY);

        // Host picks up a command byte from the mailbox
        region.post_mailbox(0x81);
        assert_eq!(bus.on_byte_requested(), 0x81);
        bus.on_transaction_end();
        assert_eq!(reader.poll(&region, &DEFAULT_REGISTRY), ReadOutcome::Unchanged);
    }

    #[test]
    fn test_concurrent_writer_never_tears() {
        let region = SharedRegion::new();
        let bus = BusHandler::new(&region, &DEFAULT_REGISTRY);

        std::thread::scope(|scope| {
            scope.spawn(|| {
                for round in 0..2_000u32 {
                    let value = (round % 200) as u8 + 1;
                    host_write(&bus, &v2_payload(value, value as f32));
                }
            });

            let mut reader = PacketReader::new();
            for _ in 0..20_000 {
                if reader.poll(&region, &DEFAULT_REGISTRY) == ReadOutcome::Updated {
                    let packet = reader.packet();
                    assert_eq!(packet.feed_override, packet.spindle_override);
                    assert_eq!(packet.position.x, packet.feed_override as f32);
                }
            }
        });
    }

    proptest! {
        #[test]
        fn prop_read_during_write_is_skipped(split in 0usize..40, value in 1u8..=200) {
            let region = SharedRegion::new();
            let bus = BusHandler::new(&region, &DEFAULT_REGISTRY);
            let mut reader = PacketReader::new();
            let payload = v2_payload(value, 0.0);

            bus.on_byte_received(VERSION_TAG);
            bus.receive(&payload[..split]);
            prop_assert_eq!(reader.poll(&region, &DEFAULT_REGISTRY), ReadOutcome::Busy);
            prop_assert_eq!(reader.packet().feed_override, 0);

            bus.receive(&payload[split..]);
            bus.on_transaction_end();
            prop_assert_eq!(reader.poll(&region, &DEFAULT_REGISTRY), ReadOutcome::Updated);
            prop_assert_eq!(reader.packet().feed_override, value);
        }
    }
}
