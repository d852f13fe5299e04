//! Host connection supervision and the status notice

use jog2k_protocol::{StatusCode, StatusPacket, SystemState};

/// Connection to the host as seen from accepted packets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HostLink {
    /// No packet yet, or the host reports no controller connection
    #[default]
    Disconnected,
    Connected,
    /// Reset requested locally or reported by the host
    Resetting,
}

impl HostLink {
    /// Update from a newly accepted packet
    pub fn on_packet(&mut self, packet: &StatusPacket) {
        *self = match packet.status {
            StatusCode::NoConnection => HostLink::Disconnected,
            StatusCode::Reset => HostLink::Resetting,
            _ => HostLink::Connected,
        };
    }

    /// A reset command was sent from the panel
    pub fn on_local_reset(&mut self) {
        *self = HostLink::Resetting;
    }

    /// Whether packet-derived work (LEDs, redraws) should run
    pub fn updates_allowed(&self) -> bool {
        *self != HostLink::Disconnected
    }
}

/// Highest-priority condition the display should show
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Notice {
    Resetting,
    NoConnection,
    Alarm(u8),
    CommandError,
}

impl Notice {
    /// Pick the notice for the current state, if any
    pub fn select(link: HostLink, packet: &StatusPacket, command_error: bool) -> Option<Self> {
        match link {
            HostLink::Resetting => return Some(Notice::Resetting),
            HostLink::Disconnected => return Some(Notice::NoConnection),
            HostLink::Connected => {}
        }
        if packet.state == SystemState::Alarm {
            return Some(Notice::Alarm(packet.alarm));
        }
        command_error.then_some(Notice::CommandError)
    }

    pub fn text(self) -> &'static str {
        match self {
            Notice::Resetting => "RESETTING...",
            Notice::NoConnection => "NO CONNECTION",
            Notice::Alarm(code) => jog2k_protocol::packet::alarm_label(code),
            Notice::CommandError => "COMMAND ERROR",
        }
    }
}
