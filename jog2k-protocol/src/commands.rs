//! Outbound command bytes
//!
//! The panel places one of these in the mailbox at offset 0 and raises the
//! strobe line; the host reads it back with a plain read.

/// Single-byte commands understood by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Command {
    CycleStart,
    FeedHold,
    Reset,
    Unlock,
    StatusReport,

    FeedOverrideReset,
    FeedOverrideCoarsePlus,
    FeedOverrideCoarseMinus,
    FeedOverrideFinePlus,
    FeedOverrideFineMinus,

    SpindleOverrideReset,
    SpindleOverrideCoarsePlus,
    SpindleOverrideCoarseMinus,
    SpindleOverrideFinePlus,
    SpindleOverrideFineMinus,
    SpindleStop,

    FloodToggle,
    MistToggle,
    Home,
    JogModeCycle,
    JogModifierCycle,

    MacroUp,
    MacroDown,
    MacroLeft,
    MacroRight,
    MacroRaise,
    MacroLower,
    MacroHome,
    MacroSpindle,

    Jog(JogDirection),
}

// Wire format values
const CMD_CYCLE_START: u8 = 0x81;
const CMD_FEED_HOLD: u8 = 0x82;
const CMD_RESET: u8 = 0x7F;
const CMD_UNLOCK: u8 = 0x80;
const CMD_STATUS_REPORT: u8 = b'?';

const CMD_FEED_OVR_RESET: u8 = 0x90;
const CMD_FEED_OVR_COARSE_PLUS: u8 = 0x91;
const CMD_FEED_OVR_COARSE_MINUS: u8 = 0x92;
const CMD_FEED_OVR_FINE_PLUS: u8 = 0x93;
const CMD_FEED_OVR_FINE_MINUS: u8 = 0x94;

const CMD_SPINDLE_OVR_RESET: u8 = 0x99;
const CMD_SPINDLE_OVR_COARSE_PLUS: u8 = 0x9A;
const CMD_SPINDLE_OVR_COARSE_MINUS: u8 = 0x9B;
const CMD_SPINDLE_OVR_FINE_PLUS: u8 = 0x9C;
const CMD_SPINDLE_OVR_FINE_MINUS: u8 = 0x9D;
const CMD_SPINDLE_STOP: u8 = 0x9E;

const CMD_FLOOD: u8 = b'C';
const CMD_MIST: u8 = b'M';
const CMD_HOME: u8 = b'H';
const CMD_JOG_MODE_CYCLE: u8 = b'h';
const CMD_JOG_MODIFIER_CYCLE: u8 = b'm';

const CMD_MACRO_UP: u8 = 0x18;
const CMD_MACRO_DOWN: u8 = 0x19;
const CMD_MACRO_RIGHT: u8 = 0x1A;
const CMD_MACRO_LEFT: u8 = 0x1B;
const CMD_MACRO_RAISE: u8 = 0x7C;
const CMD_MACRO_LOWER: u8 = 0x7D;
const CMD_MACRO_HOME: u8 = 0x8E;
const CMD_MACRO_SPINDLE: u8 = 0x8F;

impl Command {
    /// Parse a command from its wire byte
    pub fn from_byte(byte: u8) -> Option<Self> {
        let command = match byte {
            CMD_CYCLE_START => Command::CycleStart,
            CMD_FEED_HOLD => Command::FeedHold,
            CMD_RESET => Command::Reset,
            CMD_UNLOCK => Command::Unlock,
            CMD_STATUS_REPORT => Command::StatusReport,
            CMD_FEED_OVR_RESET => Command::FeedOverrideReset,
            CMD_FEED_OVR_COARSE_PLUS => Command::FeedOverrideCoarsePlus,
            CMD_FEED_OVR_COARSE_MINUS => Command::FeedOverrideCoarseMinus,
            CMD_FEED_OVR_FINE_PLUS => Command::FeedOverrideFinePlus,
            CMD_FEED_OVR_FINE_MINUS => Command::FeedOverrideFineMinus,
            CMD_SPINDLE_OVR_RESET => Command::SpindleOverrideReset,
            CMD_SPINDLE_OVR_COARSE_PLUS => Command::SpindleOverrideCoarsePlus,
            CMD_SPINDLE_OVR_COARSE_MINUS => Command::SpindleOverrideCoarseMinus,
            CMD_SPINDLE_OVR_FINE_PLUS => Command::SpindleOverrideFinePlus,
            CMD_SPINDLE_OVR_FINE_MINUS => Command::SpindleOverrideFineMinus,
            CMD_SPINDLE_STOP => Command::SpindleStop,
            CMD_FLOOD => Command::FloodToggle,
            CMD_MIST => Command::MistToggle,
            CMD_HOME => Command::Home,
            CMD_JOG_MODE_CYCLE => Command::JogModeCycle,
            CMD_JOG_MODIFIER_CYCLE => Command::JogModifierCycle,
            CMD_MACRO_UP => Command::MacroUp,
            CMD_MACRO_DOWN => Command::MacroDown,
            CMD_MACRO_RIGHT => Command::MacroRight,
            CMD_MACRO_LEFT => Command::MacroLeft,
            CMD_MACRO_RAISE => Command::MacroRaise,
            CMD_MACRO_LOWER => Command::MacroLower,
            CMD_MACRO_HOME => Command::MacroHome,
            CMD_MACRO_SPINDLE => Command::MacroSpindle,
            other => Command::Jog(JogDirection::from_byte(other)?),
        };
        Some(command)
    }

    /// Convert to the wire byte
    pub fn to_byte(self) -> u8 {
        match self {
            Command::CycleStart => CMD_CYCLE_START,
            Command::FeedHold => CMD_FEED_HOLD,
            Command::Reset => CMD_RESET,
            Command::Unlock => CMD_UNLOCK,
            Command::StatusReport => CMD_STATUS_REPORT,
            Command::FeedOverrideReset => CMD_FEED_OVR_RESET,
            Command::FeedOverrideCoarsePlus => CMD_FEED_OVR_COARSE_PLUS,
            Command::FeedOverrideCoarseMinus => CMD_FEED_OVR_COARSE_MINUS,
            Command::FeedOverrideFinePlus => CMD_FEED_OVR_FINE_PLUS,
            Command::FeedOverrideFineMinus => CMD_FEED_OVR_FINE_MINUS,
            Command::SpindleOverrideReset => CMD_SPINDLE_OVR_RESET,
            Command::SpindleOverrideCoarsePlus => CMD_SPINDLE_OVR_COARSE_PLUS,
            Command::SpindleOverrideCoarseMinus => CMD_SPINDLE_OVR_COARSE_MINUS,
            Command::SpindleOverrideFinePlus => CMD_SPINDLE_OVR_FINE_PLUS,
            Command::SpindleOverrideFineMinus => CMD_SPINDLE_OVR_FINE_MINUS,
            Command::SpindleStop => CMD_SPINDLE_STOP,
            Command::FloodToggle => CMD_FLOOD,
            Command::MistToggle => CMD_MIST,
            Command::Home => CMD_HOME,
            Command::JogModeCycle => CMD_JOG_MODE_CYCLE,
            Command::JogModifierCycle => CMD_JOG_MODIFIER_CYCLE,
            Command::MacroUp => CMD_MACRO_UP,
            Command::MacroDown => CMD_MACRO_DOWN,
            Command::MacroRight => CMD_MACRO_RIGHT,
            Command::MacroLeft => CMD_MACRO_LEFT,
            Command::MacroRaise => CMD_MACRO_RAISE,
            Command::MacroLower => CMD_MACRO_LOWER,
            Command::MacroHome => CMD_MACRO_HOME,
            Command::MacroSpindle => CMD_MACRO_SPINDLE,
            Command::Jog(direction) => direction.to_byte(),
        }
    }

    /// Returns true if this is a jog command
    pub fn is_jog(&self) -> bool {
        matches!(self, Command::Jog(_))
    }

    /// Returns true for the real-time override commands
    pub fn is_override(&self) -> bool {
        matches!(self.to_byte(), 0x90..=0x9E)
    }
}

/// Jog directions, including the XY diagonals and the rotary axis
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum JogDirection {
    XRight,
    XLeft,
    YForward,
    YBack,
    ZUp,
    ZDown,
    XRightYForward,
    XRightYBack,
    XLeftYForward,
    XLeftYBack,
    ARight,
    ALeft,
}

impl JogDirection {
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            b'R' => Some(JogDirection::XRight),
            b'L' => Some(JogDirection::XLeft),
            b'F' => Some(JogDirection::YForward),
            b'B' => Some(JogDirection::YBack),
            b'U' => Some(JogDirection::ZUp),
            b'D' => Some(JogDirection::ZDown),
            b'r' => Some(JogDirection::XRightYForward),
            b'q' => Some(JogDirection::XRightYBack),
            b's' => Some(JogDirection::XLeftYForward),
            b't' => Some(JogDirection::XLeftYBack),
            b'A' => Some(JogDirection::ARight),
            b'a' => Some(JogDirection::ALeft),
            _ => None,
        }
    }

    pub fn to_byte(self) -> u8 {
        match self {
            JogDirection::XRight => b'R',
            JogDirection::XLeft => b'L',
            JogDirection::YForward => b'F',
            JogDirection::YBack => b'B',
            JogDirection::ZUp => b'U',
            JogDirection::ZDown => b'D',
            JogDirection::XRightYForward => b'r',
            JogDirection::XRightYBack => b'q',
            JogDirection::XLeftYForward => b's',
            JogDirection::XLeftYBack => b't',
            JogDirection::ARight => b'A',
            JogDirection::ALeft => b'a',
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_values() {
        assert_eq!(Command::CycleStart.to_byte(), 0x81);
        assert_eq!(Command::FeedHold.to_byte(), 0x82);
        assert_eq!(Command::Reset.to_byte(), 0x7F);
        assert_eq!(Command::FloodToggle.to_byte(), b'C');
        assert_eq!(Command::Jog(JogDirection::XLeftYBack).to_byte(), b't');
    }

    #[test]
    fn test_every_byte_parses_back_to_itself() {
        for byte in 0..=255u8 {
            if let Some(command) = Command::from_byte(byte) {
                assert_eq!(command.to_byte(), byte);
            }
        }
    }

    #[test]
    fn test_unknown_byte() {
        assert!(Command::from_byte(0x00).is_none());
        assert!(Command::from_byte(b'Z').is_none());
    }

    #[test]
    fn test_classification() {
        assert!(Command::Jog(JogDirection::ZUp).is_jog());
        assert!(!Command::Home.is_jog());
        assert!(Command::SpindleStop.is_override());
        assert!(Command::FeedOverrideFineMinus.is_override());
        assert!(!Command::CycleStart.is_override());
    }
}
