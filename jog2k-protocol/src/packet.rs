//! Typed view of the host status packet
//!
//! Layout-independent: every registered layout decodes into
//! [`StatusPacket`].

use heapless::Vec;

/// Longest text message the host can attach to a packet
pub const MAX_MESSAGE_LEN: usize = 127;

/// Errors from decoding a status packet out of the region
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DecodeError {
    /// The host has not written anything yet
    NoData,
    /// The last write did not cover the fixed part of the layout
    Truncated {
        /// Exclusive end offset the layout needs
        needed: u16,
        /// Exclusive end offset the host actually wrote
        written: u16,
    },
    /// No layout is registered for the tag and there is no legacy fallback
    UnsupportedVersion(u8),
}

/// Controller state machine state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SystemState {
    #[default]
    Undefined,
    Alarm,
    Cycle,
    Hold,
    ToolChange,
    Idle,
    Homing,
    Jog,
    Reset,
}

impl SystemState {
    /// Parse from the wire value; unknown values map to `Undefined`
    pub fn from_byte(byte: u8) -> Self {
        match byte {
            1 => SystemState::Alarm,
            2 => SystemState::Cycle,
            3 => SystemState::Hold,
            4 => SystemState::ToolChange,
            5 => SystemState::Idle,
            6 => SystemState::Homing,
            7 => SystemState::Jog,
            8 => SystemState::Reset,
            _ => SystemState::Undefined,
        }
    }

    /// Short label for the status line
    pub fn label(self) -> &'static str {
        match self {
            SystemState::Undefined => "UNKNOWN",
            SystemState::Alarm => "ALARM",
            SystemState::Cycle => "RUN",
            SystemState::Hold => "HOLD",
            SystemState::ToolChange => "TOOL",
            SystemState::Idle => "IDLE",
            SystemState::Homing => "HOMING",
            SystemState::Jog => "JOG",
            SystemState::Reset => "RESET",
        }
    }
}

// Status code wire values
const STATUS_OK: u8 = 0;
const STATUS_RESET: u8 = 252;
const STATUS_NO_CONNECTION: u8 = 253;

/// Status code reported alongside the state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StatusCode {
    Ok,
    /// Controller is resetting
    Reset,
    /// The host has lost its controller connection
    #[default]
    NoConnection,
    /// Any other controller status code
    Other(u8),
}

impl StatusCode {
    /// Parse from the wire value
    pub fn from_byte(byte: u8) -> Self {
        match byte {
            STATUS_OK => StatusCode::Ok,
            STATUS_RESET => StatusCode::Reset,
            STATUS_NO_CONNECTION => StatusCode::NoConnection,
            other => StatusCode::Other(other),
        }
    }

    /// Convert to the wire value
    pub fn to_byte(self) -> u8 {
        match self {
            StatusCode::Ok => STATUS_OK,
            StatusCode::Reset => STATUS_RESET,
            StatusCode::NoConnection => STATUS_NO_CONNECTION,
            StatusCode::Other(other) => other,
        }
    }
}

/// Machine kinematics mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MachineMode {
    #[default]
    Normal,
    Laser,
    Lathe,
    Other(u8),
}

impl MachineMode {
    pub fn from_bits(bits: u8) -> Self {
        match bits {
            0 => MachineMode::Normal,
            1 => MachineMode::Laser,
            2 => MachineMode::Lathe,
            other => MachineMode::Other(other),
        }
    }
}

/// Packed machine mode flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MachineModes {
    /// Lathe reports X as a diameter
    pub diameter: bool,
    /// Controller is in MPG mode
    pub mpg: bool,
    /// All axes homed
    pub homed: bool,
    /// Tool length offset has been referenced
    pub tlo_referenced: bool,
    /// Positions are reported in inches
    pub imperial: bool,
    pub mode: MachineMode,
}

impl MachineModes {
    /// Unpack the v2 flag byte
    pub fn from_byte(byte: u8) -> Self {
        Self {
            diameter: byte & 0x01 != 0,
            mpg: byte & 0x02 != 0,
            homed: byte & 0x04 != 0,
            tlo_referenced: byte & 0x08 != 0,
            imperial: byte & 0x10 != 0,
            mode: MachineMode::from_bits(byte >> 5),
        }
    }
}

/// Coolant outputs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CoolantState(pub u8);

impl CoolantState {
    pub fn flood(self) -> bool {
        self.0 & 0x01 != 0
    }

    pub fn mist(self) -> bool {
        self.0 & 0x02 != 0
    }

    pub fn shower(self) -> bool {
        self.0 & 0x04 != 0
    }

    pub fn through_spindle(self) -> bool {
        self.0 & 0x08 != 0
    }

    /// Any coolant output is on
    pub fn any(self) -> bool {
        self.0 & 0x0F != 0
    }
}

/// Spindle stop override flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SpindleStop(pub u8);

impl SpindleStop {
    pub fn enabled(self) -> bool {
        self.0 & 0x01 != 0
    }
}

/// Jog speed mode selected on the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum JogMode {
    #[default]
    Fast,
    Slow,
    Step,
    Other(u8),
}

/// Jog distance/speed multiplier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum JogModifier {
    #[default]
    One,
    Tenth,
    Hundredth,
    Other(u8),
}

impl JogModifier {
    /// Multiplier applied to the jog step; unknown modifiers count as 1
    pub fn factor(self) -> f32 {
        match self {
            JogModifier::One | JogModifier::Other(_) => 1.0,
            JogModifier::Tenth => 0.1,
            JogModifier::Hundredth => 0.01,
        }
    }
}

/// Jog mode byte: low nibble modifier, high nibble mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct JogSettings {
    pub mode: JogMode,
    pub modifier: JogModifier,
}

impl JogSettings {
    pub fn from_byte(byte: u8) -> Self {
        let mode = match byte >> 4 {
            0 => JogMode::Fast,
            1 => JogMode::Slow,
            2 => JogMode::Step,
            other => JogMode::Other(other),
        };
        let modifier = match byte & 0x0F {
            0 => JogModifier::One,
            1 => JogModifier::Tenth,
            2 => JogModifier::Hundredth,
            other => JogModifier::Other(other),
        };
        Self { mode, modifier }
    }
}

/// Active work coordinate system index (G54 = 0)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Wcs(pub u8);

impl Wcs {
    /// G-code name of the coordinate system
    pub fn label(self) -> &'static str {
        match self.0 {
            0 => "G54",
            1 => "G55",
            2 => "G56",
            3 => "G57",
            4 => "G58",
            5 => "G59",
            6 => "G59.1",
            7 => "G59.2",
            8 => "G59.3",
            9 => "G28",
            10 => "G30",
            11 => "G92",
            _ => "?",
        }
    }
}

/// Axis positions; `a` is NaN when the machine has no fourth axis
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Coordinates {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub a: f32,
}

impl Default for Coordinates {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            z: 0.0,
            a: f32::NAN,
        }
    }
}

impl Coordinates {
    /// The fourth axis position, or `None` when the axis is absent
    pub fn a_axis(&self) -> Option<f32> {
        if self.a.is_nan() {
            None
        } else {
            Some(self.a)
        }
    }

    pub fn has_a_axis(&self) -> bool {
        !self.a.is_nan()
    }
}

// Message type markers
const MSG_NONE: u8 = 0;
const MSG_OVERRIDES: u8 = 253;
const MSG_WORK_OFFSET: u8 = 254;
const MSG_CLEAR: u8 = 255;

/// Trailing message region of a packet
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HostMessage {
    #[default]
    None,
    /// Free-form text (raw bytes, usually ASCII)
    Text(Vec<u8, MAX_MESSAGE_LEN>),
    /// Override values changed on the host
    OverridesChanged,
    /// Work offset changed on the host
    WorkOffsetChanged,
    /// Clear any message on screen
    Clear,
}

impl HostMessage {
    /// Decode the message type byte and the text bytes that follow it
    ///
    /// `text` is whatever the host actually wrote after the type byte; text
    /// longer than that is cut short rather than read from stale memory.
    pub fn decode(msg_type: u8, text: &[u8]) -> Self {
        match msg_type {
            MSG_NONE => HostMessage::None,
            MSG_OVERRIDES => HostMessage::OverridesChanged,
            MSG_WORK_OFFSET => HostMessage::WorkOffsetChanged,
            MSG_CLEAR => HostMessage::Clear,
            len if (len as usize) <= MAX_MESSAGE_LEN => {
                let len = (len as usize).min(text.len());
                let mut buf = Vec::new();
                // Cannot overflow: len <= MAX_MESSAGE_LEN
                let _ = buf.extend_from_slice(&text[..len]);
                HostMessage::Text(buf)
            }
            _ => HostMessage::None,
        }
    }

    /// Message text, if this is a text message holding valid UTF-8
    pub fn text(&self) -> Option<&str> {
        match self {
            HostMessage::Text(bytes) => core::str::from_utf8(bytes).ok(),
            _ => None,
        }
    }
}

/// Decoded status packet
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StatusPacket {
    /// Version tag the packet was written with; `None` for legacy packets
    pub version: Option<u8>,
    pub state: SystemState,
    pub status: StatusCode,
    /// Alarm or sub-state code (0 = none)
    pub alarm: u8,
    pub modes: MachineModes,
    pub coolant: CoolantState,
    /// Feed override percent (100 = unmodified)
    pub feed_override: u8,
    /// Spindle override percent (100 = unmodified)
    pub spindle_override: u8,
    pub spindle_stop: SpindleStop,
    pub jog: JogSettings,
    pub wcs: Wcs,
    pub spindle_rpm: i32,
    pub feed_rate: f32,
    pub jog_step_size: f32,
    pub position: Coordinates,
    pub message: HostMessage,
}

impl StatusPacket {
    /// Whether the host reports that it has no controller connection
    pub fn is_disconnected(&self) -> bool {
        self.status == StatusCode::NoConnection
    }

    /// Effective jog step after applying the modifier
    pub fn effective_jog_step(&self) -> f32 {
        self.jog_step_size * self.jog.modifier.factor()
    }

    /// Field-wise equality where two NaNs compare equal
    ///
    /// `PartialEq` would report an absent fourth axis as a change on every
    /// packet.
    pub fn same_as(&self, other: &StatusPacket) -> bool {
        fn same(a: f32, b: f32) -> bool {
            a == b || (a.is_nan() && b.is_nan())
        }

        self.version == other.version
            && self.state == other.state
            && self.status == other.status
            && self.alarm == other.alarm
            && self.modes == other.modes
            && self.coolant == other.coolant
            && self.feed_override == other.feed_override
            && self.spindle_override == other.spindle_override
            && self.spindle_stop == other.spindle_stop
            && self.jog == other.jog
            && self.wcs == other.wcs
            && self.spindle_rpm == other.spindle_rpm
            && same(self.feed_rate, other.feed_rate)
            && same(self.jog_step_size, other.jog_step_size)
            && same(self.position.x, other.position.x)
            && same(self.position.y, other.position.y)
            && same(self.position.z, other.position.z)
            && same(self.position.a, other.position.a)
            && self.message == other.message
    }
}

/// Human-readable name of a controller alarm code
pub fn alarm_label(code: u8) -> &'static str {
    match code {
        0 => "None",
        1 => "Hard limit",
        2 => "Soft limit",
        3 => "Abort cycle",
        4 => "Probe fail initial",
        5 => "Probe fail contact",
        6 => "Homing fail reset",
        7 => "Homing fail door",
        8 => "Homing fail pulloff",
        9 => "Homing fail approach",
        10 => "E-Stop",
        11 => "Homing required",
        12 => "Limits engaged",
        13 => "Probe protect",
        14 => "Spindle",
        15 => "Homing fail autosquare",
        16 => "Selftest failed",
        17 => "Motor fault",
        _ => "Unknown alarm",
    }
}
