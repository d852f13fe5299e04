//! Panel keys and sampled button state

use jog2k_hal::InputPin;

/// Physical keys on the panel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Key {
    Halt = 0,
    Hold,
    Run,
    SpindleOverrideUp,
    SpindleOverrideDown,
    SpindleOverrideReset,
    FeedOverrideUp,
    FeedOverrideDown,
    FeedOverrideReset,
    Home,
    Mist,
    Flood,
    Spindle,
    /// Modifier: selects the alternate key map while held
    JogSelect,
    Up,
    Right,
    Down,
    Left,
    Raise,
    Lower,
}

/// Number of keys
pub const KEY_COUNT: usize = 20;

impl Key {
    /// All keys in scan order
    pub const ALL: [Key; KEY_COUNT] = [
        Key::Halt,
        Key::Hold,
        Key::Run,
        Key::SpindleOverrideUp,
        Key::SpindleOverrideDown,
        Key::SpindleOverrideReset,
        Key::FeedOverrideUp,
        Key::FeedOverrideDown,
        Key::FeedOverrideReset,
        Key::Home,
        Key::Mist,
        Key::Flood,
        Key::Spindle,
        Key::JogSelect,
        Key::Up,
        Key::Right,
        Key::Down,
        Key::Left,
        Key::Raise,
        Key::Lower,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    fn bit(self) -> u32 {
        1 << (self as u32)
    }

    /// Keys that drive jogging in the primary map
    pub fn is_direction(self) -> bool {
        matches!(
            self,
            Key::Up | Key::Right | Key::Down | Key::Left | Key::Raise | Key::Lower
        )
    }
}

/// Snapshot of which keys are held
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Buttons(u32);

impl Buttons {
    /// No keys held
    pub const NONE: Buttons = Buttons(0);

    pub fn from_keys(keys: &[Key]) -> Self {
        keys.iter().fold(Self::NONE, |acc, &key| acc.with(key))
    }

    /// Build from one level per key in [`Key::ALL`] order
    pub fn from_levels(levels: impl IntoIterator<Item = bool>) -> Self {
        Key::ALL
            .iter()
            .zip(levels)
            .filter(|(_, held)| *held)
            .fold(Self::NONE, |acc, (&key, _)| acc.with(key))
    }

    /// Read one pin per key, in [`Key::ALL`] order
    pub fn sample<P: InputPin>(pins: &[P; KEY_COUNT]) -> Self {
        Self::from_levels(pins.iter().map(InputPin::is_high))
    }

    pub fn with(self, key: Key) -> Self {
        Buttons(self.0 | key.bit())
    }

    pub fn contains(self, key: Key) -> bool {
        self.0 & key.bit() != 0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn bits(self) -> u32 {
        self.0
    }
}
