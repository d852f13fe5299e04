//! Jog chord tracking
//!
//! Direction keys are combined into a bitmask. A chord is only sent once it
//! has been stable for the rollover delay, so pressing two keys for a
//! diagonal does not first jog along one axis. While a chord is held the
//! transition delay is kept topped up from the feed rate; switching to a
//! different chord waits for it to run out.

use jog2k_protocol::JogDirection;

use super::buttons::{Buttons, Key};

/// Bitmask of held jog directions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct JogMask(u8);

impl JogMask {
    pub const NONE: JogMask = JogMask(0);
    pub const UP: JogMask = JogMask(0b0000_0001);
    pub const RIGHT: JogMask = JogMask(0b0000_0010);
    pub const DOWN: JogMask = JogMask(0b0000_0100);
    pub const LEFT: JogMask = JogMask(0b0000_1000);
    pub const RAISE: JogMask = JogMask(0b0001_0000);
    pub const LOWER: JogMask = JogMask(0b0010_0000);
    /// Rotary axis, driven from the alternate key map
    pub const A_RAISE: JogMask = JogMask(0b0100_0000);
    pub const A_LOWER: JogMask = JogMask(0b1000_0000);

    /// Collect the direction keys held in `buttons`
    pub fn from_buttons(buttons: Buttons) -> Self {
        [
            (Key::Up, JogMask::UP),
            (Key::Right, JogMask::RIGHT),
            (Key::Down, JogMask::DOWN),
            (Key::Left, JogMask::LEFT),
            (Key::Raise, JogMask::RAISE),
            (Key::Lower, JogMask::LOWER),
        ]
        .iter()
        .filter(|(key, _)| buttons.contains(*key))
        .fold(JogMask::NONE, |acc, (_, mask)| acc | *mask)
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn bits(self) -> u8 {
        self.0
    }

    /// Jog direction for this chord, if it is one the host understands
    ///
    /// Up jogs Y forward, Down jogs Y back.
    pub fn direction(self) -> Option<JogDirection> {
        const UP_RIGHT: u8 = JogMask::UP.0 | JogMask::RIGHT.0;
        const DOWN_RIGHT: u8 = JogMask::DOWN.0 | JogMask::RIGHT.0;
        const UP_LEFT: u8 = JogMask::UP.0 | JogMask::LEFT.0;
        const DOWN_LEFT: u8 = JogMask::DOWN.0 | JogMask::LEFT.0;

        let direction = match self.0 {
            0b0000_0001 => JogDirection::YForward,
            0b0000_0010 => JogDirection::XRight,
            0b0000_0100 => JogDirection::YBack,
            0b0000_1000 => JogDirection::XLeft,
            0b0001_0000 => JogDirection::ZUp,
            0b0010_0000 => JogDirection::ZDown,
            0b0100_0000 => JogDirection::ARight,
            0b1000_0000 => JogDirection::ALeft,
            UP_RIGHT => JogDirection::XRightYForward,
            DOWN_RIGHT => JogDirection::XRightYBack,
            UP_LEFT => JogDirection::XLeftYForward,
            DOWN_LEFT => JogDirection::XLeftYBack,
            _ => return None,
        };
        Some(direction)
    }
}

impl core::ops::BitOr for JogMask {
    type Output = JogMask;

    fn bitor(self, rhs: JogMask) -> JogMask {
        JogMask(self.0 | rhs.0)
    }
}

/// What the jog tracker wants done with the strobe line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum JogEvent {
    /// Start (or switch to) jogging in this direction; the strobe stays high
    Start(JogDirection),
    /// All direction keys released; lower the strobe
    Stop,
}

/// Tracks held direction keys across panel ticks
#[derive(Debug, Clone)]
pub struct JogTracker {
    held: JogMask,
    active: JogMask,
    rollover: u8,
    transition: u16,
    rollover_ticks: u8,
    transition_min: u16,
    transition_max: u16,
}

impl JogTracker {
    pub fn new(rollover_ticks: u8, transition_min: u16, transition_max: u16) -> Self {
        Self {
            held: JogMask::NONE,
            active: JogMask::NONE,
            rollover: 0,
            transition: 0,
            rollover_ticks,
            transition_min,
            transition_max,
        }
    }

    /// Advance timers by one panel tick
    pub fn tick(&mut self) {
        if !self.held.is_empty() {
            self.rollover = (self.rollover + 1).min(self.rollover_ticks);
            self.transition = self.transition.saturating_sub(1);
        }
    }

    /// Chord currently being jogged
    pub fn active(&self) -> JogMask {
        self.active
    }

    pub fn is_jogging(&self) -> bool {
        !self.active.is_empty()
    }

    /// Feed in the currently held chord
    ///
    /// `feed_rate` comes from the latest status packet and sets the
    /// transition delay to `feed_rate / 10` ticks, clamped.
    pub fn update(&mut self, mask: JogMask, feed_rate: f32) -> Option<JogEvent> {
        if mask.is_empty() {
            let was_jogging = self.is_jogging();
            self.held = JogMask::NONE;
            self.active = JogMask::NONE;
            self.rollover = 0;
            self.transition = 0;
            return was_jogging.then_some(JogEvent::Stop);
        }

        self.held = mask;

        let mut event = None;
        if self.rollover >= self.rollover_ticks && self.active != mask && self.transition == 0 {
            self.active = mask;
            event = mask.direction().map(JogEvent::Start);
        }

        if self.active == mask {
            self.transition = self.transition_delay(feed_rate);
        }

        event
    }

    fn transition_delay(&self, feed_rate: f32) -> u16 {
        // NaN and negative rates saturate to 0 and take the lower clamp
        let ticks = (feed_rate / 10.0) as u32;
        ticks.clamp(self.transition_min as u32, self.transition_max as u32) as u16
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tracker() -> JogTracker {
        JogTracker::new(7, 30, 250)
    }

    fn hold(tracker: &mut JogTracker, mask: JogMask, ticks: usize) -> Option<JogEvent> {
        let mut last = None;
        for _ in 0..ticks {
            if let Some(event) = tracker.update(mask, 100.0) {
                last = Some(event);
            }
            tracker.tick();
        }
        last
    }

    #[test]
    fn test_chord_mapping() {
        assert_eq!(JogMask::UP.direction(), Some(JogDirection::YForward));
        assert_eq!(JogMask::DOWN.direction(), Some(JogDirection::YBack));
        assert_eq!(
            (JogMask::UP | JogMask::RIGHT).direction(),
            Some(JogDirection::XRightYForward)
        );
        assert_eq!(
            (JogMask::DOWN | JogMask::LEFT).direction(),
            Some(JogDirection::XLeftYBack)
        );
        assert_eq!(JogMask::A_LOWER.direction(), Some(JogDirection::ALeft));
        // Z diagonals are not supported by the host
        assert_eq!((JogMask::RAISE | JogMask::RIGHT).direction(), None);
    }

    #[test]
    fn test_from_buttons() {
        let buttons = Buttons::from_keys(&[Key::Left, Key::Down, Key::Home]);
        assert_eq!(JogMask::from_buttons(buttons), JogMask::LEFT | JogMask::DOWN);
    }

    #[test]
    fn test_waits_for_rollover() {
        let mut jog = tracker();
        // Ticks 0..6 are inside the rollover window
        assert_eq!(hold(&mut jog, JogMask::RIGHT, 7), None);
        assert_eq!(
            jog.update(JogMask::RIGHT, 100.0),
            Some(JogEvent::Start(JogDirection::XRight))
        );
        // Sent once only
        assert_eq!(hold(&mut jog, JogMask::RIGHT, 50), None);
    }

    #[test]
    fn test_second_key_inside_rollover_forms_diagonal() {
        let mut jog = tracker();
        hold(&mut jog, JogMask::UP, 3);
        let event = hold(&mut jog, JogMask::UP | JogMask::RIGHT, 10);
        assert_eq!(event, Some(JogEvent::Start(JogDirection::XRightYForward)));
    }

    #[test]
    fn test_release_stops() {
        let mut jog = tracker();
        hold(&mut jog, JogMask::RAISE, 10);
        assert!(jog.is_jogging());
        assert_eq!(jog.update(JogMask::NONE, 100.0), Some(JogEvent::Stop));
        assert_eq!(jog.update(JogMask::NONE, 100.0), None);
    }

    #[test]
    fn test_release_before_rollover_sends_nothing() {
        let mut jog = tracker();
        hold(&mut jog, JogMask::LOWER, 3);
        assert_eq!(jog.update(JogMask::NONE, 100.0), None);
    }

    #[test]
    fn test_chord_change_waits_for_transition() {
        let mut jog = tracker();
        hold(&mut jog, JogMask::RIGHT, 10);

        // feed 100 -> 10 ticks, clamped up to 30
        let event = hold(&mut jog, JogMask::RIGHT | JogMask::UP, 29);
        assert_eq!(event, None);
        let event = hold(&mut jog, JogMask::RIGHT | JogMask::UP, 2);
        assert_eq!(event, Some(JogEvent::Start(JogDirection::XRightYForward)));
    }

    #[test]
    fn test_transition_clamp() {
        let jog = tracker();
        assert_eq!(jog.transition_delay(100.0), 30);
        assert_eq!(jog.transition_delay(1500.0), 150);
        assert_eq!(jog.transition_delay(10_000.0), 250);
        assert_eq!(jog.transition_delay(f32::NAN), 30);
        assert_eq!(jog.transition_delay(-5.0), 30);
    }
}
