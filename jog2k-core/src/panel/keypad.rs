//! Key map and press/release latching
//!
//! Feed hold and cycle start fire as soon as they are pressed. Every other
//! key latches what it will do when pressed and fires on release, so a key
//! pressed under the modifier keeps its alternate meaning even if the
//! modifier is let go first.
//!
//! Primary map:
//! ```text
//!   Hold  -> feed hold          Run   -> cycle start (on press)
//!   Feed/Spindle +/-/reset -> coarse overrides
//!   Mist/Flood/Spindle/Home -> toggles, spindle stop, home
//!   Up/Down/Left/Right/Raise/Lower -> jog chord
//! ```
//! Alternate map (modifier held):
//! ```text
//!   Feed/Spindle +/-       -> fine overrides
//!   Flood / Mist           -> jog modifier / jog mode cycle
//!   directions, Home, Spindle -> macros
//!   Raise/Lower            -> A axis jog when the axis exists
//!   Hold / Run             -> reset / unlock
//!   Halt                   -> flip screen, save and reboot
//! ```

use heapless::Vec;
use jog2k_protocol::Command;

use super::buttons::{Buttons, Key, KEY_COUNT};
use super::jog::JogMask;

/// Most actions one scan can produce (every key released at once)
pub const MAX_KEY_ACTIONS: usize = KEY_COUNT;

/// What a held key will do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
enum Latch {
    Released,
    /// Primary command on release
    Primary(Command),
    /// Alternate command on release
    Alternate(Command),
    /// Alternate halt
    ScreenFlip,
    /// Direction key feeding the jog chord
    Jog(JogMask),
    /// Raise/lower jogging the rotary axis
    AxisJog(JogMask),
    /// Held, does nothing on release
    Inert,
}

/// Output of a keypad scan
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum KeyAction {
    /// Send a command and lower the strobe afterwards
    Send(Command),
    /// Toggle the screen orientation and persist it
    SaveScreenFlip,
}

/// Result of one scan
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct KeyScan {
    pub actions: Vec<KeyAction, MAX_KEY_ACTIONS>,
    /// Jog chord currently held
    pub jog: JogMask,
    /// Alternate map active
    pub modifier: bool,
    /// A-axis jog in progress
    pub axis_jog: bool,
}

/// Keypad state carried between scans
#[derive(Debug, Clone)]
pub struct Keypad {
    latches: [Latch; KEY_COUNT],
    previous: Buttons,
    /// Set when an A-axis jog ends; the modifier stays off until every key
    /// is released
    modifier_suppressed: bool,
}

impl Default for Keypad {
    fn default() -> Self {
        Self::new()
    }
}

impl Keypad {
    pub fn new() -> Self {
        Self {
            latches: [Latch::Released; KEY_COUNT],
            previous: Buttons::NONE,
            modifier_suppressed: false,
        }
    }

    /// Whether the alternate map is active for `buttons`
    pub fn modifier_active(&self, buttons: Buttons) -> bool {
        buttons.contains(Key::JogSelect) && !self.modifier_suppressed
    }

    /// Process one sample of the buttons
    ///
    /// `a_axis` tells whether the host reports a rotary axis; it changes
    /// what raise/lower do under the modifier.
    pub fn scan(&mut self, buttons: Buttons, a_axis: bool) -> KeyScan {
        if buttons.is_empty() {
            self.modifier_suppressed = false;
        }

        let modifier = self.modifier_active(buttons);
        let mut scan = KeyScan {
            modifier,
            ..KeyScan::default()
        };

        for key in Key::ALL {
            let held = buttons.contains(key);
            let was_held = self.previous.contains(key);
            let slot = key.index();

            match (was_held, held) {
                (false, true) => {
                    let (latch, immediate) = press(key, modifier, a_axis);
                    self.latches[slot] = latch;
                    if let Some(command) = immediate {
                        // Cannot overflow: one action per key
                        let _ = scan.actions.push(KeyAction::Send(command));
                    }
                }
                (true, false) => {
                    let latch = core::mem::replace(&mut self.latches[slot], Latch::Released);
                    let action = match latch {
                        Latch::Primary(command) if !modifier || !drops_under_modifier(key) => {
                            Some(KeyAction::Send(command))
                        }
                        Latch::Alternate(command) => Some(KeyAction::Send(command)),
                        Latch::ScreenFlip => Some(KeyAction::SaveScreenFlip),
                        Latch::AxisJog(_) => {
                            self.modifier_suppressed = true;
                            None
                        }
                        _ => None,
                    };
                    if let Some(action) = action {
                        let _ = scan.actions.push(action);
                    }
                }
                _ => {}
            }
        }

        // Re-evaluate after releases so an axis jog ending drops the modifier
        scan.modifier = self.modifier_active(buttons);

        for key in Key::ALL {
            if !buttons.contains(key) {
                continue;
            }
            match self.latches[key.index()] {
                Latch::Jog(mask) if !scan.modifier => scan.jog = scan.jog | mask,
                Latch::AxisJog(mask) => {
                    scan.jog = scan.jog | mask;
                    scan.axis_jog = true;
                }
                _ => {}
            }
        }

        self.previous = buttons;
        scan
    }
}

/// Latch for a newly pressed key plus any command fired on press
fn press(key: Key, modifier: bool, a_axis: bool) -> (Latch, Option<Command>) {
    if modifier {
        if let Some(latch) = alternate(key, a_axis) {
            return (latch, None);
        }
    }

    match key {
        Key::Hold if !modifier => (Latch::Inert, Some(Command::FeedHold)),
        Key::Run if !modifier => (Latch::Inert, Some(Command::CycleStart)),
        _ => (primary(key), None),
    }
}

fn primary(key: Key) -> Latch {
    match key {
        Key::SpindleOverrideUp => Latch::Primary(Command::SpindleOverrideCoarsePlus),
        Key::SpindleOverrideDown => Latch::Primary(Command::SpindleOverrideCoarseMinus),
        Key::SpindleOverrideReset => Latch::Primary(Command::SpindleOverrideReset),
        Key::FeedOverrideUp => Latch::Primary(Command::FeedOverrideCoarsePlus),
        Key::FeedOverrideDown => Latch::Primary(Command::FeedOverrideCoarseMinus),
        Key::FeedOverrideReset => Latch::Primary(Command::FeedOverrideReset),
        Key::Home => Latch::Primary(Command::Home),
        Key::Mist => Latch::Primary(Command::MistToggle),
        Key::Flood => Latch::Primary(Command::FloodToggle),
        Key::Spindle => Latch::Primary(Command::SpindleStop),
        Key::Up => Latch::Jog(JogMask::UP),
        Key::Right => Latch::Jog(JogMask::RIGHT),
        Key::Down => Latch::Jog(JogMask::DOWN),
        Key::Left => Latch::Jog(JogMask::LEFT),
        Key::Raise => Latch::Jog(JogMask::RAISE),
        Key::Lower => Latch::Jog(JogMask::LOWER),
        // Halt has no primary action; JogSelect is the modifier itself
        Key::Halt | Key::JogSelect | Key::Hold | Key::Run => Latch::Inert,
    }
}

fn alternate(key: Key, a_axis: bool) -> Option<Latch> {
    let latch = match key {
        Key::Halt => Latch::ScreenFlip,
        Key::Hold => Latch::Alternate(Command::Reset),
        Key::Run => Latch::Alternate(Command::Unlock),
        Key::SpindleOverrideUp => Latch::Alternate(Command::SpindleOverrideFinePlus),
        Key::SpindleOverrideDown => Latch::Alternate(Command::SpindleOverrideFineMinus),
        Key::FeedOverrideUp => Latch::Alternate(Command::FeedOverrideFinePlus),
        Key::FeedOverrideDown => Latch::Alternate(Command::FeedOverrideFineMinus),
        Key::Flood => Latch::Alternate(Command::JogModifierCycle),
        Key::Mist => Latch::Alternate(Command::JogModeCycle),
        Key::Home => Latch::Alternate(Command::MacroHome),
        Key::Spindle => Latch::Alternate(Command::MacroSpindle),
        Key::Up => Latch::Alternate(Command::MacroUp),
        Key::Down => Latch::Alternate(Command::MacroDown),
        Key::Left => Latch::Alternate(Command::MacroLeft),
        Key::Right => Latch::Alternate(Command::MacroRight),
        Key::Raise if a_axis => Latch::AxisJog(JogMask::A_RAISE),
        Key::Lower if a_axis => Latch::AxisJog(JogMask::A_LOWER),
        Key::Raise => Latch::Alternate(Command::MacroRaise),
        Key::Lower => Latch::Alternate(Command::MacroLower),
        Key::JogSelect => Latch::Inert,
        Key::SpindleOverrideReset | Key::FeedOverrideReset => return None,
    };
    Some(latch)
}

/// Primary toggles that are swallowed if released while the modifier is held
fn drops_under_modifier(key: Key) -> bool {
    matches!(key, Key::Mist | Key::Flood | Key::Spindle | Key::Home)
}
