//! GPIO wrappers
//!
//! Thin adapters from `embassy_rp::gpio` to the `jog2k-hal` pin traits,
//! plus the bank of panel keys.

use embassy_rp::gpio::{Input, Output};
use jog2k_core::panel::buttons::{Buttons, KEY_COUNT};

/// Push-pull output (strobe line, on-board LED)
pub struct RpOutput<'d> {
    pin: Output<'d>,
}

impl<'d> RpOutput<'d> {
    pub fn new(pin: Output<'d>) -> Self {
        Self { pin }
    }
}

impl jog2k_hal::OutputPin for RpOutput<'_> {
    fn set_high(&mut self) {
        self.pin.set_high();
    }

    fn set_low(&mut self) {
        self.pin.set_low();
    }

    fn toggle(&mut self) {
        self.pin.toggle();
    }

    fn is_set_high(&self) -> bool {
        self.pin.is_set_high()
    }
}

/// Input with pull configured by the caller (panel keys)
pub struct RpInput<'d> {
    pin: Input<'d>,
}

impl<'d> RpInput<'d> {
    pub fn new(pin: Input<'d>) -> Self {
        Self { pin }
    }
}

impl jog2k_hal::InputPin for RpInput<'_> {
    fn is_high(&self) -> bool {
        self.pin.is_high()
    }
}

/// One input per panel key, in `Key::ALL` order
///
/// Keys pull the line high when pressed.
pub struct KeyBank<'d> {
    keys: [RpInput<'d>; KEY_COUNT],
}

impl<'d> KeyBank<'d> {
    pub fn new(keys: [Input<'d>; KEY_COUNT]) -> Self {
        Self {
            keys: keys.map(RpInput::new),
        }
    }

    /// Sample every key
    pub fn sample(&self) -> Buttons {
        Buttons::sample(&self.keys)
    }
}
