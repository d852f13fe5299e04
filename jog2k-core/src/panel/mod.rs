//! Foreground panel logic
//!
//! [`Panel`] ties the pieces together: it polls the shared region for
//! status packets, tracks the host connection, turns sampled buttons into
//! commands and jog chords, and keeps the tick-driven countdowns. It never
//! touches hardware; the firmware executes the returned [`PanelAction`]s
//! with a [`CommandDispatcher`](crate::dispatch::CommandDispatcher) and
//! reports the outcome back through [`Panel::on_dispatch`].

pub mod buttons;
pub mod jog;
pub mod keypad;
pub mod link;
pub mod reader;
pub mod ticks;

pub use buttons::{Buttons, Key};
pub use jog::{JogEvent, JogMask, JogTracker};
pub use keypad::{KeyAction, KeyScan, Keypad};
pub use link::{HostLink, Notice};
pub use reader::{PacketReader, ReadOutcome};
pub use ticks::TickCounters;

use heapless::Vec;
use jog2k_protocol::{
    Command, JogDirection, LayoutRegistry, SharedRegion, StatusCode, StatusPacket, SystemState,
};

use crate::config::PanelConfig;
use crate::dispatch::DispatchError;

/// Pause between lowering the strobe and sending a new jog direction (ms)
pub const JOG_SWITCH_SETTLE_MS: u32 = 5;

/// Most actions one scan can produce
pub const MAX_PANEL_ACTIONS: usize = keypad::MAX_KEY_ACTIONS + 2;

/// What the display is showing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ScreenMode {
    #[default]
    Default,
    /// A jog chord is being sent
    Jogging,
    /// Modifier held, alternate key legends
    JogModify,
}

/// Work for the firmware to carry out after a scan
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PanelAction {
    /// Send one command
    Send { command: Command, clear_strobe: bool },
    /// Lower the strobe, wait [`JOG_SWITCH_SETTLE_MS`], then send the jog
    /// leaving the strobe raised
    StartJog(JogDirection),
    /// Lower the strobe
    StopJog,
    /// Toggle the screen orientation, persist it and reboot
    SaveScreenFlip,
}

/// Panel state owned by the foreground loop
pub struct Panel {
    reader: PacketReader,
    link: HostLink,
    keypad: Keypad,
    jog: JogTracker,
    ticks: TickCounters,
    screen: ScreenMode,
    command_error: bool,
    redraw: bool,
}

impl Panel {
    pub fn new(config: &PanelConfig) -> Self {
        Self {
            reader: PacketReader::new(),
            link: HostLink::default(),
            keypad: Keypad::new(),
            jog: JogTracker::new(
                config.rollover_ticks,
                config.transition_min_ticks,
                config.transition_max_ticks,
            ),
            ticks: TickCounters::new(
                config.heartbeat_ticks,
                config.status_request_ticks,
                config.led_update_ticks,
            ),
            screen: ScreenMode::Default,
            command_error: false,
            redraw: true,
        }
    }

    /// Advance the periodic counters by one tick
    pub fn tick(&mut self) {
        self.ticks.tick();
        self.jog.tick();
    }

    /// Look for a new status packet
    pub fn poll_host(&mut self, region: &SharedRegion, registry: &LayoutRegistry<'_>) -> ReadOutcome {
        let outcome = self.reader.poll(region, registry);
        if outcome == ReadOutcome::Updated {
            self.link.on_packet(self.reader.packet());
            self.redraw = true;
        }
        outcome
    }

    /// Process one sample of the buttons
    pub fn scan(&mut self, buttons: Buttons) -> Vec<PanelAction, MAX_PANEL_ACTIONS> {
        let mut actions = Vec::new();
        let a_axis = self.reader.packet().position.has_a_axis();
        let keys = self.keypad.scan(buttons, a_axis);

        // Capacity covers one jog event plus one action per key
        match self.jog.update(keys.jog, self.reader.packet().feed_rate) {
            Some(JogEvent::Start(direction)) => {
                let _ = actions.push(PanelAction::StartJog(direction));
            }
            Some(JogEvent::Stop) => {
                let _ = actions.push(PanelAction::StopJog);
            }
            None => {}
        }

        for action in keys.actions {
            let action = match action {
                KeyAction::Send(command) => PanelAction::Send {
                    command,
                    clear_strobe: true,
                },
                KeyAction::SaveScreenFlip => PanelAction::SaveScreenFlip,
            };
            let _ = actions.push(action);
        }

        let screen = if keys.axis_jog || self.jog.is_jogging() {
            ScreenMode::Jogging
        } else if keys.modifier {
            ScreenMode::JogModify
        } else {
            ScreenMode::Default
        };
        if screen != self.screen {
            self.screen = screen;
            self.redraw = true;
        }

        if self.reader.packet().state == SystemState::Jog {
            self.redraw = true;
        }

        // Periodic refresh while the panel is idle
        if buttons.is_empty() && self.ticks.take_status_request() {
            self.redraw = true;
        }

        actions
    }

    /// Record the outcome of a command the firmware sent
    pub fn on_dispatch(&mut self, command: Command, result: Result<(), DispatchError>) {
        self.command_error = result.is_err();
        if command == Command::Reset {
            // Show the reset until the host reports back
            let packet = self.reader.packet_mut();
            packet.state = SystemState::Undefined;
            packet.status = StatusCode::Reset;
            self.link.on_local_reset();
        }
        self.redraw = true;
    }

    /// Ask for a redraw on the next loop
    pub fn request_redraw(&mut self) {
        self.redraw = true;
    }

    /// Highest-priority notice to show
    pub fn notice(&self) -> Option<Notice> {
        Notice::select(self.link, self.reader.packet(), self.command_error)
    }

    /// Take the pending redraw request
    pub fn take_redraw(&mut self) -> bool {
        core::mem::take(&mut self.redraw)
    }

    /// Whether the LEDs should be refreshed now; never while disconnected
    pub fn take_led_update(&mut self) -> bool {
        self.ticks.take_led_update() && self.link.updates_allowed()
    }

    pub fn take_heartbeat(&mut self) -> bool {
        self.ticks.take_heartbeat()
    }

    /// Last accepted status packet
    pub fn packet(&self) -> &StatusPacket {
        self.reader.packet()
    }

    pub fn link(&self) -> HostLink {
        self.link
    }

    pub fn screen_mode(&self) -> ScreenMode {
        self.screen
    }

    pub fn command_error(&self) -> bool {
        self.command_error
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::{CommandDispatcher, DispatchTiming};
    use embedded_hal::delay::DelayNs;
    use jog2k_hal::OutputPin;
    use jog2k_protocol::layout::v2::{offsets, FIXED_END, VERSION_TAG};
    use jog2k_protocol::{BusHandler, DEFAULT_REGISTRY};

    #[derive(Default)]
    struct Strobe(bool);

    impl OutputPin for Strobe {
        fn set_high(&mut self) {
            self.0 = true;
        }

        fn set_low(&mut self) {
            self.0 = false;
        }

        fn toggle(&mut self) {
            self.0 = !self.0;
        }

        fn is_set_high(&self) -> bool {
            self.0
        }
    }

    /// Host that reads the mailbox on the first poll step after the strobe
    /// set-up delay
    struct PromptHost<'a> {
        bus: BusHandler<'a>,
        calls: u32,
        seen: std::vec::Vec<u8>,
    }

    impl DelayNs for PromptHost<'_> {
        fn delay_ns(&mut self, _ns: u32) {
            self.calls += 1;
            if self.calls == 2 {
                self.seen.push(self.bus.on_byte_requested());
                self.bus.on_transaction_end();
            }
        }
    }

    fn write_idle_packet(bus: &BusHandler<'_>, feed_override: u8, a: f32) {
        let mut bytes = [0u8; FIXED_END + 1];
        bytes[offsets::STATE] = 5;
        bytes[offsets::FEED_OVERRIDE] = feed_override;
        bytes[offsets::SPINDLE_OVERRIDE] = 100;
        bytes[offsets::FEED_RATE..offsets::FEED_RATE + 4].copy_from_slice(&500.0f32.to_le_bytes());
        bytes[offsets::A..offsets::A + 4].copy_from_slice(&a.to_le_bytes());

        bus.on_byte_received(VERSION_TAG);
        bus.receive(&bytes[1..]);
        bus.on_transaction_end();
    }

    #[test]
    fn test_boots_disconnected() {
        let mut panel = Panel::new(&PanelConfig::default());
        assert_eq!(panel.link(), HostLink::Disconnected);
        assert_eq!(panel.notice(), Some(Notice::NoConnection));
        assert!(panel.take_redraw());

        for _ in 0..10 {
            panel.tick();
        }
        assert!(!panel.take_led_update());
    }

    #[test]
    fn test_host_packet_reaches_panel() {
        let region = SharedRegion::new();
        let bus = BusHandler::new(&region, &DEFAULT_REGISTRY);
        let mut panel = Panel::new(&PanelConfig::default());

        write_idle_packet(&bus, 120, f32::NAN);

        assert_eq!(panel.poll_host(&region, &DEFAULT_REGISTRY), ReadOutcome::Updated);
        assert_eq!(panel.packet().feed_override, 120);
        assert_eq!(panel.packet().state, SystemState::Idle);
        assert_eq!(panel.link(), HostLink::Connected);
        assert_eq!(panel.notice(), None);
        assert!(panel.packet().position.a_axis().is_none());

        for _ in 0..10 {
            panel.tick();
        }
        assert!(panel.take_led_update());
    }

    #[test]
    fn test_key_press_round_trip_through_dispatcher() {
        let region = SharedRegion::new();
        let bus = BusHandler::new(&region, &DEFAULT_REGISTRY);
        let mut panel = Panel::new(&PanelConfig::default());
        write_idle_packet(&bus, 100, f32::NAN);
        panel.poll_host(&region, &DEFAULT_REGISTRY);

        let host = PromptHost {
            bus,
            calls: 0,
            seen: std::vec::Vec::new(),
        };
        let mut dispatch = CommandDispatcher::new(Strobe::default(), host, DispatchTiming::default());

        assert!(panel.scan(Buttons::from_keys(&[Key::FeedOverrideUp])).is_empty());
        let actions = panel.scan(Buttons::NONE);
        assert_eq!(
            actions.as_slice(),
            [PanelAction::Send {
                command: Command::FeedOverrideCoarsePlus,
                clear_strobe: true,
            }]
        );

        let result = dispatch.send(&region, Command::FeedOverrideCoarsePlus, true, true);
        panel.on_dispatch(Command::FeedOverrideCoarsePlus, result);

        assert_eq!(result, Ok(()));
        assert!(!panel.command_error());
        assert!(!dispatch.strobe_active());

        // The host's read does not disturb the decoded packet
        assert_eq!(panel.poll_host(&region, &DEFAULT_REGISTRY), ReadOutcome::Unchanged);
        assert_eq!(panel.packet().feed_override, 100);
    }

    #[test]
    fn test_failed_dispatch_raises_notice() {
        let mut panel = Panel::new(&PanelConfig::default());
        let region = SharedRegion::new();
        let bus = BusHandler::new(&region, &DEFAULT_REGISTRY);
        write_idle_packet(&bus, 100, f32::NAN);
        panel.poll_host(&region, &DEFAULT_REGISTRY);

        panel.on_dispatch(Command::Home, Err(DispatchError::Timeout));
        assert_eq!(panel.notice(), Some(Notice::CommandError));

        panel.on_dispatch(Command::Home, Ok(()));
        assert_eq!(panel.notice(), None);
    }

    #[test]
    fn test_reset_shows_resetting_until_host_answers() {
        let region = SharedRegion::new();
        let bus = BusHandler::new(&region, &DEFAULT_REGISTRY);
        let mut panel = Panel::new(&PanelConfig::default());
        write_idle_packet(&bus, 100, f32::NAN);
        panel.poll_host(&region, &DEFAULT_REGISTRY);

        panel.on_dispatch(Command::Reset, Ok(()));
        assert_eq!(panel.notice(), Some(Notice::Resetting));
        assert_eq!(panel.packet().state, SystemState::Undefined);

        write_idle_packet(&bus, 100, f32::NAN);
        assert_eq!(panel.poll_host(&region, &DEFAULT_REGISTRY), ReadOutcome::Updated);
        assert_eq!(panel.link(), HostLink::Connected);
    }

    #[test]
    fn test_jog_chord_start_and_stop() {
        let config = PanelConfig::default();
        let mut panel = Panel::new(&config);
        let held = Buttons::from_keys(&[Key::Down]);

        let mut started = None;
        for _ in 0..=config.rollover_ticks {
            for action in panel.scan(held) {
                started = Some(action);
            }
            panel.tick();
        }
        assert_eq!(started, Some(PanelAction::StartJog(JogDirection::YBack)));
        assert_eq!(panel.screen_mode(), ScreenMode::Jogging);

        let actions = panel.scan(Buttons::NONE);
        assert_eq!(actions.as_slice(), [PanelAction::StopJog]);
        assert_eq!(panel.screen_mode(), ScreenMode::Default);
    }

    #[test]
    fn test_modifier_switches_screen_mode() {
        let mut panel = Panel::new(&PanelConfig::default());
        panel.take_redraw();

        panel.scan(Buttons::from_keys(&[Key::JogSelect]));
        assert_eq!(panel.screen_mode(), ScreenMode::JogModify);
        assert!(panel.take_redraw());
    }

    #[test]
    fn test_a_axis_jog_under_modifier() {
        let region = SharedRegion::new();
        let bus = BusHandler::new(&region, &DEFAULT_REGISTRY);
        let config = PanelConfig::default();
        let mut panel = Panel::new(&config);
        write_idle_packet(&bus, 100, 12.5);
        panel.poll_host(&region, &DEFAULT_REGISTRY);

        let modifier = Buttons::from_keys(&[Key::JogSelect]);
        panel.scan(modifier);
        let held = modifier.with(Key::Lower);

        let mut started = None;
        for _ in 0..=config.rollover_ticks {
            for action in panel.scan(held) {
                started = Some(action);
            }
            panel.tick();
        }
        assert_eq!(started, Some(PanelAction::StartJog(JogDirection::ALeft)));

        let actions = panel.scan(modifier);
        assert_eq!(actions.as_slice(), [PanelAction::StopJog]);
    }

    #[test]
    fn test_alternate_halt_requests_save() {
        let mut panel = Panel::new(&PanelConfig::default());
        let modifier = Buttons::from_keys(&[Key::JogSelect]);
        panel.scan(modifier);
        panel.scan(modifier.with(Key::Halt));
        let actions = panel.scan(modifier);
        assert_eq!(actions.as_slice(), [PanelAction::SaveScreenFlip]);
    }
}
