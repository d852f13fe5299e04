//! Foreground panel loop
//!
//! One pass every `tick_ms`:
//! 1. Advance the panel counters
//! 2. Pick up a new status packet from the shared region
//! 3. Sample the keys and execute the resulting actions
//! 4. Report redraws, notices and LED refreshes
//!
//! Command handshakes block this task (the dispatcher busy-waits on the
//! region), which is fine because the responder runs on the interrupt
//! executor and keeps serving the host meanwhile.

use defmt::*;
use embassy_time::{Delay, Duration, Ticker, Timer};
use jog2k_core::config::PanelConfig;
use jog2k_core::dispatch::CommandDispatcher;
use jog2k_core::panel::{Notice, Panel, PanelAction, ReadOutcome, JOG_SWITCH_SETTLE_MS};
use jog2k_hal_rp2040::gpio::{KeyBank, RpOutput};
use jog2k_protocol::DEFAULT_REGISTRY;

use crate::channels::{HEARTBEAT, REGION, SAVE_SETTINGS};
use crate::config::PANEL_CONFIG;

/// Hardware owned by the panel loop
pub struct PanelIo {
    pub keys: KeyBank<'static>,
    pub strobe: RpOutput<'static>,
}

type Dispatcher = CommandDispatcher<RpOutput<'static>, Delay>;

#[embassy_executor::task]
pub async fn panel_task(io: PanelIo) {
    let config: &PanelConfig = &PANEL_CONFIG;
    info!(
        "Panel task started (tick={}ms, timeout={}us)",
        config.tick_ms, config.dispatch_timeout_us
    );

    let mut panel = Panel::new(config);
    let mut dispatcher = CommandDispatcher::new(io.strobe, Delay, config.dispatch_timing());
    let keys = io.keys;

    let mut ticker = Ticker::every(Duration::from_millis(config.tick_ms as u64));
    let mut last_notice: Option<Notice> = None;

    loop {
        ticker.next().await;
        panel.tick();

        if panel.take_heartbeat() {
            HEARTBEAT.signal(());
        }

        match panel.poll_host(&REGION, &DEFAULT_REGISTRY) {
            ReadOutcome::Updated => {
                let packet = panel.packet();
                debug!(
                    "Status: {} {} feed={}% spindle={}%",
                    packet.state, packet.status, packet.feed_override, packet.spindle_override
                );
            }
            ReadOutcome::Rejected(e) => warn!("Status packet rejected: {}", e),
            ReadOutcome::Busy | ReadOutcome::Unchanged => {}
        }

        for action in panel.scan(keys.sample()) {
            execute(&mut panel, &mut dispatcher, action).await;
        }

        if dispatcher.take_status_request() {
            panel.request_redraw();
        }

        let notice = panel.notice();
        if notice != last_notice {
            match notice {
                Some(n) => warn!("Notice: {}", n.text()),
                None => info!("Notice cleared"),
            }
            last_notice = notice;
        }

        if panel.take_redraw() {
            debug!("Redraw ({})", panel.screen_mode());
        }

        if panel.take_led_update() {
            let packet = panel.packet();
            trace!(
                "LEDs: flood={} mist={} rpm={}",
                packet.coolant.flood(),
                packet.coolant.mist(),
                packet.spindle_rpm
            );
        }
    }
}

async fn execute(panel: &mut Panel, dispatcher: &mut Dispatcher, action: PanelAction) {
    match action {
        PanelAction::Send {
            command,
            clear_strobe,
        } => {
            let result = dispatcher.send(&REGION, command, clear_strobe, true);
            match result {
                Ok(()) => trace!("Command {} delivered ({} total)", command, dispatcher.sent_count()),
                Err(e) => warn!(
                    "Command {} failed: {} ({} failed, {} delivered)",
                    command,
                    e,
                    dispatcher.failed_count(),
                    dispatcher.sent_count()
                ),
            }
            panel.on_dispatch(command, result);
        }
        PanelAction::StartJog(direction) => {
            // The host only latches a new jog on a fresh strobe edge
            dispatcher.release_strobe();
            Timer::after_millis(JOG_SWITCH_SETTLE_MS as u64).await;

            let command = jog2k_protocol::Command::Jog(direction);
            let result = dispatcher.send(&REGION, command, false, false);
            match result {
                Ok(()) => debug!("Jog {}", direction),
                Err(e) => warn!(
                    "Jog {} failed: {} ({} failed)",
                    direction,
                    e,
                    dispatcher.failed_count()
                ),
            }
            panel.on_dispatch(command, result);
        }
        PanelAction::StopJog => {
            dispatcher.release_strobe();
            debug!("Jog stopped");
        }
        PanelAction::SaveScreenFlip => {
            info!("Screen flip requested");
            SAVE_SETTINGS.signal(());
        }
    }
}
