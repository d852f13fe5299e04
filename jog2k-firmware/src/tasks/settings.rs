//! Settings persistence task
//!
//! Waits for a save request from the panel, flips the screen orientation,
//! writes it to flash and resets so the new orientation takes effect.

use defmt::*;
use embassy_time::Timer;
use jog2k_core::config::{Settings, SettingsStore};
use jog2k_hal_rp2040::flash::Rp2040FlashStorage;

use crate::channels::SAVE_SETTINGS;

/// Time for the final log lines to drain before reset
const RESET_DELAY_MS: u64 = 250;

#[embassy_executor::task]
pub async fn settings_task(mut store: SettingsStore<Rp2040FlashStorage<'static>>, settings: Settings) {
    info!("Settings task started (screen_flip={})", settings.screen_flip);

    loop {
        SAVE_SETTINGS.wait().await;

        let updated = settings.with_flipped_screen();
        match store.save(updated).await {
            Ok(()) => info!("Saved screen_flip={}, restarting", updated.screen_flip),
            // Keep running with the old orientation
            Err(e) => {
                warn!("Failed to save settings: {}", e);
                continue;
            }
        }

        Timer::after_millis(RESET_DELAY_MS).await;
        cortex_m::peripheral::SCB::sys_reset();
    }
}
