//! Shared state and inter-task signals

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use jog2k_protocol::SharedRegion;

/// The memory window shared with the host
///
/// Written by the responder task, read by the panel task.
pub static REGION: SharedRegion = SharedRegion::new();

/// Panel asks for the screen orientation to be flipped and saved
pub static SAVE_SETTINGS: Signal<CriticalSectionRawMutex, ()> = Signal::new();

/// Heartbeat LED should toggle
pub static HEARTBEAT: Signal<CriticalSectionRawMutex, ()> = Signal::new();
