//! Embassy async tasks
//!
//! The responder runs on the interrupt executor; everything else shares
//! the thread executor and talks through the signals in `channels`.

pub mod heartbeat;
pub mod panel;
pub mod responder;
pub mod settings;

pub use heartbeat::heartbeat_task;
pub use panel::{panel_task, PanelIo};
pub use responder::responder_task;
pub use settings::settings_task;
