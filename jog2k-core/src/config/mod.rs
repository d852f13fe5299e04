//! Configuration types
//!
//! Build-time panel configuration and the settings persisted in flash.

pub mod panel;
pub mod settings;

pub use panel::*;
pub use settings::*;
