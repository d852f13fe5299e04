//! Build-time panel configuration
//!
//! `build.rs` validates `panel.toml` and generates [`PANEL_CONFIG`].

use jog2k_core::config::PanelConfig;

include!(concat!(env!("OUT_DIR"), "/panel_config.rs"));
