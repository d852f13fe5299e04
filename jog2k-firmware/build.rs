//! Build script for jog2k-firmware
//!
//! - Sets up linker search paths for memory.x
//! - Validates panel.toml and bakes it into the binary as a `PanelConfig`

use std::env;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use jog2k_core::config::{clip_line, ConfigError, PanelConfig};

fn main() {
    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());
    setup_linker(&out_dir);
    let config = validate_config();
    write_config(&out_dir, &config);
}

/// Set up linker search paths for memory.x
fn setup_linker(out_dir: &Path) {
    // Copy memory.x to the output directory
    let memory_x = include_bytes!("memory.x");
    let mut f = File::create(out_dir.join("memory.x")).unwrap();
    f.write_all(memory_x).unwrap();

    // Tell rustc where to find memory.x
    println!("cargo:rustc-link-search={}", out_dir.display());

    // Re-run if memory.x changes
    println!("cargo:rerun-if-changed=memory.x");
    println!("cargo:rerun-if-changed=build.rs");
}

/// Parse and validate panel.toml
fn validate_config() -> PanelConfig {
    println!("cargo:rerun-if-changed=panel.toml");

    let config_path = Path::new("panel.toml");

    if !config_path.exists() {
        panic!(
            "\n\
            ╔══════════════════════════════════════════════════════════════════╗\n\
            ║  ERROR: panel.toml not found!                                    ║\n\
            ║                                                                  ║\n\
            ║  The firmware requires a panel.toml configuration file.          ║\n\
            ║  Please create one in the jog2k-firmware directory.              ║\n\
            ╚══════════════════════════════════════════════════════════════════╝\n"
        );
    }

    let config_content = match fs::read_to_string(config_path) {
        Ok(content) => content,
        Err(e) => {
            panic!(
                "\n\
                ╔══════════════════════════════════════════════════════════════════╗\n\
                ║  ERROR: Failed to read panel.toml                                ║\n\
                ║                                                                  ║\n\
                ║  Error: {:<56} ║\n\
                ╚══════════════════════════════════════════════════════════════════╝\n",
                e
            );
        }
    };

    // Syntax and types in one pass: unknown keys take defaults
    let config: PanelConfig = match toml::from_str(&config_content) {
        Ok(config) => config,
        Err(e) => {
            let error_msg = e.to_string();
            panic!(
                "\n\
                ╔══════════════════════════════════════════════════════════════════╗\n\
                ║  ERROR: Invalid panel.toml                                       ║\n\
                ╠══════════════════════════════════════════════════════════════════╣\n\
                ║                                                                  ║\n\
                {}\n\
                ║                                                                  ║\n\
                ╚══════════════════════════════════════════════════════════════════╝\n",
                format_error_lines(&error_msg)
            );
        }
    };

    if let Err(e) = config.validate() {
        panic!(
            "\n\
            ╔══════════════════════════════════════════════════════════════════╗\n\
            ║  ERROR: Invalid panel configuration                              ║\n\
            ╠══════════════════════════════════════════════════════════════════╣\n\
            ║  • {:<62} ║\n\
            ╚══════════════════════════════════════════════════════════════════╝\n",
            describe(e)
        );
    }

    println!("cargo:warning=panel.toml validated successfully");
    config
}

fn describe(e: ConfigError) -> String {
    match e {
        ConfigError::ReservedAddress(addr) => {
            format!("responder_address 0x{:02X} is reserved (use 0x08-0x77)", addr)
        }
        ConfigError::BusFrequency(hz) => {
            format!("bus_frequency_hz {} out of range (10k-1M)", hz)
        }
        ConfigError::ZeroPeriod => "timeouts and tick periods must be non-zero".to_string(),
        ConfigError::TransitionRange => {
            "transition_min_ticks must not exceed transition_max_ticks".to_string()
        }
    }
}

/// Format error message lines with box drawing
fn format_error_lines(msg: &str) -> String {
    msg.lines()
        .map(|line| {
            let truncated = match clip_line(line, 64) {
                (_, true) => format!("{}...", clip_line(line, 61).0),
                (kept, false) => kept.to_string(),
            };
            format!("║  {:<64} ║", truncated)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Emit the validated config as a constant for `include!`
fn write_config(out_dir: &Path, config: &PanelConfig) {
    let source = format!(
        "/// Panel configuration validated from panel.toml at build time\n\
         pub const PANEL_CONFIG: PanelConfig = PanelConfig {{\n    \
             responder_address: {},\n    \
             bus_frequency_hz: {},\n    \
             dispatch_timeout_us: {},\n    \
             strobe_setup_us: {},\n    \
             poll_step_us: {},\n    \
             tick_ms: {},\n    \
             status_request_ticks: {},\n    \
             led_update_ticks: {},\n    \
             heartbeat_ticks: {},\n    \
             rollover_ticks: {},\n    \
             transition_min_ticks: {},\n    \
             transition_max_ticks: {},\n\
         }};\n",
        config.responder_address,
        config.bus_frequency_hz,
        config.dispatch_timeout_us,
        config.strobe_setup_us,
        config.poll_step_us,
        config.tick_ms,
        config.status_request_ticks,
        config.led_update_ticks,
        config.heartbeat_ticks,
        config.rollover_ticks,
        config.transition_min_ticks,
        config.transition_max_ticks,
    );

    fs::write(out_dir.join("panel_config.rs"), source).unwrap();
}
