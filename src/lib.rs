//! # printhost
//!
//! Serial print host for RepRap-style 3D printers:
//! - Serial (USB) connection with auto-detection of the printer board
//! - Line-numbered, checksummed G-code streaming with `ok` flow control
//! - Prioritized manual commands interleaved with a running print
//! - Pause, resume, and stop with a safe shutdown sequence
//! - Live status: temperature, progress, elapsed time, and ETA
//!
//! ## Architecture
//!
//! printhost is organized as a workspace with multiple crates:
//!
//! 1. **printhost-core** - Status model, errors, events, G-code instruction parsing
//! 2. **printhost-communication** - Serial link, command queue, RepRap flow control, controller
//! 3. **printhost-settings** - Configuration file handling
//! 4. **printhost** - Logging setup and the `printhost` binary

pub mod listener;

use printhost_settings::{Config, LoggingSettings};
use std::sync::Arc;
use std::time::Duration;

pub use listener::LogListener;
pub use printhost_communication::firmware;
pub use printhost_core::data;

pub use printhost_core::{
    forward_events, parse_instructions, ConnectionError, ControllerError, Error, EventDispatcher,
    GcodeError, InstructionSource, PrintProgress, PrintStatus, PrinterEvent, PrinterListener,
    Result, SerialListener, StatusCallback, StatusSnapshot,
};

pub use printhost_communication::{
    list_ports, Communicator, ConnectionParams, ControllerConfig, EngineConfig, PrinterController,
    SerialBackend, SerialPortInfo, SystemSerialBackend,
};

pub use printhost_settings::{
    default_config_path, ConnectionSettings, SettingsError, StatusSettings,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Build date (set at compile time)
pub const BUILD_DATE: &str = env!("BUILD_DATE");

/// Controller configuration derived from the host configuration
pub fn controller_config(config: &Config) -> ControllerConfig {
    ControllerConfig {
        connection: ConnectionParams {
            port: config.connection.port.clone(),
            baud_rate: config.connection.baud_rate,
            timeout_ms: config.connection.read_timeout_ms,
        },
        device_marker: config.connection.device_marker.clone(),
        engine: EngineConfig {
            pause_recheck: Duration::from_millis(config.status.pause_recheck_ms),
            ack_timeout: Duration::from_millis(config.status.ack_timeout_ms),
        },
        ..ControllerConfig::default()
    }
}

/// Status poll interval from the host configuration
pub fn poll_interval(config: &Config) -> Duration {
    Duration::from_millis(config.status.poll_interval_ms)
}

/// Initialize logging
///
/// Sets up structured logging with:
/// - Console output with pretty formatting
/// - RUST_LOG environment variable support, falling back to the configured level
/// - An optional plain-text copy in the configured log file
pub fn init_logging(settings: &LoggingSettings) -> anyhow::Result<()> {
    use anyhow::Context;
    use std::fs::OpenOptions;
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&settings.level))
        .with_context(|| format!("invalid log level '{}'", settings.level))?;

    let stdout_layer = fmt::layer()
        .with_writer(std::io::stdout)
        .with_target(true)
        .with_level(true)
        .with_thread_names(true)
        .with_line_number(true)
        .pretty();

    let file_layer = match &settings.file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("cannot open log file {}", path.display()))?;
            Some(
                fmt::layer()
                    .with_writer(Arc::new(file))
                    .with_ansi(false)
                    .with_target(true)
                    .with_level(true),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .with(file_layer)
        .try_init()
        .context("logging already initialized")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_controller_config_mapping() {
        let mut config = Config::default();
        config.connection.port = "/dev/ttyUSB1".to_string();
        config.connection.baud_rate = 250_000;
        config.status.pause_recheck_ms = 250;

        let controller = controller_config(&config);
        assert_eq!(controller.connection.port, "/dev/ttyUSB1");
        assert_eq!(controller.connection.baud_rate, 250_000);
        assert_eq!(controller.connection.timeout_ms, 10);
        assert_eq!(controller.device_marker, "Arduino");
        assert_eq!(controller.engine.pause_recheck, Duration::from_millis(250));
        assert_eq!(poll_interval(&config), Duration::from_secs(5));
    }

    #[test]
    fn test_version_constants() {
        assert!(!VERSION.is_empty());
        assert!(!BUILD_DATE.is_empty());
    }
}
