//! printhost Settings Crate
//!
//! Handles the host configuration file: serial connection, status polling
//! and logging sections, stored as JSON or TOML.

pub mod config;
pub mod error;

pub use config::{default_config_path, Config, ConnectionSettings, LoggingSettings, StatusSettings};
pub use error::{ConfigError, ConfigResult, SettingsError, SettingsResult};
