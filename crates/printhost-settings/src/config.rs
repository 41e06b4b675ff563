//! Configuration management for printhost
//!
//! Provides configuration file handling and validation.
//! Supports JSON and TOML file formats; the default location is the
//! platform config directory.
//!
//! Configuration is organized into logical sections:
//! - Connection settings (port or auto-detection, baud rate, read timeout)
//! - Status settings (poll interval, pause re-check, acknowledgment timeout)
//! - Logging settings (level filter, optional log file)

use crate::error::{ConfigError, ConfigResult, SettingsError, SettingsResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Serial connection settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionSettings {
    /// Serial port, or "auto" to detect the printer
    pub port: String,
    /// Baud rate
    pub baud_rate: u32,
    /// Vendor string identifying the printer board during auto-detection
    pub device_marker: String,
    /// Serial read timeout in milliseconds
    pub read_timeout_ms: u64,
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        Self {
            port: "auto".to_string(),
            baud_rate: 115200,
            device_marker: "Arduino".to_string(),
            read_timeout_ms: 10,
        }
    }
}

/// Status reporting and flow-control timing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatusSettings {
    /// Interval between temperature queries in milliseconds
    pub poll_interval_ms: u64,
    /// Delay before a paused queue is re-checked in milliseconds
    pub pause_recheck_ms: u64,
    /// Time a command may stay unacknowledged before a warning, in milliseconds
    pub ack_timeout_ms: u64,
}

impl Default for StatusSettings {
    fn default() -> Self {
        Self {
            poll_interval_ms: 5000,
            pause_recheck_ms: 500,
            ack_timeout_ms: 60_000,
        }
    }
}

/// Logging settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Default filter directive (overridden by RUST_LOG)
    pub level: String,
    /// Optional file receiving a copy of the log
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
        }
    }
}

/// Complete host configuration
///
/// Aggregates all settings sections and provides file I/O operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// Connection settings
    pub connection: ConnectionSettings,
    /// Status settings
    pub status: StatusSettings,
    /// Logging settings
    pub logging: LoggingSettings,
}

/// Supported on-disk formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Json,
    Toml,
}

impl Format {
    fn from_path(path: &Path) -> SettingsResult<Self> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Ok(Format::Json),
            Some("toml") => Ok(Format::Toml),
            other => Err(ConfigError::UnsupportedFormat(
                other.unwrap_or("<none>").to_string(),
            )
            .into()),
        }
    }
}

/// Default configuration file location (`<config dir>/printhost/config.toml`)
pub fn default_config_path() -> SettingsResult<PathBuf> {
    dirs::config_dir()
        .map(|dir| dir.join("printhost").join("config.toml"))
        .ok_or(SettingsError::NoConfigDirectory)
}

impl Config {
    /// Create new config with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Load config from file (JSON or TOML)
    pub fn load_from_file(path: &Path) -> SettingsResult<Self> {
        let format = Format::from_path(path)?;
        let content = std::fs::read_to_string(path).map_err(|source| SettingsError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let config: Self = match format {
            Format::Json => serde_json::from_str(&content)?,
            Format::Toml => toml::from_str(&content)?,
        };

        config.validate()?;
        Ok(config)
    }

    /// Load the file if it exists, defaults otherwise
    pub fn load_or_default(path: &Path) -> SettingsResult<Self> {
        if path.exists() {
            Self::load_from_file(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Save config to file (JSON or TOML), creating parent directories
    pub fn save_to_file(&self, path: &Path) -> SettingsResult<()> {
        self.validate()?;

        let content = match Format::from_path(path)? {
            Format::Json => serde_json::to_string_pretty(self)?,
            Format::Toml => toml::to_string_pretty(self)?,
        };

        let write_error = |source| SettingsError::Write {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(write_error)?;
        }
        std::fs::write(path, content).map_err(write_error)?;

        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> ConfigResult<()> {
        if self.connection.port.trim().is_empty() {
            return Err(ConfigError::EmptyValue("connection.port".to_string()));
        }

        if self.connection.device_marker.is_empty() {
            return Err(ConfigError::EmptyValue(
                "connection.device_marker".to_string(),
            ));
        }

        let positive = [
            ("connection.baud_rate", u64::from(self.connection.baud_rate)),
            ("connection.read_timeout_ms", self.connection.read_timeout_ms),
            ("status.poll_interval_ms", self.status.poll_interval_ms),
            ("status.pause_recheck_ms", self.status.pause_recheck_ms),
            ("status.ack_timeout_ms", self.status.ack_timeout_ms),
        ];
        if let Some((key, _)) = positive.iter().find(|(_, value)| *value == 0) {
            return Err(ConfigError::ZeroValue {
                key: key.to_string(),
            });
        }

        if self.logging.level.trim().is_empty() {
            return Err(ConfigError::EmptyValue("logging.level".to_string()));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::new();
        assert_eq!(config.connection.port, "auto");
        assert_eq!(config.connection.baud_rate, 115200);
        assert_eq!(config.connection.device_marker, "Arduino");
        assert_eq!(config.status.poll_interval_ms, 5000);
        assert_eq!(config.status.pause_recheck_ms, 500);
        assert_eq!(config.logging.level, "info");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_values() {
        let mut config = Config::new();
        config.connection.baud_rate = 0;
        assert_eq!(
            config.validate(),
            Err(ConfigError::ZeroValue {
                key: "connection.baud_rate".to_string(),
            })
        );

        let mut config = Config::new();
        config.status.poll_interval_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_empty_port() {
        let mut config = Config::new();
        config.connection.port = "  ".to_string();
        assert_eq!(
            config.validate(),
            Err(ConfigError::EmptyValue("connection.port".to_string()))
        );
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: Config = toml::from_str("[connection]\nport = \"/dev/ttyUSB0\"\n").unwrap();
        assert_eq!(config.connection.port, "/dev/ttyUSB0");
        assert_eq!(config.connection.baud_rate, 115200);
        assert_eq!(config.status, StatusSettings::default());
    }

    #[test]
    fn test_unsupported_extension() {
        let err = Config::new().save_to_file(Path::new("printhost.yaml")).unwrap_err();
        assert!(matches!(
            err,
            SettingsError::Invalid(ConfigError::UnsupportedFormat(ref ext)) if ext == "yaml"
        ));
    }

    #[test]
    fn test_default_config_path_file_name() {
        if let Ok(path) = default_config_path() {
            assert!(path.ends_with("printhost/config.toml"));
        }
    }
}
