//! Errors raised while reading, writing and validating the host configuration.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Failure to load or store a configuration file
#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("Cannot read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Cannot write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The platform has no per-user configuration directory
    #[error("No configuration directory on this platform")]
    NoConfigDirectory,

    #[error("Malformed JSON configuration: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Malformed TOML configuration: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Cannot encode configuration as TOML: {0}")]
    TomlEncode(#[from] toml::ser::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(#[from] ConfigError),
}

/// A configuration that parsed but cannot be used
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("'{0}' must not be empty")]
    EmptyValue(String),

    /// File extension other than `.json` or `.toml`
    #[error("Unsupported configuration format '{0}' (expected .json or .toml)")]
    UnsupportedFormat(String),

    #[error("'{key}' must be greater than zero")]
    ZeroValue { key: String },
}

pub type SettingsResult<T> = Result<T, SettingsError>;

pub type ConfigResult<T> = Result<T, ConfigError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_key() {
        let err = ConfigError::ZeroValue {
            key: "status.poll_interval_ms".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "'status.poll_interval_ms' must be greater than zero"
        );
        assert_eq!(
            ConfigError::EmptyValue("connection.port".to_string()).to_string(),
            "'connection.port' must not be empty"
        );
    }

    #[test]
    fn test_read_error_names_the_file() {
        let err = SettingsError::Read {
            path: PathBuf::from("/etc/printhost.toml"),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        };
        assert_eq!(err.to_string(), "Cannot read /etc/printhost.toml: denied");
    }

    #[test]
    fn test_validation_error_converts() {
        let err: SettingsError = ConfigError::UnsupportedFormat("yaml".to_string()).into();
        assert!(matches!(err, SettingsError::Invalid(ConfigError::UnsupportedFormat(_))));
    }
}
