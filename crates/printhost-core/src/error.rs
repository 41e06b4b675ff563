//! Error handling for printhost
//!
//! Provides error types for all layers of the print host:
//! - Connection errors (port detection, link open, mid-session link faults)
//! - Controller errors (print session state machine violations)
//! - G-Code errors (instruction file loading and parsing)
//!
//! All error types use `thiserror` for ergonomic error handling. Every
//! variant is recoverable: none of them is allowed to take the process down.

use thiserror::Error;

fn join_ports(ports: &[String]) -> String {
    if ports.is_empty() {
        "none".to_string()
    } else {
        ports.join(", ")
    }
}

/// Controller error type
///
/// Represents errors raised by the print session state machine and the
/// controller task that owns it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ControllerError {
    /// Control call is not valid for the current print status
    #[error("Invalid state transition from {current} to {requested}")]
    InvalidStateTransition {
        /// The current print status.
        current: String,
        /// The requested operation or target status.
        requested: String,
    },

    /// The controller task is no longer running
    #[error("Controller task has stopped")]
    ControllerStopped,
}

/// G-Code error type
///
/// Represents errors related to loading and parsing instruction files.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GcodeError {
    /// The instruction file parsed to zero executable lines
    #[error("Print file is invalid: {source_name} contains no executable commands")]
    InvalidPrintFile {
        /// Human readable name of the instruction source.
        source_name: String,
    },

    /// The instruction file could not be read
    #[error("File error: {reason}")]
    FileError {
        /// The reason for the file error.
        reason: String,
    },
}

/// Connection error type
///
/// Represents errors related to the serial link to the printer.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConnectionError {
    /// The link could not be opened
    #[error(
        "Failed to open port {port}: {reason} (matching devices: {}; other available ports: {})",
        join_ports(.suggested_ports),
        join_ports(.other_ports)
    )]
    ConnectionFailed {
        /// The port that failed to open.
        port: String,
        /// The reason the port failed to open.
        reason: String,
        /// Enumerated ports that look like the printer.
        suggested_ports: Vec<String>,
        /// Remaining enumerated ports (not necessarily the printer).
        other_ports: Vec<String>,
    },

    /// Auto-detection found no matching device
    #[error("No printer detected (available ports: {})", join_ports(.available_ports))]
    NoDeviceFound {
        /// All ports seen during enumeration.
        available_ports: Vec<String>,
    },

    /// Serial ports could not be enumerated
    #[error("Failed to enumerate serial ports: {reason}")]
    PortEnumeration {
        /// The reason enumeration failed.
        reason: String,
    },

    /// Mid-session serial fault
    #[error("Serial link error: {reason}")]
    LinkError {
        /// The reason for the link error.
        reason: String,
    },

    /// Operation needs an open link
    #[error("Printer not connected")]
    NotConnected,
}

/// Main error type for printhost
///
/// A unified error type that can represent any error from all layers.
/// This is the primary error type used in public APIs.
#[derive(Error, Debug)]
pub enum Error {
    /// Controller error
    #[error(transparent)]
    Controller(#[from] ControllerError),

    /// G-Code error
    #[error(transparent)]
    Gcode(#[from] GcodeError),

    /// Connection error
    #[error(transparent)]
    Connection(#[from] ConnectionError),

    /// Standard I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an error from a string message
    pub fn other(msg: impl Into<String>) -> Self {
        Error::Other(msg.into())
    }

    /// Shorthand for an [`ControllerError::InvalidStateTransition`]
    pub fn invalid_transition(current: impl ToString, requested: impl Into<String>) -> Self {
        Error::Controller(ControllerError::InvalidStateTransition {
            current: current.to_string(),
            requested: requested.into(),
        })
    }

    /// Shorthand for a [`ConnectionError::LinkError`]
    pub fn link(reason: impl Into<String>) -> Self {
        Error::Connection(ConnectionError::LinkError {
            reason: reason.into(),
        })
    }

    /// Check if this is a connection error
    pub fn is_connection_error(&self) -> bool {
        matches!(self, Error::Connection(_))
    }

    /// Check if this is a G-Code error
    pub fn is_gcode_error(&self) -> bool {
        matches!(self, Error::Gcode(_))
    }

    /// Check if this is a controller error
    pub fn is_controller_error(&self) -> bool {
        matches!(self, Error::Controller(_))
    }

    /// Check if this is a rejected state transition
    pub fn is_invalid_transition(&self) -> bool {
        matches!(
            self,
            Error::Controller(ControllerError::InvalidStateTransition { .. })
        )
    }

    /// Whether the operator can recover by retrying or reconnecting.
    ///
    /// Only a stopped controller task is beyond recovery for this instance.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Error::Controller(ControllerError::ControllerStopped))
    }
}

/// Result type using Error
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_failed_lists_ports() {
        let err = ConnectionError::ConnectionFailed {
            port: "/dev/ttyUSB0".to_string(),
            reason: "Permission denied".to_string(),
            suggested_ports: vec!["/dev/ttyACM0".to_string()],
            other_ports: vec![],
        };
        assert_eq!(
            err.to_string(),
            "Failed to open port /dev/ttyUSB0: Permission denied \
             (matching devices: /dev/ttyACM0; other available ports: none)"
        );
    }

    #[test]
    fn test_no_device_found_display() {
        let err = ConnectionError::NoDeviceFound {
            available_ports: vec!["COM1".to_string(), "COM4".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "No printer detected (available ports: COM1, COM4)"
        );
    }

    #[test]
    fn test_error_classification() {
        let err = Error::invalid_transition("PRINTING", "print");
        assert!(err.is_controller_error());
        assert!(err.is_invalid_transition());
        assert!(err.is_recoverable());
        assert_eq!(
            err.to_string(),
            "Invalid state transition from PRINTING to print"
        );

        let err = Error::link("device reports an error");
        assert!(err.is_connection_error());
        assert!(!err.is_gcode_error());

        let err: Error = ControllerError::ControllerStopped.into();
        assert!(!err.is_recoverable());
    }

    #[test]
    fn test_io_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: Error = io.into();
        assert!(matches!(err, Error::Io(_)));
    }
}
