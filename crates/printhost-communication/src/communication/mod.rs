//! Communication layer
//!
//! Low-level link abstraction between the host and the printer:
//! - [`Communicator`]: byte-level read/write over an open link
//! - [`ConnectionParams`]: what to open and how
//! - [`serial`]: serial port enumeration, detection, and opening
//! - [`queue`]: the two-lane command queue with line-number framing
//! - [`lines`]: inbound line framing

pub mod lines;
pub mod queue;
pub mod serial;

use printhost_core::Result;
use serde::{Deserialize, Serialize};

/// Port sentinel that requests auto-detection
pub const AUTO_PORT: &str = "auto";

/// Default baud rate for RepRap-style firmware
pub const DEFAULT_BAUD_RATE: u32 = 115_200;

/// Connection parameters for a serial link
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionParams {
    /// Port name (e.g., "/dev/ttyACM0", "COM3") or [`AUTO_PORT`]
    pub port: String,
    /// Baud rate
    pub baud_rate: u32,
    /// Read timeout in milliseconds; reads return empty after this long
    pub timeout_ms: u64,
}

impl ConnectionParams {
    /// Create parameters for a port and baud rate
    pub fn new(port: impl Into<String>, baud_rate: u32) -> Self {
        Self {
            port: port.into(),
            baud_rate,
            ..Self::default()
        }
    }

    /// Whether the port should be auto-detected
    pub fn is_auto(&self) -> bool {
        self.port.trim().eq_ignore_ascii_case(AUTO_PORT)
    }
}

impl Default for ConnectionParams {
    fn default() -> Self {
        Self {
            port: AUTO_PORT.to_string(),
            baud_rate: DEFAULT_BAUD_RATE,
            timeout_ms: 10,
        }
    }
}

/// Byte-level link to the printer
///
/// Implementations own an open link. `receive` must not block longer than
/// the configured read timeout and returns an empty buffer when nothing
/// arrived.
pub trait Communicator: Send {
    /// Write raw bytes, returning the number written
    fn send(&mut self, data: &[u8]) -> Result<usize>;

    /// Read whatever bytes are available
    fn receive(&mut self) -> Result<Vec<u8>>;

    /// Whether the link is still usable
    fn is_connected(&self) -> bool;

    /// Close the link
    fn disconnect(&mut self) -> Result<()>;

    /// Name of the port behind this link
    fn port_name(&self) -> &str;
}
