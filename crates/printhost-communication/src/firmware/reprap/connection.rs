//! Connection manager
//!
//! Resolves the configured port (explicit or auto-detected by device marker)
//! and opens it through a [`SerialBackend`]. The two steps form one pipeline:
//! either a usable [`Connection`] comes back or nothing was opened.

use crate::communication::lines::LineBuffer;
use crate::communication::serial::{detect_printer_port, partition_ports, SerialBackend};
use crate::communication::{Communicator, ConnectionParams};
use printhost_core::{ConnectionError, Error, Result};
use std::sync::Arc;

/// Vendor string that identifies the printer's controller board
pub const DEFAULT_DEVICE_MARKER: &str = "Arduino";

/// An open link to the printer
pub struct Connection {
    communicator: Box<dyn Communicator>,
    port: String,
    baud_rate: u32,
    lines: LineBuffer,
}

impl Connection {
    /// Wrap an opened communicator
    pub fn new(communicator: Box<dyn Communicator>, baud_rate: u32) -> Self {
        let port = communicator.port_name().to_string();
        Self {
            communicator,
            port,
            baud_rate,
            lines: LineBuffer::new(),
        }
    }

    /// Port the link is open on
    pub fn port(&self) -> &str {
        &self.port
    }

    /// Baud rate the link was opened at
    pub fn baud_rate(&self) -> u32 {
        self.baud_rate
    }

    /// Write one command, newline-terminated
    pub fn write_line(&mut self, text: &str) -> Result<()> {
        let mut frame = String::with_capacity(text.len() + 1);
        frame.push_str(text);
        frame.push('\n');
        self.communicator.send(frame.as_bytes())?;
        Ok(())
    }

    /// Read whatever arrived and return the completed lines
    pub fn read_lines(&mut self) -> Result<Vec<String>> {
        let data = self.communicator.receive()?;
        if data.is_empty() {
            return Ok(Vec::new());
        }
        Ok(self.lines.push(&data))
    }

    /// Close the link
    pub fn close(mut self) -> Result<()> {
        self.lines.clear();
        self.communicator.disconnect()
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("port", &self.port)
            .field("baud_rate", &self.baud_rate)
            .finish()
    }
}

/// Opens links to the printer
pub struct ConnectionManager {
    backend: Arc<dyn SerialBackend>,
    params: ConnectionParams,
    device_marker: String,
}

impl ConnectionManager {
    /// Create a manager for the given parameters
    pub fn new(
        backend: Arc<dyn SerialBackend>,
        params: ConnectionParams,
        device_marker: impl Into<String>,
    ) -> Self {
        Self {
            backend,
            params,
            device_marker: device_marker.into(),
        }
    }

    /// Configured connection parameters
    pub fn params(&self) -> &ConnectionParams {
        &self.params
    }

    /// Device marker used for auto-detection
    pub fn device_marker(&self) -> &str {
        &self.device_marker
    }

    /// Port to open: the configured one, or the first marker match for `auto`
    pub fn resolve_port(&self) -> Result<String> {
        if !self.params.is_auto() {
            return Ok(self.params.port.trim().to_string());
        }

        tracing::info!("Trying to detect the printer port automatically");
        let ports = self.backend.available_ports()?;
        match detect_printer_port(&ports, &self.device_marker) {
            Some(port) => {
                tracing::info!("Found printer on {} ({})", port.port_name, port.description);
                Ok(port.port_name.clone())
            }
            None => {
                let available_ports: Vec<String> =
                    ports.iter().map(|p| p.port_name.clone()).collect();
                tracing::error!(
                    "Cannot detect the printer port; make sure the printer is online or set the port explicitly"
                );
                Err(ConnectionError::NoDeviceFound { available_ports }.into())
            }
        }
    }

    /// Resolve the port and open it
    pub fn open(&self) -> Result<Connection> {
        let port = self.resolve_port()?;
        let params = ConnectionParams {
            port: port.clone(),
            ..self.params.clone()
        };

        tracing::info!("Connecting to {} ({} baud)", port, params.baud_rate);
        match self.backend.open(&params) {
            Ok(communicator) => {
                tracing::info!("Connection established");
                Ok(Connection::new(communicator, params.baud_rate))
            }
            Err(e) => Err(self.connection_failed(port, e)),
        }
    }

    /// Attach enumerated alternatives to an open failure
    fn connection_failed(&self, port: String, error: Error) -> Error {
        let reason = match error {
            Error::Connection(ConnectionError::ConnectionFailed { reason, .. }) => reason,
            other => other.to_string(),
        };

        let (suggested_ports, other_ports) = match self.backend.available_ports() {
            Ok(ports) => partition_ports(&ports, &self.device_marker),
            Err(e) => {
                tracing::debug!("Could not list alternative ports: {}", e);
                (Vec::new(), Vec::new())
            }
        };

        for suggestion in &suggested_ports {
            tracing::info!("Set the port to auto or try this port: {}", suggestion);
        }

        let error = ConnectionError::ConnectionFailed {
            port,
            reason,
            suggested_ports,
            other_ports,
        };
        tracing::error!("{}", error);
        error.into()
    }
}
