//! Serial port communication implementation
//!
//! Provides low-level serial port operations for direct hardware connection
//! to printer controller boards via USB.
//!
//! Supports:
//! - Port enumeration and discovery
//! - Known-device matching for auto-detection
//! - Opening a port at a baud rate with a short read timeout
//! - Non-blocking style reads (timeouts yield empty reads)

use crate::communication::{Communicator, ConnectionParams};
use printhost_core::{ConnectionError, Error, Result};
use std::io::{self, Read, Write};
use std::time::Duration;

/// Information about an available serial port
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerialPortInfo {
    /// Port name (e.g., "/dev/ttyACM0", "COM3")
    pub port_name: String,

    /// Port description (e.g., "USB Arduino (www.arduino.cc) Mega 2560")
    pub description: String,

    /// Manufacturer name if available
    pub manufacturer: Option<String>,

    /// Product name if available
    pub product: Option<String>,

    /// Serial number if available
    pub serial_number: Option<String>,

    /// USB vendor ID if applicable
    pub vid: Option<u16>,

    /// USB product ID if applicable
    pub pid: Option<u16>,
}

impl SerialPortInfo {
    /// Create a new port info
    pub fn new(port_name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            port_name: port_name.into(),
            description: description.into(),
            manufacturer: None,
            product: None,
            serial_number: None,
            vid: None,
            pid: None,
        }
    }

    /// Set manufacturer
    pub fn with_manufacturer(mut self, manufacturer: impl Into<String>) -> Self {
        self.manufacturer = Some(manufacturer.into());
        self
    }

    /// Set product
    pub fn with_product(mut self, product: impl Into<String>) -> Self {
        self.product = Some(product.into());
        self
    }

    /// Set serial number
    pub fn with_serial_number(mut self, serial_number: impl Into<String>) -> Self {
        self.serial_number = Some(serial_number.into());
        self
    }

    /// Set USB IDs
    pub fn with_usb_ids(mut self, vid: u16, pid: u16) -> Self {
        self.vid = Some(vid);
        self.pid = Some(pid);
        self
    }

    /// Whether the port's descriptor mentions the device marker
    ///
    /// Checks manufacturer first, then product and description.
    pub fn matches_marker(&self, marker: &str) -> bool {
        if marker.is_empty() {
            return false;
        }

        [
            self.manufacturer.as_deref(),
            self.product.as_deref(),
            Some(self.description.as_str()),
        ]
        .into_iter()
        .flatten()
        .any(|field| field.contains(marker))
    }
}

/// Pick the first port whose descriptor matches the marker
pub fn detect_printer_port<'a>(
    ports: &'a [SerialPortInfo],
    marker: &str,
) -> Option<&'a SerialPortInfo> {
    ports.iter().find(|port| port.matches_marker(marker))
}

/// Split port names into (matching the marker, everything else)
pub fn partition_ports(ports: &[SerialPortInfo], marker: &str) -> (Vec<String>, Vec<String>) {
    let (matching, others): (Vec<_>, Vec<_>) =
        ports.iter().partition(|port| port.matches_marker(marker));
    (
        matching.into_iter().map(|p| p.port_name.clone()).collect(),
        others.into_iter().map(|p| p.port_name.clone()).collect(),
    )
}

/// List available serial ports on the system
///
/// Returns every port the OS reports, with USB descriptor details where
/// available.
pub fn list_ports() -> Result<Vec<SerialPortInfo>> {
    match serialport::available_ports() {
        Ok(ports) => {
            let port_infos: Vec<SerialPortInfo> = ports
                .iter()
                .map(|port| {
                    let info = SerialPortInfo::new(&port.port_name, get_port_description(port));

                    match &port.port_type {
                        serialport::SerialPortType::UsbPort(usb_info) => {
                            let mut info = info.with_usb_ids(usb_info.vid, usb_info.pid);
                            if let Some(ref mfg) = usb_info.manufacturer {
                                info = info.with_manufacturer(mfg);
                            }
                            if let Some(ref product) = usb_info.product {
                                info = info.with_product(product);
                            }
                            if let Some(ref serial) = usb_info.serial_number {
                                info = info.with_serial_number(serial);
                            }
                            info
                        }
                        _ => info,
                    }
                })
                .collect();

            Ok(port_infos)
        }
        Err(e) => {
            tracing::error!("Failed to enumerate serial ports: {}", e);
            Err(ConnectionError::PortEnumeration {
                reason: e.to_string(),
            }
            .into())
        }
    }
}

/// Get a user-friendly description for a port
fn get_port_description(port: &serialport::SerialPortInfo) -> String {
    match &port.port_type {
        serialport::SerialPortType::UsbPort(usb_info) => {
            format!(
                "USB {} {}",
                usb_info.manufacturer.as_deref().unwrap_or("Device"),
                usb_info.product.as_deref().unwrap_or("Serial Port")
            )
        }
        serialport::SerialPortType::BluetoothPort => "Bluetooth Serial".to_string(),
        serialport::SerialPortType::PciPort => "PCI Serial".to_string(),
        _ => "Serial Port".to_string(),
    }
}

/// Source of serial links
///
/// Separates port discovery and opening from the protocol so the controller
/// can run against real hardware or an in-memory printer.
pub trait SerialBackend: Send + Sync {
    /// Enumerate the ports that could host a printer
    fn available_ports(&self) -> Result<Vec<SerialPortInfo>>;

    /// Open a link with the given parameters
    fn open(&self, params: &ConnectionParams) -> Result<Box<dyn Communicator>>;
}

/// Backend over the operating system's serial ports
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemSerialBackend;

impl SerialBackend for SystemSerialBackend {
    fn available_ports(&self) -> Result<Vec<SerialPortInfo>> {
        list_ports()
    }

    fn open(&self, params: &ConnectionParams) -> Result<Box<dyn Communicator>> {
        Ok(Box::new(SerialCommunicator::open(params)?))
    }
}

/// Serial port link using the serialport crate
pub struct SerialCommunicator {
    port: Option<Box<dyn serialport::SerialPort>>,
    port_name: String,
}

impl SerialCommunicator {
    /// Open a serial port with the given parameters (8N1, no flow control)
    pub fn open(params: &ConnectionParams) -> Result<Self> {
        let builder = serialport::new(&params.port, params.baud_rate)
            .timeout(Duration::from_millis(params.timeout_ms.max(1)))
            .data_bits(serialport::DataBits::Eight)
            .stop_bits(serialport::StopBits::One)
            .parity(serialport::Parity::None)
            .flow_control(serialport::FlowControl::None);

        match builder.open() {
            Ok(port) => Ok(SerialCommunicator {
                port: Some(port),
                port_name: params.port.clone(),
            }),
            Err(e) => {
                tracing::warn!("Failed to open serial port {}: {}", params.port, e);
                Err(ConnectionError::ConnectionFailed {
                    port: params.port.clone(),
                    reason: e.to_string(),
                    suggested_ports: Vec::new(),
                    other_ports: Vec::new(),
                }
                .into())
            }
        }
    }

    fn port_mut(&mut self) -> Result<&mut Box<dyn serialport::SerialPort>> {
        self.port
            .as_mut()
            .ok_or_else(|| Error::Connection(ConnectionError::NotConnected))
    }
}

impl Communicator for SerialCommunicator {
    fn send(&mut self, data: &[u8]) -> Result<usize> {
        let port = self.port_mut()?;
        port.write_all(data)
            .and_then(|_| port.flush())
            .map_err(|e| Error::link(format!("write failed: {}", e)))?;
        Ok(data.len())
    }

    fn receive(&mut self) -> Result<Vec<u8>> {
        let port = self.port_mut()?;
        let mut buf = [0u8; 256];
        match port.read(&mut buf) {
            Ok(n) => Ok(buf[..n].to_vec()),
            Err(e) if e.kind() == io::ErrorKind::TimedOut => Ok(Vec::new()),
            Err(e) => Err(Error::link(format!("read failed: {}", e))),
        }
    }

    fn is_connected(&self) -> bool {
        self.port.is_some()
    }

    fn disconnect(&mut self) -> Result<()> {
        // Dropping the handle closes the port
        self.port = None;
        Ok(())
    }

    fn port_name(&self) -> &str {
        &self.port_name
    }
}
