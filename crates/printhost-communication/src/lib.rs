//! # printhost Communication
//!
//! Serial link and printer protocol for printhost.
//! Opens (or auto-detects) the printer's serial port, frames outbound
//! commands, and runs the single-outstanding-command flow control used by
//! RepRap-style firmware.

pub mod communication;
pub mod firmware;

pub use communication::{
    lines::LineBuffer,
    queue::{checksum, frame_line, CommandQueue},
    serial::{
        detect_printer_port, list_ports, SerialBackend, SerialCommunicator, SerialPortInfo,
        SystemSerialBackend,
    },
    Communicator, ConnectionParams, AUTO_PORT, DEFAULT_BAUD_RATE,
};

pub use firmware::reprap::{
    Connection, ConnectionManager, ControllerConfig, DrainOutcome, EngineConfig, PrintEngine,
    PrintSession, PrinterController, DEFAULT_DEVICE_MARKER, DEFAULT_POLL_INTERVAL,
};
