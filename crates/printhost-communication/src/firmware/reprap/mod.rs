//! RepRap-style firmware support
//!
//! Host side of the line-numbered, checksummed, `ok`-acknowledged protocol
//! spoken by Marlin, Repetier and Sprinter boards.

pub mod commands;
pub mod connection;
pub mod controller;
pub mod engine;
pub mod response_parser;
pub mod session;
pub mod status;

pub use connection::{Connection, ConnectionManager, DEFAULT_DEVICE_MARKER};
pub use controller::{ControllerConfig, PrinterController, DEFAULT_POLL_INTERVAL};
pub use engine::{DrainOutcome, EngineConfig, PrintEngine};
pub use session::PrintSession;
