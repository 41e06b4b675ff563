//! Firmware implementations
//!
//! Supported firmware:
//! - RepRap-style (Marlin, Repetier, Sprinter): line-numbered, checksummed
//!   frames acknowledged with `ok`

pub mod reprap;

pub use reprap::{
    ConnectionManager, ControllerConfig, DrainOutcome, EngineConfig, PrintEngine, PrintSession,
    PrinterController,
};
