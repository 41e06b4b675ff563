//! # printhost Core
//!
//! Core types, errors, and utilities for printhost.
//! Provides the print status model, status snapshots, controller events,
//! observer interfaces, and G-code instruction parsing.

pub mod core;
pub mod data;
pub mod error;
pub mod gcode;
pub mod types;

pub use crate::core::{
    event::{EventDispatcher, PrinterEvent},
    listener::{forward_events, PrinterListener, SerialListener, StatusCallback},
};

pub use data::{PrintProgress, PrintStatus, StatusSnapshot};

pub use error::{ConnectionError, ControllerError, Error, GcodeError, Result};

pub use gcode::{parse_instructions, InstructionSource};

// Re-export type aliases for convenience
pub use types::SharedDataCallback;
