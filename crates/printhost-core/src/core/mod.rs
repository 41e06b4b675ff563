//! Controller-facing abstractions
//!
//! Event types published by the print controller and the observer
//! interfaces the outer layers implement.

pub mod event;
pub mod listener;

pub use event::{EventDispatcher, PrinterEvent};
pub use listener::{forward_events, PrinterListener, SerialListener, StatusCallback};
