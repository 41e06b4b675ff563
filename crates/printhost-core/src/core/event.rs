//! Event system for printer controller communication
//!
//! Provides:
//! - Event types for connection, print session, and telemetry changes
//! - Event dispatcher for publishing events to subscribers

use crate::data::{PrintStatus, StatusSnapshot};
use tokio::sync::broadcast;

/// Printer controller event types
#[derive(Debug, Clone)]
pub enum PrinterEvent {
    /// Serial link established on the given port
    Connected(String),
    /// Serial link closed
    Disconnected,
    /// Print status changed
    StatusChanged(PrintStatus),
    /// A fresh status snapshot is available
    Status(StatusSnapshot),
    /// Line received from the printer
    LineReceived(String),
    /// Line written to the printer
    LineSent(String),
    /// The print lane has been fully sent
    PrintFinished {
        /// Number of lines streamed
        total_lines: usize,
    },
    /// A command has been waiting for its acknowledgment too long
    Unacknowledged {
        /// The outstanding command
        command: String,
        /// How long it has been outstanding
        waited_ms: u64,
    },
    /// Recoverable error surfaced to observers
    Error(String),
}

impl std::fmt::Display for PrinterEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PrinterEvent::Connected(port) => write!(f, "Connected to {}", port),
            PrinterEvent::Disconnected => write!(f, "Disconnected"),
            PrinterEvent::StatusChanged(status) => write!(f, "Status: {}", status),
            PrinterEvent::Status(snapshot) => {
                write!(f, "Snapshot: {}", snapshot.print_status)?;
                if let Some(temp) = snapshot.temperature {
                    write!(f, " T:{:.1}", temp)?;
                }
                Ok(())
            }
            PrinterEvent::LineReceived(line) => write!(f, "RECV: {}", line),
            PrinterEvent::LineSent(line) => write!(f, "SENT: {}", line),
            PrinterEvent::PrintFinished { total_lines } => {
                write!(f, "Print finished ({} lines)", total_lines)
            }
            PrinterEvent::Unacknowledged { command, waited_ms } => {
                write!(f, "No acknowledgment for '{}' after {}ms", command, waited_ms)
            }
            PrinterEvent::Error(msg) => write!(f, "Error: {}", msg),
        }
    }
}

/// Event dispatcher for publishing events to subscribers
#[derive(Clone)]
pub struct EventDispatcher {
    /// Broadcast sender channel for printer events.
    tx: broadcast::Sender<PrinterEvent>,
}

impl EventDispatcher {
    /// Create a new event dispatcher
    ///
    /// # Arguments
    /// * `buffer_size` - Size of the broadcast buffer (default 100)
    pub fn new(buffer_size: usize) -> Self {
        let (tx, _) = broadcast::channel(buffer_size);
        Self { tx }
    }

    /// Subscribe to events
    pub fn subscribe(&self) -> broadcast::Receiver<PrinterEvent> {
        self.tx.subscribe()
    }

    /// Publish an event to all subscribers
    ///
    /// Returns the number of subscribers that received the event; having
    /// nobody listening is not an error.
    pub fn publish(&self, event: PrinterEvent) -> usize {
        self.tx.send(event).unwrap_or(0)
    }

    /// Get number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for EventDispatcher {
    fn default() -> Self {
        Self::new(100)
    }
}
