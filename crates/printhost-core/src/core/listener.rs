//! Printer listener interface
//!
//! Defines the observer trait and the callback aliases used by the
//! controller's status poller and serial listener slots.

use crate::core::event::PrinterEvent;
use crate::data::{PrintStatus, StatusSnapshot};
use crate::types::SharedDataCallback;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

/// Callback receiving every pushed status snapshot
pub type StatusCallback = SharedDataCallback<StatusSnapshot>;

/// Callback receiving every raw line read from the printer
pub type SerialListener = SharedDataCallback<String>;

/// Listener trait for printer events
///
/// Implement this trait to receive notifications from a controller event
/// stream. All methods have empty defaults.
#[async_trait]
pub trait PrinterListener: Send + Sync {
    /// Called when the print status changes
    async fn on_status_changed(&self, _status: PrintStatus) {}

    /// Called when a status snapshot is pushed
    async fn on_snapshot(&self, _snapshot: &StatusSnapshot) {}

    /// Called for every line received from the printer
    async fn on_line(&self, _line: &str) {}

    /// Called when a recoverable error is surfaced
    async fn on_error(&self, _message: &str) {}
}

/// Forward an event stream to a listener until the stream closes.
///
/// Lagged receivers skip the missed events and keep going.
pub fn forward_events(
    mut rx: broadcast::Receiver<PrinterEvent>,
    listener: Arc<dyn PrinterListener>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(event) => dispatch(listener.as_ref(), &event).await,
                Err(broadcast::error::RecvError::Lagged(missed)) => {
                    tracing::warn!("Listener lagged behind, {} events dropped", missed);
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    })
}

async fn dispatch(listener: &dyn PrinterListener, event: &PrinterEvent) {
    match event {
        PrinterEvent::StatusChanged(status) => listener.on_status_changed(*status).await,
        PrinterEvent::Status(snapshot) => listener.on_snapshot(snapshot).await,
        PrinterEvent::LineReceived(line) => listener.on_line(line).await,
        PrinterEvent::Error(msg) => listener.on_error(msg).await,
        PrinterEvent::Unacknowledged { .. } => listener.on_error(&event.to_string()).await,
        _ => {}
    }
}
