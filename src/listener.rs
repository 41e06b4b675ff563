//! Logging observer for controller events

use async_trait::async_trait;
use printhost_core::{PrintStatus, PrinterListener, StatusSnapshot};

/// Writes controller events to the log
#[derive(Debug, Default, Clone, Copy)]
pub struct LogListener;

#[async_trait]
impl PrinterListener for LogListener {
    async fn on_status_changed(&self, status: PrintStatus) {
        tracing::info!("Print status: {}", status);
    }

    async fn on_snapshot(&self, snapshot: &StatusSnapshot) {
        if let Some(progress) = &snapshot.progress {
            let eta = progress
                .eta
                .map(|eta| eta.format("%H:%M").to_string())
                .unwrap_or_else(|| "unknown".to_string());
            tracing::info!(
                "Progress {}% after {} min, ETA {}",
                progress.progress,
                progress.elapsed_minutes,
                eta
            );
        }
    }

    async fn on_error(&self, message: &str) {
        tracing::error!("{}", message);
    }
}
