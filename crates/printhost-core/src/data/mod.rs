//! Data models for print status and status snapshots
//!
//! This module provides:
//! - The print session status enumeration
//! - Print progress figures derived while a print is running
//! - The immutable status snapshot pushed to observers

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Print session status
///
/// `Finished` is momentary: a drained print settles into `Ready` right away.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PrintStatus {
    /// No serial link
    Disconnected,
    /// Linked and idle
    Ready,
    /// Streaming the print lane
    Printing,
    /// Print lane held, control commands still flow
    Paused,
    /// Print lane fully sent
    Finished,
}

impl PrintStatus {
    /// Whether a print session is active (running or held)
    pub fn is_active(&self) -> bool {
        matches!(self, PrintStatus::Printing | PrintStatus::Paused)
    }

    /// Whether the serial link is up
    pub fn is_connected(&self) -> bool {
        !matches!(self, PrintStatus::Disconnected)
    }

    /// Wire name of the status
    pub fn as_str(&self) -> &'static str {
        match self {
            PrintStatus::Disconnected => "DISCONNECTED",
            PrintStatus::Ready => "READY",
            PrintStatus::Printing => "PRINTING",
            PrintStatus::Paused => "PAUSED",
            PrintStatus::Finished => "FINISHED",
        }
    }
}

impl Default for PrintStatus {
    fn default() -> Self {
        PrintStatus::Disconnected
    }
}

impl fmt::Display for PrintStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Progress figures, only present while printing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrintProgress {
    /// Sent share of the print lane, rounded to a whole percent
    pub progress: f64,
    /// When the print started
    pub print_start_time: DateTime<Utc>,
    /// Whole minutes since the print started
    pub elapsed_minutes: u64,
    /// Estimated completion time, if enough data is available
    #[serde(rename = "ETA")]
    pub eta: Option<DateTime<Utc>>,
}

/// Immutable status snapshot
///
/// Serializes to `{ printStatus, temperature, [progress, printStartTime,
/// elapsedMinutes, ETA] }` where the bracketed fields appear only while
/// printing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusSnapshot {
    /// Current print status
    pub print_status: PrintStatus,
    /// Last known hotend temperature in °C
    pub temperature: Option<f64>,
    /// Progress figures while printing
    #[serde(flatten, skip_serializing_if = "Option::is_none")]
    pub progress: Option<PrintProgress>,
}

impl StatusSnapshot {
    /// Snapshot for a status with no print progress
    pub fn idle(print_status: PrintStatus, temperature: Option<f64>) -> Self {
        Self {
            print_status,
            temperature,
            progress: None,
        }
    }
}
