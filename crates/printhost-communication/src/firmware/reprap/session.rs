//! Print session state machine
//!
//! `DISCONNECTED -> READY -> PRINTING <-> PAUSED`, `PRINTING -> FINISHED -> READY`,
//! and any state back to `DISCONNECTED` when the link goes away. Rejected
//! transitions leave the session untouched.

use chrono::{DateTime, Utc};
use printhost_core::{Error, PrintStatus, Result};
use uuid::Uuid;

/// Print session bookkeeping
#[derive(Debug, Clone, Default)]
pub struct PrintSession {
    status: PrintStatus,
    id: Option<Uuid>,
    total_lines: usize,
    start_time: Option<DateTime<Utc>>,
}

impl PrintSession {
    /// New session in `Disconnected`
    pub fn new() -> Self {
        Self::default()
    }

    /// Current status
    pub fn status(&self) -> PrintStatus {
        self.status
    }

    /// Identifier of the running print, if any
    pub fn id(&self) -> Option<Uuid> {
        self.id
    }

    /// Number of commands in the running print
    pub fn total_lines(&self) -> usize {
        self.total_lines
    }

    /// When the running print started
    pub fn start_time(&self) -> Option<DateTime<Utc>> {
        self.start_time
    }

    /// Link established
    pub fn connected(&mut self) -> Result<()> {
        self.require(PrintStatus::Disconnected, "connect")?;
        self.status = PrintStatus::Ready;
        Ok(())
    }

    /// Link gone, from any state
    pub fn disconnected(&mut self) {
        self.reset();
        self.status = PrintStatus::Disconnected;
    }

    /// Start a print of `total_lines` commands at `now`
    pub fn begin(&mut self, total_lines: usize, now: DateTime<Utc>) -> Result<Uuid> {
        self.require(PrintStatus::Ready, "print")?;
        let id = Uuid::new_v4();
        self.status = PrintStatus::Printing;
        self.id = Some(id);
        self.total_lines = total_lines;
        self.start_time = Some(now);
        Ok(id)
    }

    /// Hold the print lane
    pub fn pause(&mut self) -> Result<()> {
        self.require(PrintStatus::Printing, "pause")?;
        self.status = PrintStatus::Paused;
        Ok(())
    }

    /// Release the print lane
    pub fn resume(&mut self) -> Result<()> {
        self.require(PrintStatus::Paused, "resume")?;
        self.status = PrintStatus::Printing;
        Ok(())
    }

    /// Abort the running or held print
    pub fn stop(&mut self) -> Result<()> {
        if !self.status.is_active() {
            return Err(Error::invalid_transition(self.status, "stop"));
        }
        self.reset();
        self.status = PrintStatus::Ready;
        Ok(())
    }

    /// Print lane drained while printing.
    ///
    /// Passes through `Finished` and settles in `Ready`. Returns the number
    /// of lines the finished print had, or `None` if nothing was printing.
    pub fn finish(&mut self) -> Option<usize> {
        if self.status != PrintStatus::Printing {
            return None;
        }
        self.status = PrintStatus::Finished;
        let total = self.total_lines;
        self.reset();
        self.status = PrintStatus::Ready;
        Some(total)
    }

    fn require(&self, expected: PrintStatus, requested: &str) -> Result<()> {
        if self.status == expected {
            Ok(())
        } else {
            Err(Error::invalid_transition(self.status, requested))
        }
    }

    fn reset(&mut self) {
        self.id = None;
        self.total_lines = 0;
        self.start_time = None;
    }
}
