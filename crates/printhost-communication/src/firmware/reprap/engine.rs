//! Flow-control engine
//!
//! Synchronous core of the printer controller. Owns the link, the two-lane
//! command queue and the print session, and enforces the single-outstanding
//! command discipline: nothing is written while a command awaits its `ok`.
//!
//! The engine never sleeps or spawns. Timers (status poll, pause re-check)
//! live in the async controller, which calls back into the engine when they
//! fire.

use super::commands::{split_script, REPORT_TEMPERATURE, SHUTDOWN_SEQUENCE};
use super::connection::Connection;
use super::response_parser;
use super::session::PrintSession;
use super::status;
use crate::communication::queue::CommandQueue;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use printhost_core::{
    Error, EventDispatcher, GcodeError, PrintStatus, PrinterEvent, Result, SerialListener,
    StatusCallback, StatusSnapshot,
};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Engine timing configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    /// Delay before a held (paused) queue is looked at again
    pub pause_recheck: Duration,
    /// How long a command may wait for `ok` before a warning is published
    pub ack_timeout: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            pause_recheck: Duration::from_millis(500),
            ack_timeout: Duration::from_secs(60),
        }
    }
}

/// Result of one drain step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrainOutcome {
    /// A command was written and is now in flight
    Sent,
    /// Paused with no prioritized work; the re-check timer is armed
    Held,
    /// Nothing to send (or no link)
    Idle,
    /// A command is still awaiting its acknowledgment
    Busy,
}

#[derive(Debug)]
struct InFlight {
    command: String,
    sent_at: Instant,
    reported: bool,
}

/// Flow-control engine for RepRap-style firmware
pub struct PrintEngine {
    config: EngineConfig,
    link: Option<Connection>,
    queue: CommandQueue,
    session: PrintSession,
    temperature: Option<f64>,
    in_flight: Option<InFlight>,
    recheck_at: Option<Instant>,
    events: EventDispatcher,
    shared_status: Arc<RwLock<PrintStatus>>,
    status_callback: Option<StatusCallback>,
    serial_listener: Option<SerialListener>,
}

impl PrintEngine {
    /// Create a disconnected engine publishing to `events`
    pub fn new(config: EngineConfig, events: EventDispatcher) -> Self {
        Self {
            config,
            link: None,
            queue: CommandQueue::new(),
            session: PrintSession::new(),
            temperature: None,
            in_flight: None,
            recheck_at: None,
            events,
            shared_status: Arc::new(RwLock::new(PrintStatus::Disconnected)),
            status_callback: None,
            serial_listener: None,
        }
    }

    /// Status cell kept in sync with the session, readable from other tasks
    pub fn shared_status(&self) -> Arc<RwLock<PrintStatus>> {
        self.shared_status.clone()
    }

    /// Event stream the engine publishes to
    pub fn events(&self) -> &EventDispatcher {
        &self.events
    }

    /// Current print status
    pub fn status(&self) -> PrintStatus {
        self.session.status()
    }

    /// Whether a print is running or held
    pub fn is_printing(&self) -> bool {
        self.session.status().is_active()
    }

    /// Whether a link is open
    pub fn is_connected(&self) -> bool {
        self.link.is_some()
    }

    /// Port of the open link
    pub fn port(&self) -> Option<&str> {
        self.link.as_ref().map(Connection::port)
    }

    /// Last temperature reading
    pub fn temperature(&self) -> Option<f64> {
        self.temperature
    }

    /// Pending commands
    pub fn queue(&self) -> &CommandQueue {
        &self.queue
    }

    /// Command awaiting its acknowledgment
    pub fn in_flight(&self) -> Option<&str> {
        self.in_flight.as_ref().map(|f| f.command.as_str())
    }

    /// When the held queue should be looked at again
    pub fn next_recheck(&self) -> Option<Instant> {
        self.recheck_at
    }

    /// Register the status callback, replacing any previous one
    pub fn set_status_callback(&mut self, callback: Option<StatusCallback>) {
        self.status_callback = callback;
    }

    /// Register the raw line listener, replacing any previous one
    pub fn set_serial_listener(&mut self, listener: Option<SerialListener>) {
        self.serial_listener = listener;
    }

    /// Fail unless a new link may be attached
    pub fn ensure_can_connect(&self) -> Result<()> {
        if self.link.is_some() || self.session.status() != PrintStatus::Disconnected {
            return Err(Error::invalid_transition(self.session.status(), "connect"));
        }
        Ok(())
    }

    /// Take ownership of an opened link; the session becomes `Ready`
    pub fn attach(&mut self, connection: Connection) -> Result<()> {
        self.ensure_can_connect()?;
        let port = connection.port().to_string();
        self.link = Some(connection);
        self.transition(PrintSession::connected)?;
        self.events.publish(PrinterEvent::Connected(port));
        Ok(())
    }

    /// Close the link and forget all pending work. No-op when disconnected.
    pub fn detach(&mut self) -> Result<()> {
        let Some(link) = self.link.take() else {
            return Ok(());
        };

        tracing::info!("Disconnecting printer on {}", link.port());
        self.clear_pending();
        self.in_flight = None;
        self.transition(|session| {
            session.disconnected();
            Ok(())
        })?;
        self.events.publish(PrinterEvent::Disconnected);
        link.close()
    }

    /// Fail unless a print may start
    pub fn ensure_can_print(&self) -> Result<()> {
        let current = self.session.status();
        if current != PrintStatus::Ready {
            return Err(Error::invalid_transition(current, "print"));
        }
        Ok(())
    }

    /// Start streaming `commands`
    pub fn start_print(&mut self, commands: Vec<String>, source_name: &str) -> Result<()> {
        self.ensure_can_print()?;
        if commands.is_empty() {
            tracing::error!("Print file {} is invalid", source_name);
            return Err(GcodeError::InvalidPrintFile {
                source_name: source_name.to_string(),
            }
            .into());
        }

        let total = commands.len();
        let now = Utc::now();
        self.queue.load_print_lane(commands);
        let id = self.transition(|session| session.begin(total, now))?;
        tracing::info!(
            "Starting print {} of {} ({} lines)",
            id,
            source_name,
            total
        );

        // The firmware only speaks after a command; a status query gets the
        // first `ok` flowing
        if self.in_flight.is_none() {
            self.write(REPORT_TEMPERATURE);
        }
        Ok(())
    }

    /// Hold the print lane
    pub fn pause(&mut self) -> Result<()> {
        self.transition(PrintSession::pause)?;
        tracing::info!("Pausing print");
        Ok(())
    }

    /// Release the print lane and continue where it stopped
    pub fn resume(&mut self) -> Result<()> {
        self.transition(PrintSession::resume)?;
        tracing::info!("Resuming print");
        self.recheck_at = None;
        self.drain();
        Ok(())
    }

    /// Abort the print and queue the shutdown sequence
    pub fn stop(&mut self) -> Result<()> {
        self.transition(PrintSession::stop)?;
        tracing::info!("Stopping print");
        self.clear_pending();
        for command in SHUTDOWN_SEQUENCE {
            self.queue.push_prioritized(command);
        }
        self.drain();
        Ok(())
    }

    /// Submit a manual/control command.
    ///
    /// Returns `false` when the command was dropped (blank, or no link).
    pub fn send_command(&mut self, text: &str) -> Result<bool> {
        let command = text.trim();
        if command.is_empty() {
            return Ok(false);
        }

        if !self.session.status().is_connected() {
            tracing::warn!("Dropping command '{}': printer not connected", command);
            return Ok(false);
        }

        tracing::debug!("Queueing prioritized command: {}", command);
        self.queue.push_prioritized(command);
        self.drain();
        Ok(true)
    }

    /// Submit a `;`-separated script; returns how many commands were accepted
    pub fn send_commands(&mut self, script: &str) -> Result<usize> {
        let mut accepted = 0;
        for command in split_script(script) {
            if self.send_command(command)? {
                accepted += 1;
            }
        }
        Ok(accepted)
    }

    /// Send the next command if the link is free
    pub fn drain(&mut self) -> DrainOutcome {
        if self.link.is_none() {
            return DrainOutcome::Idle;
        }
        if self.in_flight.is_some() {
            return DrainOutcome::Busy;
        }

        if let Some(command) = self.queue.pop_prioritized() {
            return self.sent_or_idle(&command);
        }

        if self.session.status() == PrintStatus::Paused {
            tracing::debug!("Still paused");
            self.recheck_at = Some(Instant::now() + self.config.pause_recheck);
            return DrainOutcome::Held;
        }

        let Some(frame) = self.queue.pop_print_frame() else {
            return DrainOutcome::Idle;
        };
        let lane_drained = !self.queue.has_print_lines();
        let outcome = self.sent_or_idle(&frame);
        if outcome == DrainOutcome::Sent && lane_drained {
            self.finish_print();
        }
        outcome
    }

    /// Pause re-check timer fired
    pub fn recheck(&mut self, now: Instant) -> DrainOutcome {
        match self.recheck_at {
            Some(at) if now >= at => {
                self.recheck_at = None;
                self.drain()
            }
            _ => DrainOutcome::Idle,
        }
    }

    /// Read the link and react to every completed line
    pub fn poll_link(&mut self) -> usize {
        let Some(link) = self.link.as_mut() else {
            return 0;
        };

        match link.read_lines() {
            Ok(lines) => {
                for line in &lines {
                    self.handle_line(line);
                }
                lines.len()
            }
            Err(e) => {
                self.link_failure(e);
                0
            }
        }
    }

    /// React to one inbound line
    pub fn handle_line(&mut self, line: &str) {
        tracing::debug!("RECV: {}", line);

        if let Some(listener) = &self.serial_listener {
            listener(line.to_string());
        }
        self.events.publish(PrinterEvent::LineReceived(line.to_string()));

        let parsed = response_parser::parse(line);
        if parsed.acknowledged {
            self.in_flight = None;
            self.drain();
        }
        if let Some(temperature) = parsed.temperature {
            self.temperature = Some(temperature);
            self.push_status(Utc::now());
        }
    }

    /// Publish a warning once for a command that has waited too long
    pub fn check_ack_timeout(&mut self, now: Instant) {
        let Some(in_flight) = self.in_flight.as_mut() else {
            return;
        };
        let waited = now.saturating_duration_since(in_flight.sent_at);
        if in_flight.reported || waited < self.config.ack_timeout {
            return;
        }

        in_flight.reported = true;
        tracing::warn!(
            "No acknowledgment for '{}' after {}ms",
            in_flight.command,
            waited.as_millis()
        );
        self.events.publish(PrinterEvent::Unacknowledged {
            command: in_flight.command.clone(),
            waited_ms: waited.as_millis() as u64,
        });
    }

    /// Snapshot of the current state at `now`
    pub fn snapshot(&self, now: DateTime<Utc>) -> StatusSnapshot {
        status::snapshot(
            self.session.status(),
            self.temperature,
            self.session.start_time(),
            self.session.total_lines(),
            self.queue.print_lane_len(),
            now,
        )
    }

    /// Push a snapshot to the status callback and the event stream
    pub fn push_status(&self, now: DateTime<Utc>) {
        let snapshot = self.snapshot(now);
        if let Some(callback) = &self.status_callback {
            callback(snapshot.clone());
        }
        self.events.publish(PrinterEvent::Status(snapshot));
    }

    fn sent_or_idle(&mut self, command: &str) -> DrainOutcome {
        if self.write(command) {
            DrainOutcome::Sent
        } else {
            DrainOutcome::Idle
        }
    }

    fn write(&mut self, command: &str) -> bool {
        let Some(link) = self.link.as_mut() else {
            return false;
        };

        let command = command.trim();
        tracing::debug!("SENT: {}", command);
        match link.write_line(command) {
            Ok(()) => {
                self.in_flight = Some(InFlight {
                    command: command.to_string(),
                    sent_at: Instant::now(),
                    reported: false,
                });
                self.events
                    .publish(PrinterEvent::LineSent(command.to_string()));
                true
            }
            Err(e) => {
                self.link_failure(e);
                false
            }
        }
    }

    fn finish_print(&mut self) {
        if let Some(total_lines) = self.session.finish() {
            tracing::info!("Print finished ({} lines sent)", total_lines);
            self.events
                .publish(PrinterEvent::StatusChanged(PrintStatus::Finished));
            self.publish_status(PrintStatus::Ready);
            self.events
                .publish(PrinterEvent::PrintFinished { total_lines });
        }
    }

    fn link_failure(&mut self, error: Error) {
        tracing::error!("Serial link failed: {}", error);
        self.events.publish(PrinterEvent::Error(error.to_string()));
        if let Some(link) = self.link.take() {
            if let Err(e) = link.close() {
                tracing::debug!("Closing failed link: {}", e);
            }
        }
        self.clear_pending();
        self.in_flight = None;
        let previous = self.session.status();
        self.session.disconnected();
        if previous != PrintStatus::Disconnected {
            self.publish_status(PrintStatus::Disconnected);
            self.events.publish(PrinterEvent::Disconnected);
        }
    }

    fn clear_pending(&mut self) {
        self.queue.clear();
        self.recheck_at = None;
    }

    /// Run a session transition and publish the status change, if any
    fn transition<T>(&mut self, f: impl FnOnce(&mut PrintSession) -> Result<T>) -> Result<T> {
        let previous = self.session.status();
        let value = f(&mut self.session)?;
        let current = self.session.status();
        if current != previous {
            self.publish_status(current);
        }
        Ok(value)
    }

    fn publish_status(&self, status: PrintStatus) {
        *self.shared_status.write() = status;
        self.events.publish(PrinterEvent::StatusChanged(status));
    }
}
