//! Printer controller
//!
//! Async facade over [`PrintEngine`]. A single tokio task owns the engine,
//! the link and every timer; the public handle only sends requests over a
//! channel and awaits the reply, so queue mutation and line framing never
//! happen concurrently.

use super::commands::REPORT_TEMPERATURE;
use super::connection::{ConnectionManager, DEFAULT_DEVICE_MARKER};
use super::engine::{EngineConfig, PrintEngine};
use crate::communication::serial::{SerialBackend, SystemSerialBackend};
use crate::communication::ConnectionParams;
use chrono::Utc;
use parking_lot::{Mutex, RwLock};
use printhost_core::{
    ControllerError, Error, EventDispatcher, InstructionSource, PrintStatus, PrinterEvent,
    Result, SerialListener, StatusCallback, StatusSnapshot,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{Interval, MissedTickBehavior};

/// Default interval between status queries
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(5000);

/// Controller configuration
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// Port, baud rate and read timeout
    pub connection: ConnectionParams,
    /// Vendor string used to auto-detect the printer
    pub device_marker: String,
    /// Flow-control timing
    pub engine: EngineConfig,
    /// How often the link is read
    pub read_interval: Duration,
    /// Event channel capacity
    pub event_capacity: usize,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            connection: ConnectionParams::default(),
            device_marker: DEFAULT_DEVICE_MARKER.to_string(),
            engine: EngineConfig::default(),
            read_interval: Duration::from_millis(10),
            event_capacity: 100,
        }
    }
}

type Reply<T> = oneshot::Sender<Result<T>>;

enum Request {
    Connect(Reply<String>),
    Disconnect(Reply<()>),
    Pause(Reply<()>),
    Resume(Reply<()>),
    Stop(Reply<()>),
    Print(InstructionSource, Reply<()>),
    SendCommand(String, Reply<bool>),
    SendCommands(String, Reply<usize>),
    SetStatusPoller(StatusCallback, Duration, Reply<()>),
    ClearStatusPoller(Reply<()>),
    SetSerialListener(Option<SerialListener>, Reply<()>),
    Snapshot(Reply<StatusSnapshot>),
    Shutdown(Reply<()>),
}

/// Handle to the controller task
pub struct PrinterController {
    requests: mpsc::Sender<Request>,
    events: EventDispatcher,
    status: Arc<RwLock<PrintStatus>>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl PrinterController {
    /// Spawn the controller task on the current runtime
    pub fn spawn(config: ControllerConfig, backend: Arc<dyn SerialBackend>) -> Self {
        let events = EventDispatcher::new(config.event_capacity);
        let engine = PrintEngine::new(config.engine, events.clone());
        let status = engine.shared_status();
        let manager = ConnectionManager::new(
            backend,
            config.connection.clone(),
            config.device_marker.clone(),
        );
        let (requests, rx) = mpsc::channel(100);

        let worker = Worker {
            engine,
            manager,
            requests: rx,
            poller: None,
            read_interval: config.read_interval,
        };
        let task = tokio::spawn(worker.run());

        Self {
            requests,
            events,
            status,
            task: Mutex::new(Some(task)),
        }
    }

    /// Spawn a controller over the operating system's serial ports
    pub fn with_system_ports(config: ControllerConfig) -> Self {
        Self::spawn(config, Arc::new(SystemSerialBackend))
    }

    /// Open the link; returns the port that was opened
    pub async fn connect(&self) -> Result<String> {
        self.request(Request::Connect).await
    }

    /// Open the link and run `on_ready` with the port once the printer is READY
    pub async fn connect_then<F>(&self, on_ready: F) -> Result<String>
    where
        F: FnOnce(&str) + Send,
    {
        let port = self.connect().await?;
        on_ready(&port);
        Ok(port)
    }

    /// Close the link and drop all pending work
    pub async fn disconnect(&self) -> Result<()> {
        self.request(Request::Disconnect).await
    }

    /// Hold the print lane
    pub async fn pause(&self) -> Result<()> {
        self.request(Request::Pause).await
    }

    /// Continue a held print
    pub async fn resume(&self) -> Result<()> {
        self.request(Request::Resume).await
    }

    /// Abort the print, cancel status polling and park the machine
    pub async fn stop(&self) -> Result<()> {
        self.request(Request::Stop).await
    }

    /// Start printing an instruction file
    pub async fn print(&self, source: impl Into<InstructionSource>) -> Result<()> {
        let source = source.into();
        self.request(|reply| Request::Print(source, reply)).await
    }

    /// Submit a manual command; `false` if it was dropped
    pub async fn send_command(&self, command: impl Into<String>) -> Result<bool> {
        let command = command.into();
        self.request(|reply| Request::SendCommand(command, reply))
            .await
    }

    /// Submit a `;`-separated script of manual commands
    pub async fn send_commands(&self, script: impl Into<String>) -> Result<usize> {
        let script = script.into();
        self.request(|reply| Request::SendCommands(script, reply))
            .await
    }

    /// Push snapshots to `callback` and query the temperature every `interval`.
    ///
    /// Replaces any previous poller.
    pub async fn set_status_poller(
        &self,
        callback: StatusCallback,
        interval: Option<Duration>,
    ) -> Result<()> {
        let interval = interval.unwrap_or(DEFAULT_POLL_INTERVAL);
        self.request(|reply| Request::SetStatusPoller(callback, interval, reply))
            .await
    }

    /// Remove the status poller and its callback
    pub async fn clear_status_poller(&self) -> Result<()> {
        self.request(Request::ClearStatusPoller).await
    }

    /// Receive every raw line read from the printer; `None` removes the listener
    pub async fn set_serial_listener(&self, listener: Option<SerialListener>) -> Result<()> {
        self.request(|reply| Request::SetSerialListener(listener, reply))
            .await
    }

    /// Current status snapshot
    pub async fn snapshot(&self) -> Result<StatusSnapshot> {
        self.request(Request::Snapshot).await
    }

    /// Current print status
    pub fn status(&self) -> PrintStatus {
        *self.status.read()
    }

    /// Whether a print is running or held
    pub fn is_printing(&self) -> bool {
        self.status().is_active()
    }

    /// Subscribe to controller events
    pub fn subscribe(&self) -> broadcast::Receiver<PrinterEvent> {
        self.events.subscribe()
    }

    /// Close the link and stop the controller task
    pub async fn shutdown(&self) -> Result<()> {
        let result = self.request(Request::Shutdown).await;
        let task = self.task.lock().take();
        if let Some(task) = task {
            if let Err(e) = task.await {
                tracing::warn!("Controller task ended abnormally: {}", e);
            }
        }
        result
    }

    async fn request<T>(&self, make: impl FnOnce(Reply<T>) -> Request) -> Result<T> {
        let (tx, rx) = oneshot::channel();
        self.requests
            .send(make(tx))
            .await
            .map_err(|_| Error::Controller(ControllerError::ControllerStopped))?;
        rx.await
            .map_err(|_| Error::Controller(ControllerError::ControllerStopped))?
    }
}

impl Drop for PrinterController {
    fn drop(&mut self) {
        if let Some(task) = self.task.lock().take() {
            task.abort();
        }
    }
}

struct Worker {
    engine: PrintEngine,
    manager: ConnectionManager,
    requests: mpsc::Receiver<Request>,
    poller: Option<Interval>,
    read_interval: Duration,
}

impl Worker {
    async fn run(mut self) {
        let mut read_tick = tokio::time::interval(self.read_interval);
        read_tick.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            let recheck_at = self.engine.next_recheck();
            tokio::select! {
                request = self.requests.recv() => {
                    match request {
                        Some(request) => {
                            if !self.handle(request) {
                                break;
                            }
                        }
                        None => break,
                    }
                }
                _ = read_tick.tick() => {
                    self.engine.poll_link();
                    self.engine.check_ack_timeout(std::time::Instant::now());
                }
                _ = poll_tick(&mut self.poller) => {
                    tracing::trace!("Status poll");
                    if let Err(e) = self.engine.send_command(REPORT_TEMPERATURE) {
                        tracing::warn!("Status poll failed: {}", e);
                    }
                }
                _ = sleep_until(recheck_at) => {
                    self.engine.recheck(std::time::Instant::now());
                }
            }
        }

        if let Err(e) = self.engine.detach() {
            tracing::warn!("Error closing link on shutdown: {}", e);
        }
        tracing::debug!("Controller task stopped");
    }

    /// Serve one request; `false` ends the task
    fn handle(&mut self, request: Request) -> bool {
        match request {
            Request::Connect(reply) => {
                let result = self.connect();
                if let Err(e) = &result {
                    self.engine.events().publish(PrinterEvent::Error(e.to_string()));
                }
                let _ = reply.send(result);
            }
            Request::Disconnect(reply) => {
                let _ = reply.send(self.engine.detach());
            }
            Request::Pause(reply) => {
                let _ = reply.send(self.engine.pause());
            }
            Request::Resume(reply) => {
                let _ = reply.send(self.engine.resume());
            }
            Request::Stop(reply) => {
                let result = self.engine.stop();
                if result.is_ok() {
                    self.poller = None;
                }
                let _ = reply.send(result);
            }
            Request::Print(source, reply) => {
                let _ = reply.send(self.print(source));
            }
            Request::SendCommand(command, reply) => {
                let _ = reply.send(self.engine.send_command(&command));
            }
            Request::SendCommands(script, reply) => {
                let _ = reply.send(self.engine.send_commands(&script));
            }
            Request::SetStatusPoller(callback, interval, reply) => {
                tracing::debug!("Status poller active every {}ms", interval.as_millis());
                self.engine.set_status_callback(Some(callback));
                self.poller = Some(poll_interval(interval));
                let _ = reply.send(Ok(()));
            }
            Request::ClearStatusPoller(reply) => {
                self.engine.set_status_callback(None);
                self.poller = None;
                let _ = reply.send(Ok(()));
            }
            Request::SetSerialListener(listener, reply) => {
                self.engine.set_serial_listener(listener);
                let _ = reply.send(Ok(()));
            }
            Request::Snapshot(reply) => {
                let _ = reply.send(Ok(self.engine.snapshot(Utc::now())));
            }
            Request::Shutdown(reply) => {
                self.poller = None;
                let _ = reply.send(self.engine.detach());
                return false;
            }
        }
        true
    }

    fn connect(&mut self) -> Result<String> {
        self.engine.ensure_can_connect()?;
        let connection = self.manager.open()?;
        let port = connection.port().to_string();
        self.engine.attach(connection)?;
        Ok(port)
    }

    fn print(&mut self, source: InstructionSource) -> Result<()> {
        self.engine.ensure_can_print()?;
        tracing::info!("Loading print file {}", source);
        let commands = source.parse()?;
        self.engine.start_print(commands, &source.to_string())
    }
}

/// Interval whose first tick is one period away
fn poll_interval(period: Duration) -> Interval {
    let period = period.max(Duration::from_millis(1));
    let mut interval = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    interval
}

async fn poll_tick(poller: &mut Option<Interval>) {
    match poller {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending::<()>().await,
    }
}

async fn sleep_until(deadline: Option<std::time::Instant>) {
    match deadline {
        Some(at) => tokio::time::sleep_until(tokio::time::Instant::from_std(at)).await,
        None => std::future::pending::<()>().await,
    }
}
