//! printhost command-line host
//!
//! Connects to the printer, optionally streams a G-code file, and prints
//! status snapshots as JSON lines until interrupted.

use anyhow::{Context, Result};
use clap::Parser;
use printhost::{
    controller_config, default_config_path, forward_events, init_logging, poll_interval,
    InstructionSource, LogListener, PrinterController, PrinterEvent, StatusSnapshot,
};
use printhost_settings::Config;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "printhost")]
#[command(version = printhost::VERSION)]
#[command(about = "Serial print host for RepRap-style 3D printers", long_about = None)]
struct Cli {
    /// Configuration file (.toml or .json); defaults to the user config directory
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Serial port, or "auto" to detect the printer
    #[arg(short, long)]
    port: Option<String>,

    /// Baud rate
    #[arg(short, long)]
    baud: Option<u32>,

    /// Log filter directive (e.g. "debug" or "printhost_communication=trace")
    #[arg(long)]
    log_level: Option<String>,

    /// Manual commands to send once connected, `;`-separated
    #[arg(long = "send")]
    send: Vec<String>,

    /// Echo every line received from the printer
    #[arg(long)]
    echo: bool,

    /// Exit once the print has been fully sent
    #[arg(long)]
    exit_when_done: bool,

    /// G-code file to print
    file: Option<PathBuf>,
}

impl Cli {
    fn load_config(&self) -> Result<Config> {
        let path = match &self.config {
            Some(path) => path.clone(),
            None => default_config_path()?,
        };

        let mut config = if self.config.is_some() {
            Config::load_from_file(&path)
                .with_context(|| format!("loading {}", path.display()))?
        } else {
            Config::load_or_default(&path)?
        };

        if let Some(port) = &self.port {
            config.connection.port = port.clone();
        }
        if let Some(baud) = self.baud {
            config.connection.baud_rate = baud;
        }
        if let Some(level) = &self.log_level {
            config.logging.level = level.clone();
        }
        config.validate()?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = cli.load_config()?;
    init_logging(&config.logging)?;

    tracing::info!("printhost {} (built {})", printhost::VERSION, printhost::BUILD_DATE);

    let controller = PrinterController::with_system_ports(controller_config(&config));
    let mut events = controller.subscribe();
    let _listener = forward_events(controller.subscribe(), Arc::new(LogListener));

    if cli.echo {
        controller
            .set_serial_listener(Some(Arc::new(|line: String| println!("< {}", line))))
            .await?;
    }

    controller
        .set_status_poller(
            Arc::new(|snapshot: StatusSnapshot| match serde_json::to_string(&snapshot) {
                Ok(json) => println!("{}", json),
                Err(e) => tracing::warn!("Cannot encode status: {}", e),
            }),
            Some(poll_interval(&config)),
        )
        .await?;

    controller
        .connect_then(|port| tracing::info!("Printer ready on {}", port))
        .await?;

    for script in &cli.send {
        controller.send_commands(script.as_str()).await?;
    }

    let printing = match &cli.file {
        Some(file) => {
            controller
                .print(InstructionSource::Path(file.clone()))
                .await?;
            true
        }
        None => false,
    };

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Interrupted");
                break;
            }
            event = events.recv() => match event {
                Ok(PrinterEvent::PrintFinished { .. }) if printing && cli.exit_when_done => break,
                Ok(PrinterEvent::Disconnected) => {
                    tracing::error!("Printer disconnected");
                    break;
                }
                Ok(_) | Err(tokio::sync::broadcast::error::RecvError::Lagged(_)) => {}
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            }
        }
    }

    controller.shutdown().await?;
    Ok(())
}
