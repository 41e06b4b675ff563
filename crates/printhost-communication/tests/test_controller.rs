use printhost_communication::{
    Communicator, ConnectionParams, ControllerConfig, PrinterController, SerialBackend,
    SerialPortInfo,
};
use printhost_core::{
    ConnectionError, ControllerError, Error, GcodeError, PrintStatus, PrinterEvent,
    StatusSnapshot,
};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

// In-memory printer shared between the test and the mock link
#[derive(Clone, Default)]
struct MockPrinter {
    sent: Arc<Mutex<Vec<String>>>,
    inbound: Arc<Mutex<VecDeque<Vec<u8>>>>,
    auto_ack: bool,
}

impl MockPrinter {
    fn auto_ack() -> Self {
        Self {
            auto_ack: true,
            ..Self::default()
        }
    }

    fn reply(&self, line: &str) {
        self.inbound
            .lock()
            .unwrap()
            .push_back(format!("{}\n", line).into_bytes());
    }

    fn sent(&self) -> Vec<String> {
        self.sent.lock().unwrap().clone()
    }
}

struct MockCommunicator {
    printer: MockPrinter,
    port: String,
}

impl Communicator for MockCommunicator {
    fn send(&mut self, data: &[u8]) -> printhost_core::Result<usize> {
        let line = String::from_utf8_lossy(data).trim_end().to_string();
        if self.printer.auto_ack {
            if line == "M105" {
                self.printer.reply("ok T:200.0 /200.0 B:60.0 /60.0");
            } else {
                self.printer.reply("ok");
            }
        }
        self.printer.sent.lock().unwrap().push(line);
        Ok(data.len())
    }

    fn receive(&mut self) -> printhost_core::Result<Vec<u8>> {
        Ok(self
            .printer
            .inbound
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_default())
    }

    fn is_connected(&self) -> bool {
        true
    }

    fn disconnect(&mut self) -> printhost_core::Result<()> {
        Ok(())
    }

    fn port_name(&self) -> &str {
        &self.port
    }
}

struct MockBackend {
    ports: Vec<SerialPortInfo>,
    printer: MockPrinter,
}

impl SerialBackend for MockBackend {
    fn available_ports(&self) -> printhost_core::Result<Vec<SerialPortInfo>> {
        Ok(self.ports.clone())
    }

    fn open(&self, params: &ConnectionParams) -> printhost_core::Result<Box<dyn Communicator>> {
        Ok(Box::new(MockCommunicator {
            printer: self.printer.clone(),
            port: params.port.clone(),
        }))
    }
}

fn arduino_ports() -> Vec<SerialPortInfo> {
    vec![
        SerialPortInfo::new("/dev/ttyS0", "Serial Port"),
        SerialPortInfo::new("/dev/ttyACM0", "USB Arduino Mega 2560")
            .with_manufacturer("Arduino (www.arduino.cc)"),
    ]
}

fn controller(ports: Vec<SerialPortInfo>, printer: MockPrinter) -> PrinterController {
    let config = ControllerConfig {
        connection: ConnectionParams::new("auto", 115_200),
        read_interval: Duration::from_millis(1),
        ..ControllerConfig::default()
    };
    PrinterController::spawn(config, Arc::new(MockBackend { ports, printer }))
}

async fn wait_until(mut condition: impl FnMut() -> bool) {
    tokio::time::timeout(Duration::from_secs(2), async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
    })
    .await
    .expect("condition not reached in time");
}

fn frame(numbered: &str) -> String {
    format!("{}*{}", numbered, printhost_communication::checksum(numbered))
}

#[tokio::test]
async fn test_auto_without_matching_device() {
    let ports = vec![SerialPortInfo::new("/dev/ttyS0", "Serial Port")];
    let controller = controller(ports, MockPrinter::default());

    match controller.connect().await {
        Err(Error::Connection(ConnectionError::NoDeviceFound { available_ports })) => {
            assert_eq!(available_ports, vec!["/dev/ttyS0".to_string()]);
        }
        other => panic!("expected NoDeviceFound, got {:?}", other),
    }
    assert_eq!(controller.status(), PrintStatus::Disconnected);
}

#[tokio::test]
async fn test_connect_then_runs_on_ready() {
    let controller = controller(arduino_ports(), MockPrinter::default());
    let ready_port = Arc::new(Mutex::new(None));
    let seen = ready_port.clone();

    let port = controller
        .connect_then(move |port| *seen.lock().unwrap() = Some(port.to_string()))
        .await
        .unwrap();

    assert_eq!(port, "/dev/ttyACM0");
    assert_eq!(ready_port.lock().unwrap().as_deref(), Some("/dev/ttyACM0"));
    assert_eq!(controller.status(), PrintStatus::Ready);

    let err = controller.connect().await.unwrap_err();
    assert!(err.is_invalid_transition());
}

#[tokio::test]
async fn test_two_line_print_advances_on_ok() {
    let printer = MockPrinter::default();
    let controller = controller(arduino_ports(), printer.clone());
    controller.connect().await.unwrap();

    controller
        .print("G1 X10\n; comment\nG1 Y10 ;inline\n\n".to_string())
        .await
        .unwrap();
    assert!(controller.is_printing());
    assert_eq!(printer.sent(), vec!["M105"]);

    printer.reply("ok");
    wait_until(|| printer.sent().len() == 2).await;
    assert_eq!(printer.sent()[1], frame("N1 G1 X10"));

    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(printer.sent().len(), 2);

    printer.reply("ok");
    wait_until(|| printer.sent().len() == 3).await;
    assert_eq!(printer.sent()[2], frame("N2 G1 Y10"));
    assert_eq!(controller.status(), PrintStatus::Ready);
}

#[tokio::test]
async fn test_print_runs_to_completion() {
    let printer = MockPrinter::auto_ack();
    let controller = controller(arduino_ports(), printer.clone());
    let mut events = controller.subscribe();
    controller.connect().await.unwrap();

    let program: String = (1..=20).map(|i| format!("G1 X{}\n", i)).collect();
    controller.print(program).await.unwrap();

    let finished = tokio::time::timeout(Duration::from_secs(2), async {
        loop {
            if let Ok(PrinterEvent::PrintFinished { total_lines }) = events.recv().await {
                return total_lines;
            }
        }
    })
    .await
    .unwrap();

    assert_eq!(finished, 20);
    let frames: Vec<String> = printer
        .sent()
        .into_iter()
        .filter(|line| line.starts_with('N'))
        .collect();
    assert_eq!(frames.len(), 20);
    assert_eq!(frames[19], frame("N20 G1 X20"));
}

#[tokio::test]
async fn test_stop_parks_machine() {
    let printer = MockPrinter::default();
    let controller = controller(arduino_ports(), printer.clone());
    controller.connect().await.unwrap();
    controller
        .print("G1 X1\nG1 X2\nG1 X3\n".to_string())
        .await
        .unwrap();
    printer.reply("ok");
    wait_until(|| printer.sent().len() == 2).await;

    controller.stop().await.unwrap();
    assert_eq!(controller.status(), PrintStatus::Ready);

    for _ in 0..5 {
        let before = printer.sent().len();
        printer.reply("ok");
        wait_until(|| printer.sent().len() == before + 1).await;
    }

    assert_eq!(
        &printer.sent()[2..],
        &["M104 S0", "G91", "G1 Z5 F300", "G90", "G28 X0 Y0"]
    );
    assert!(controller.stop().await.unwrap_err().is_invalid_transition());

    let parked = printer.sent();
    for _ in 0..10 {
        printer.reply("ok");
    }
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(printer.sent(), parked);
    assert_eq!(controller.status(), PrintStatus::Ready);
}

#[tokio::test]
async fn test_pause_then_resume() {
    let printer = MockPrinter::default();
    let controller = controller(arduino_ports(), printer.clone());
    controller.connect().await.unwrap();
    controller
        .print("G1 X1\nG1 X2\n".to_string())
        .await
        .unwrap();
    printer.reply("ok");
    wait_until(|| printer.sent().len() == 2).await;

    controller.pause().await.unwrap();
    assert_eq!(controller.status(), PrintStatus::Paused);
    printer.reply("ok");
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(printer.sent().len(), 2);

    assert!(controller.send_command("M114").await.unwrap());
    wait_until(|| printer.sent().len() == 3).await;
    assert_eq!(printer.sent()[2], "M114");

    printer.reply("ok");
    controller.resume().await.unwrap();
    wait_until(|| printer.sent().len() == 4).await;
    assert_eq!(printer.sent()[3], frame("N2 G1 X2"));
}

#[tokio::test]
async fn test_status_poller_reports_temperature() {
    let printer = MockPrinter::auto_ack();
    let controller = controller(arduino_ports(), printer.clone());
    controller.connect().await.unwrap();

    let snapshots: Arc<Mutex<Vec<StatusSnapshot>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = snapshots.clone();
    controller
        .set_status_poller(
            Arc::new(move |snap: StatusSnapshot| sink.lock().unwrap().push(snap)),
            Some(Duration::from_millis(10)),
        )
        .await
        .unwrap();

    wait_until(|| !snapshots.lock().unwrap().is_empty()).await;
    let first = snapshots.lock().unwrap()[0].clone();
    assert_eq!(first.temperature, Some(200.0));
    assert_eq!(first.print_status, PrintStatus::Ready);
    assert!(first.progress.is_none());

    controller.clear_status_poller().await.unwrap();
    let snap = controller.snapshot().await.unwrap();
    assert_eq!(snap.temperature, Some(200.0));
}

#[tokio::test]
async fn test_serial_listener_receives_lines() {
    let printer = MockPrinter::default();
    let controller = controller(arduino_ports(), printer.clone());
    controller.connect().await.unwrap();

    let lines = Arc::new(Mutex::new(Vec::new()));
    let sink = lines.clone();
    controller
        .set_serial_listener(Some(Arc::new(move |line: String| {
            sink.lock().unwrap().push(line)
        })))
        .await
        .unwrap();

    printer.reply("echo:Marlin 1.1.9");
    wait_until(|| lines.lock().unwrap().len() == 1).await;
    assert_eq!(lines.lock().unwrap()[0], "echo:Marlin 1.1.9");
}

#[tokio::test]
async fn test_rejected_prints() {
    let controller = controller(arduino_ports(), MockPrinter::default());
    let err = controller.print("G28\n".to_string()).await.unwrap_err();
    assert!(err.is_invalid_transition());

    controller.connect().await.unwrap();
    let err = controller
        .print("; only comments\n\n".to_string())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        Error::Gcode(GcodeError::InvalidPrintFile { .. })
    ));
    assert_eq!(controller.status(), PrintStatus::Ready);
}

#[tokio::test]
async fn test_commands_dropped_while_disconnected() {
    let printer = MockPrinter::default();
    let controller = controller(arduino_ports(), printer.clone());
    assert!(!controller.send_command("G28").await.unwrap());

    controller.connect().await.unwrap();
    controller.disconnect().await.unwrap();
    assert_eq!(controller.status(), PrintStatus::Disconnected);
    assert!(!controller.send_command("G28").await.unwrap());
    assert!(printer.sent().is_empty());
}

#[tokio::test]
async fn test_calls_after_shutdown() {
    let controller = controller(arduino_ports(), MockPrinter::default());
    controller.connect().await.unwrap();
    controller.shutdown().await.unwrap();

    match controller.pause().await {
        Err(Error::Controller(ControllerError::ControllerStopped)) => {}
        other => panic!("expected ControllerStopped, got {:?}", other),
    }
}
