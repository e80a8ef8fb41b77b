//! Serial port transport
//!
//! Provides the hardware link to the rig controller over a UART or USB
//! serial adapter.
//!
//! Supports:
//! - Port enumeration and discovery
//! - Baud rate, data bits, parity, stop bits, and flow control
//! - A background reader thread that delivers chunks as they arrive
//! - Unqueued writes on the caller's thread

use super::{ReadableSink, Teardown, Transport};
use rigkit_core::{ConnectionConfig, ConnectionError, Error, FlowControl, Parity, Result};
use serde::{Deserialize, Serialize};
use std::io::{ErrorKind, Read, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Read timeout of the reader thread; bounds how long `close` waits for it
const READ_TIMEOUT: Duration = Duration::from_millis(50);

/// Size of the reader thread's scratch buffer
const READ_CHUNK_SIZE: usize = 1024;

/// Fault reported when the device goes away
const DISCONNECTED: &str = "UART error: device disconnected";

/// Information about an available serial port
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SerialPortInfo {
    /// Port name (e.g., "/dev/ttyAMA3", "COM3")
    pub port_name: String,

    /// Port description (e.g., "USB Serial Port")
    pub description: String,

    /// Manufacturer name if available
    pub manufacturer: Option<String>,

    /// Serial number if available
    pub serial_number: Option<String>,

    /// USB vendor ID if applicable
    pub vid: Option<u16>,

    /// USB product ID if applicable
    pub pid: Option<u16>,
}

impl SerialPortInfo {
    /// Create a new port info
    pub fn new(port_name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            port_name: port_name.into(),
            description: description.into(),
            manufacturer: None,
            serial_number: None,
            vid: None,
            pid: None,
        }
    }

    /// Set manufacturer
    pub fn with_manufacturer(mut self, manufacturer: impl Into<String>) -> Self {
        self.manufacturer = Some(manufacturer.into());
        self
    }

    /// Set serial number
    pub fn with_serial_number(mut self, serial_number: impl Into<String>) -> Self {
        self.serial_number = Some(serial_number.into());
        self
    }

    /// Set USB IDs
    pub fn with_usb_ids(mut self, vid: u16, pid: u16) -> Self {
        self.vid = Some(vid);
        self.pid = Some(pid);
        self
    }
}

/// List serial ports a rig controller could be attached to
///
/// Filters the system's ports to:
/// - Windows: COM*
/// - Linux: /dev/ttyAMA*, /dev/serial*, /dev/ttyUSB*, /dev/ttyACM*
/// - macOS: /dev/cu.usbserial-*, /dev/cu.usbmodem*
pub fn list_ports() -> Result<Vec<SerialPortInfo>> {
    let ports = serialport::available_ports().map_err(|e| {
        tracing::error!("Failed to enumerate serial ports: {}", e);
        Error::other(format!("Failed to enumerate ports: {}", e))
    })?;

    Ok(ports
        .iter()
        .filter(|port| is_candidate_port(&port.port_name))
        .map(|port| {
            let info = SerialPortInfo::new(&port.port_name, port_description(port));

            match &port.port_type {
                serialport::SerialPortType::UsbPort(usb_info) => {
                    let mut info = info.with_usb_ids(usb_info.vid, usb_info.pid);
                    if let Some(ref mfg) = usb_info.manufacturer {
                        info = info.with_manufacturer(mfg);
                    }
                    if let Some(ref serial) = usb_info.serial_number {
                        info = info.with_serial_number(serial);
                    }
                    info
                }
                _ => info,
            }
        })
        .collect())
}

/// Check if a port name matches a UART or USB serial device
fn is_candidate_port(port_name: &str) -> bool {
    if let Some(number) = port_name.strip_prefix("COM") {
        return !number.is_empty() && number.chars().all(|c| c.is_ascii_digit());
    }

    const PREFIXES: [&str; 6] = [
        "/dev/ttyAMA",
        "/dev/serial",
        "/dev/ttyUSB",
        "/dev/ttyACM",
        "/dev/cu.usbserial-",
        "/dev/cu.usbmodem",
    ];
    PREFIXES.iter().any(|prefix| port_name.starts_with(prefix))
}

/// Get a user-friendly description for a port
fn port_description(port: &serialport::SerialPortInfo) -> String {
    match &port.port_type {
        serialport::SerialPortType::UsbPort(usb_info) => {
            format!(
                "USB {} {}",
                usb_info.manufacturer.as_deref().unwrap_or("Device"),
                usb_info.product.as_deref().unwrap_or("Serial Port")
            )
        }
        serialport::SerialPortType::BluetoothPort => "Bluetooth Serial".to_string(),
        serialport::SerialPortType::PciPort => "PCI Serial".to_string(),
        _ => "Serial Port".to_string(),
    }
}

fn to_serialport_data_bits(bits: u8) -> std::result::Result<serialport::DataBits, ConnectionError> {
    match bits {
        5 => Ok(serialport::DataBits::Five),
        6 => Ok(serialport::DataBits::Six),
        7 => Ok(serialport::DataBits::Seven),
        8 => Ok(serialport::DataBits::Eight),
        _ => Err(ConnectionError::InvalidParameters {
            reason: format!("invalid data bits: {}", bits),
        }),
    }
}

fn to_serialport_stop_bits(bits: u8) -> std::result::Result<serialport::StopBits, ConnectionError> {
    match bits {
        1 => Ok(serialport::StopBits::One),
        2 => Ok(serialport::StopBits::Two),
        _ => Err(ConnectionError::InvalidParameters {
            reason: format!("invalid stop bits: {}", bits),
        }),
    }
}

fn to_serialport_parity(parity: Parity) -> serialport::Parity {
    match parity {
        Parity::None => serialport::Parity::None,
        Parity::Even => serialport::Parity::Even,
        Parity::Odd => serialport::Parity::Odd,
    }
}

fn to_serialport_flow_control(flow: FlowControl) -> serialport::FlowControl {
    match flow {
        FlowControl::None => serialport::FlowControl::None,
        FlowControl::Hardware => serialport::FlowControl::Hardware,
        FlowControl::Software => serialport::FlowControl::Software,
    }
}

/// Background thread draining the port into a [`ReadableSink`]
struct ReaderThread {
    stop: Arc<AtomicBool>,
    handle: JoinHandle<()>,
}

impl ReaderThread {
    fn spawn(
        mut port: Box<dyn serialport::SerialPort>,
        port_name: String,
        sink: Arc<dyn ReadableSink>,
    ) -> std::io::Result<Self> {
        let stop = Arc::new(AtomicBool::new(false));
        let stop_flag = stop.clone();

        let handle = thread::Builder::new()
            .name("rigkit-serial-rx".to_string())
            .spawn(move || {
                let mut buf = [0u8; READ_CHUNK_SIZE];
                while !stop_flag.load(Ordering::SeqCst) {
                    match port.read(&mut buf) {
                        Ok(0) => {
                            if !stop_flag.load(Ordering::SeqCst) {
                                tracing::warn!("Serial port {} reached end of stream", port_name);
                                sink.on_fault(DISCONNECTED);
                            }
                            break;
                        }
                        Ok(n) => sink.on_readable(&buf[..n]),
                        Err(ref e)
                            if matches!(e.kind(), ErrorKind::TimedOut | ErrorKind::Interrupted) => {}
                        Err(ref e)
                            if matches!(e.kind(), ErrorKind::BrokenPipe | ErrorKind::UnexpectedEof) =>
                        {
                            if !stop_flag.load(Ordering::SeqCst) {
                                tracing::warn!("Serial port {} hung up: {}", port_name, e);
                                sink.on_fault(DISCONNECTED);
                            }
                            break;
                        }
                        Err(e) => {
                            if !stop_flag.load(Ordering::SeqCst) {
                                tracing::warn!("Read error on {}: {}", port_name, e);
                                sink.on_fault(&format!("UART error: {}", e));
                            }
                            break;
                        }
                    }
                }
                tracing::debug!("Reader thread for {} exiting", port_name);
            })?;

        Ok(Self { stop, handle })
    }

    /// Ask the thread to exit after its current read
    fn signal_stop(&self) {
        self.stop.store(true, Ordering::SeqCst);
    }

    /// Wait for the thread to exit
    fn join(self) {
        // A sink handler may close the link from the reader thread itself.
        if self.handle.thread().id() == thread::current().id() {
            return;
        }
        if self.handle.join().is_err() {
            tracing::error!("Serial reader thread panicked");
        }
    }
}

/// Serial transport backed by the `serialport` crate
#[derive(Default)]
pub struct SerialTransport {
    port: Option<Box<dyn serialport::SerialPort>>,
    reader: Option<ReaderThread>,
}

impl SerialTransport {
    /// Create a closed transport
    pub fn new() -> Self {
        Self::default()
    }
}

impl Transport for SerialTransport {
    fn open(
        &mut self,
        config: &ConnectionConfig,
        sink: Arc<dyn ReadableSink>,
    ) -> std::result::Result<(), ConnectionError> {
        if self.port.is_some() {
            return Ok(());
        }

        let builder = serialport::new(&config.port_name, config.baud_rate)
            .timeout(READ_TIMEOUT)
            .data_bits(to_serialport_data_bits(config.data_bits)?)
            .stop_bits(to_serialport_stop_bits(config.stop_bits)?)
            .parity(to_serialport_parity(config.parity))
            .flow_control(to_serialport_flow_control(config.flow_control));

        let failed = |reason: String| {
            tracing::warn!("Failed to open serial port {}: {}", config.port_name, reason);
            ConnectionError::FailedToOpen {
                port: config.port_name.clone(),
                reason,
            }
        };

        let port = builder.open().map_err(|e| failed(e.to_string()))?;
        let reader_port = port.try_clone().map_err(|e| failed(e.to_string()))?;
        let reader = ReaderThread::spawn(reader_port, config.port_name.clone(), sink)
            .map_err(|e| failed(e.to_string()))?;

        tracing::info!("Serial port opened: {}", config);
        self.port = Some(port);
        self.reader = Some(reader);
        Ok(())
    }

    fn detach(&mut self) -> Teardown {
        if self.port.take().is_some() {
            tracing::info!("Serial port closed");
        }
        match self.reader.take() {
            Some(reader) => {
                reader.signal_stop();
                Teardown::new(move || reader.join())
            }
            None => Teardown::none(),
        }
    }

    fn is_open(&self) -> bool {
        self.port.is_some()
    }

    fn write(&mut self, data: &[u8]) -> std::result::Result<usize, ConnectionError> {
        let port = self.port.as_mut().ok_or(ConnectionError::NotConnected)?;
        let written = port.write(data).map_err(|e| ConnectionError::WriteFailed {
            reason: e.to_string(),
        })?;
        if written < data.len() {
            tracing::warn!("Short write: {} of {} bytes", written, data.len());
        }
        Ok(written)
    }
}

impl Drop for SerialTransport {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NullSink;

    impl ReadableSink for NullSink {
        fn on_readable(&self, _chunk: &[u8]) {}
        fn on_fault(&self, _reason: &str) {}
    }

    #[test]
    fn test_candidate_port_patterns() {
        assert!(is_candidate_port("COM3"));
        assert!(is_candidate_port("COM12"));
        assert!(!is_candidate_port("COM"));
        assert!(!is_candidate_port("COMX"));
        assert!(is_candidate_port("/dev/ttyAMA3"));
        assert!(is_candidate_port("/dev/serial0"));
        assert!(is_candidate_port("/dev/ttyUSB0"));
        assert!(is_candidate_port("/dev/ttyACM1"));
        assert!(is_candidate_port("/dev/cu.usbmodem14101"));
        assert!(!is_candidate_port("/dev/tty0"));
        assert!(!is_candidate_port("/dev/ttyS0"));
    }

    #[test]
    fn test_port_info_builder() {
        let info = SerialPortInfo::new("/dev/ttyUSB0", "USB Serial")
            .with_manufacturer("FTDI")
            .with_serial_number("A123")
            .with_usb_ids(0x0403, 0x6001);
        assert_eq!(info.manufacturer.as_deref(), Some("FTDI"));
        assert_eq!(info.serial_number.as_deref(), Some("A123"));
        assert_eq!(info.vid, Some(0x0403));
        assert_eq!(info.pid, Some(0x6001));
    }

    #[test]
    fn test_setting_conversions() {
        assert!(matches!(
            to_serialport_data_bits(8),
            Ok(serialport::DataBits::Eight)
        ));
        assert!(to_serialport_data_bits(9).is_err());
        assert!(matches!(
            to_serialport_stop_bits(2),
            Ok(serialport::StopBits::Two)
        ));
        assert!(to_serialport_stop_bits(3).is_err());
        assert_eq!(to_serialport_parity(Parity::Odd), serialport::Parity::Odd);
        assert_eq!(
            to_serialport_flow_control(FlowControl::None),
            serialport::FlowControl::None
        );
    }

    #[test]
    fn test_write_when_closed_fails() {
        let mut transport = SerialTransport::new();
        assert!(!transport.is_open());
        assert_eq!(
            transport.write(b"PING\r\n"),
            Err(ConnectionError::NotConnected)
        );
        // Closing a closed transport is a no-op
        transport.close();
        assert!(!transport.is_open());
    }

    #[test]
    fn test_open_missing_port_reports_driver_reason() {
        let mut transport = SerialTransport::new();
        let config = ConnectionConfig::new("/dev/rigkit-no-such-port", 115_200);
        match transport.open(&config, Arc::new(NullSink)) {
            Err(ConnectionError::FailedToOpen { port, reason }) => {
                assert_eq!(port, "/dev/rigkit-no-such-port");
                assert!(!reason.is_empty());
            }
            other => panic!("expected FailedToOpen, got {:?}", other),
        }
        assert!(!transport.is_open());
    }
}
