//! Connection state machine for the rig controller link.
//!
//! [`RigController`] owns one [`Transport`], the current [`ConnectionConfig`],
//! the receive-side [`LineAssembler`], and the [`EventDispatcher`] that
//! observers subscribe to. Commands are fire-and-forget: nothing waits for or
//! matches a reply.
//!
//! Event handlers run on the thread that delivered the bytes (the serial
//! reader thread for [`SerialTransport`]). They may query state, send, or
//! close the link from there.

use crate::communication::{serial::SerialTransport, ReadableSink, Teardown, Transport};
use crate::protocol::{encode_line, Command, LineAssembler};
use parking_lot::{Mutex, RwLock};
use rigkit_core::{
    ConnectionConfig, ConnectionError, ConnectionState, EventDispatcher, LinkEvent,
    TestParameters,
};
use std::sync::Arc;

/// Receive side of the link, handed to the transport as its sink
struct ReceivePath {
    assembler: Mutex<LineAssembler>,
    events: Arc<EventDispatcher>,
}

impl ReadableSink for ReceivePath {
    fn on_readable(&self, chunk: &[u8]) {
        // The assembler lock is released before any handler runs.
        let lines = self.assembler.lock().push(chunk);
        for line in lines {
            tracing::debug!("RX: {}", line);
            self.events.publish(LinkEvent::LineReceived(line));
        }
    }

    fn on_fault(&self, reason: &str) {
        tracing::warn!("Transport fault: {}", reason);
        self.events.publish(LinkEvent::Error(reason.to_string()));
    }
}

/// Controller link: connection lifecycle plus command sending
pub struct RigController {
    transport: Mutex<Box<dyn Transport>>,
    config: RwLock<ConnectionConfig>,
    state: RwLock<ConnectionState>,
    receive: Arc<ReceivePath>,
}

impl RigController {
    /// Create a disconnected controller over `transport`
    pub fn new(transport: impl Transport + 'static, config: ConnectionConfig) -> Self {
        Self {
            transport: Mutex::new(Box::new(transport)),
            config: RwLock::new(config),
            state: RwLock::new(ConnectionState::Disconnected),
            receive: Arc::new(ReceivePath {
                assembler: Mutex::new(LineAssembler::new()),
                events: Arc::new(EventDispatcher::new()),
            }),
        }
    }

    /// Create a disconnected controller over a serial port
    pub fn serial(config: ConnectionConfig) -> Self {
        Self::new(SerialTransport::new(), config)
    }

    /// Dispatcher delivering this link's events
    pub fn events(&self) -> &Arc<EventDispatcher> {
        &self.receive.events
    }

    /// Get the current connection state
    pub fn state(&self) -> ConnectionState {
        *self.state.read()
    }

    /// Check if the link is connected
    pub fn is_connected(&self) -> bool {
        self.state().is_connected()
    }

    /// Open the link with the current configuration.
    ///
    /// Succeeds without reopening if already connected. On failure the link
    /// stays disconnected and an error event carrying the driver's reason is
    /// published. A connection-changed event follows every call.
    pub fn open(&self) -> Result<(), ConnectionError> {
        let (config, result) = {
            let mut transport = self.transport.lock();
            let config = self.config.read().clone();
            let result = if transport.is_open() {
                tracing::debug!("Link to {} already open", config.port_name);
                Ok(())
            } else {
                self.receive.assembler.lock().clear();
                let sink: Arc<dyn ReadableSink> = self.receive.clone();
                let opened = config
                    .validate()
                    .and_then(|()| transport.open(&config, sink));
                if opened.is_ok() {
                    *self.state.write() = ConnectionState::Connected;
                }
                opened
            };
            (config, result)
        };

        match &result {
            Ok(()) => tracing::info!("Connected to {}", config),
            Err(e) => {
                tracing::warn!("Failed to connect to {}: {}", config.port_name, e);
                self.events().publish(LinkEvent::Error(e.reason()));
            }
        }
        self.events().publish(LinkEvent::ConnectionChanged);
        result
    }

    /// Close the link. No-op (and no event) if already closed.
    ///
    /// Waits for the reader thread to exit, unless called from it.
    pub fn close(&self) {
        let (teardown, port_name) = {
            let mut transport = self.transport.lock();
            (self.detach(&mut **transport), self.port_name())
        };
        self.finish_close(teardown, &port_name);
    }

    /// Detach an open transport. The caller holds the transport lock.
    fn detach(&self, transport: &mut dyn Transport) -> Option<Teardown> {
        if !transport.is_open() {
            return None;
        }
        // Senders blocked on the transport lock see this once it is released.
        *self.state.write() = ConnectionState::Disconnected;
        Some(transport.detach())
    }

    /// Join the transport's cleanup with no lock held, then notify
    fn finish_close(&self, teardown: Option<Teardown>, port_name: &str) {
        if let Some(teardown) = teardown {
            teardown.finish();
            tracing::info!("Disconnected from {}", port_name);
            self.events().publish(LinkEvent::ConnectionChanged);
        }
    }

    /// Get the configured port name
    pub fn port_name(&self) -> String {
        self.config.read().port_name.clone()
    }

    /// Get the configured baud rate
    pub fn baud_rate(&self) -> u32 {
        self.config.read().baud_rate
    }

    /// Snapshot of the current configuration
    pub fn config(&self) -> ConnectionConfig {
        self.config.read().clone()
    }

    /// Change the port name. See [`reconfigure`](Self::reconfigure).
    pub fn set_port_name(&self, port_name: impl Into<String>) {
        let config = self.config().with_port_name(port_name);
        self.reconfigure(config);
    }

    /// Change the baud rate. See [`reconfigure`](Self::reconfigure).
    pub fn set_baud_rate(&self, baud_rate: u32) {
        let config = self.config().with_baud_rate(baud_rate);
        self.reconfigure(config);
    }

    /// Apply new link settings.
    ///
    /// If connected, the link is closed first and stays closed; call
    /// [`open`](Self::open) to connect with the new settings. An unchanged
    /// configuration is a no-op.
    pub fn reconfigure(&self, config: ConnectionConfig) {
        let (teardown, old_port) = {
            let mut transport = self.transport.lock();
            let mut current = self.config.write();
            if *current == config {
                tracing::debug!("Configuration unchanged: {}", config);
                return;
            }
            let teardown = self.detach(&mut **transport);
            let old_port = std::mem::replace(&mut *current, config.clone()).port_name;
            (teardown, old_port)
        };

        tracing::info!("Link reconfigured: {}", config);
        self.finish_close(teardown, &old_port);
    }

    /// Send a command.
    ///
    /// Fails with [`ConnectionError::NotConnected`] without any I/O when the
    /// link is closed. Never queues or retries.
    pub fn send(&self, command: &Command) -> Result<(), ConnectionError> {
        self.write_frame(&command.encode(), &command.to_command_string())
    }

    /// Send a raw text line, terminated with `\r\n`.
    pub fn send_line(&self, line: &str) -> Result<(), ConnectionError> {
        let frame = encode_line(line);
        self.write_frame(&frame, line.trim_end_matches(['\r', '\n']))
    }

    fn write_frame(&self, frame: &[u8], text: &str) -> Result<(), ConnectionError> {
        if !self.is_connected() {
            tracing::warn!("Cannot send '{}': not connected", text);
            return Err(ConnectionError::NotConnected);
        }

        let mut transport = self.transport.lock();
        if !transport.is_open() {
            tracing::warn!("Cannot send '{}': not connected", text);
            return Err(ConnectionError::NotConnected);
        }

        match transport.write(frame) {
            Ok(written) => {
                tracing::debug!("TX: {} ({} bytes)", text, written);
                Ok(())
            }
            Err(e) => {
                tracing::warn!("Failed to send '{}': {}", text, e);
                Err(e)
            }
        }
    }

    // ========== Link ==========

    /// Send `PING`
    pub fn ping(&self) -> Result<(), ConnectionError> {
        self.send(&Command::Ping)
    }

    /// Request a status line
    pub fn get_status(&self) -> Result<(), ConnectionError> {
        self.send(&Command::GetStatus)
    }

    /// Clear a latched fault
    pub fn clear_fault(&self) -> Result<(), ConnectionError> {
        self.send(&Command::ClearFault)
    }

    /// Engage or release the emergency stop
    pub fn estop(&self, engaged: bool) -> Result<(), ConnectionError> {
        self.send(&Command::estop(engaged))
    }

    // ========== Motion ==========

    /// Home an axis
    pub fn home(&self, axis: &str) -> Result<(), ConnectionError> {
        self.send(&Command::home(axis))
    }

    /// Move an axis to an absolute position
    pub fn move_abs(&self, axis: &str, pos: f64, vel: f64, accel: f64) -> Result<(), ConnectionError> {
        self.send(&Command::move_abs(axis, pos, vel, accel))
    }

    /// Move an axis at constant velocity
    pub fn move_vel(&self, axis: &str, vel: f64) -> Result<(), ConnectionError> {
        self.send(&Command::move_vel(axis, vel))
    }

    /// Start jogging an axis up
    pub fn jog_up(&self, axis: &str) -> Result<(), ConnectionError> {
        self.send(&Command::jog_up(axis))
    }

    /// Start jogging an axis down
    pub fn jog_down(&self, axis: &str) -> Result<(), ConnectionError> {
        self.send(&Command::jog_down(axis))
    }

    /// Stop jogging an axis
    pub fn jog_stop(&self, axis: &str) -> Result<(), ConnectionError> {
        self.send(&Command::jog_stop(axis))
    }

    // ========== Actuators ==========

    /// Set the heater setpoint
    pub fn heater_set(&self, setpoint: f64) -> Result<(), ConnectionError> {
        self.send(&Command::heater_set(setpoint))
    }

    /// Set the fan duty; clamped to 0..=255
    pub fn set_fan(&self, pwm: i64) -> Result<(), ConnectionError> {
        self.send(&Command::set_fan(pwm))
    }

    /// Close or open the clamp
    pub fn set_clamp(&self, closed: bool) -> Result<(), ConnectionError> {
        self.send(&Command::set_clamp(closed))
    }

    /// Lower the carriage into or raise it out of the water
    pub fn set_carriage(&self, in_water: bool) -> Result<(), ConnectionError> {
        self.send(&Command::set_carriage(in_water))
    }

    // ========== Jobs and streaming ==========

    /// Start a stored job
    pub fn start_job(&self, job_id: &str) -> Result<(), ConnectionError> {
        self.send(&Command::start_job(job_id))
    }

    /// Abort the running job
    pub fn abort_job(&self) -> Result<(), ConnectionError> {
        self.send(&Command::AbortJob)
    }

    /// Start streaming telemetry
    pub fn start_stream(&self, rate_hz: u32) -> Result<(), ConnectionError> {
        self.send(&Command::start_stream(rate_hz))
    }

    /// Stop streaming telemetry
    pub fn stop_stream(&self) -> Result<(), ConnectionError> {
        self.send(&Command::StopStream)
    }

    // ========== Test runs ==========

    /// Start a test run
    pub fn test_start(&self, params: &TestParameters) -> Result<(), ConnectionError> {
        self.send(&Command::test_start(params))
    }

    /// Pause the test run
    pub fn test_pause(&self) -> Result<(), ConnectionError> {
        self.send(&Command::TestPause)
    }

    /// Stop the test run
    pub fn test_stop(&self) -> Result<(), ConnectionError> {
        self.send(&Command::TestStop)
    }

    /// Send the firmware-side `TEST_PREP` command
    pub fn test_prep(&self) -> Result<(), ConnectionError> {
        self.send(&Command::TestPrep)
    }
}

impl Drop for RigController {
    fn drop(&mut self) {
        self.transport.get_mut().close();
    }
}

impl std::fmt::Debug for RigController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RigController")
            .field("config", &*self.config.read())
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}
