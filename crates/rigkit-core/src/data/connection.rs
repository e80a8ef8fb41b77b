//! Serial connection configuration

use crate::error::ConnectionError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Default controller UART on the host board
pub const DEFAULT_PORT_NAME: &str = "/dev/ttyAMA3";

/// Default baud rate of the controller firmware
pub const DEFAULT_BAUD_RATE: u32 = 115_200;

/// Serial parity setting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Parity {
    /// No parity bit
    #[default]
    None,
    /// Even parity
    Even,
    /// Odd parity
    Odd,
}

/// Serial flow control setting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlowControl {
    /// No flow control
    #[default]
    None,
    /// RTS/CTS
    Hardware,
    /// XON/XOFF
    Software,
}

/// Snapshot of the serial port settings.
///
/// Applied as a whole when the link is (re)configured; never mutated while
/// the port is open.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionConfig {
    /// Platform device path (e.g. "/dev/ttyAMA3", "COM3")
    pub port_name: String,
    /// Baud rate
    pub baud_rate: u32,
    /// Data bits (5-8)
    pub data_bits: u8,
    /// Parity
    pub parity: Parity,
    /// Stop bits (1-2)
    pub stop_bits: u8,
    /// Flow control
    pub flow_control: FlowControl,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            port_name: DEFAULT_PORT_NAME.to_string(),
            baud_rate: DEFAULT_BAUD_RATE,
            data_bits: 8,
            parity: Parity::None,
            stop_bits: 1,
            flow_control: FlowControl::None,
        }
    }
}

impl ConnectionConfig {
    /// Create a config for `port_name` at `baud_rate`, 8N1 with no flow control
    pub fn new(port_name: impl Into<String>, baud_rate: u32) -> Self {
        Self {
            port_name: port_name.into(),
            baud_rate,
            ..Self::default()
        }
    }

    /// Copy of this config with a different port
    pub fn with_port_name(&self, port_name: impl Into<String>) -> Self {
        Self {
            port_name: port_name.into(),
            ..self.clone()
        }
    }

    /// Copy of this config with a different baud rate
    pub fn with_baud_rate(&self, baud_rate: u32) -> Self {
        Self {
            baud_rate,
            ..self.clone()
        }
    }

    /// Validate the settings before they are handed to a driver
    pub fn validate(&self) -> Result<(), ConnectionError> {
        if self.port_name.trim().is_empty() {
            return Err(ConnectionError::InvalidParameters {
                reason: "port name must not be empty".to_string(),
            });
        }
        if self.baud_rate == 0 {
            return Err(ConnectionError::InvalidParameters {
                reason: "baud rate must be > 0".to_string(),
            });
        }
        if !(5..=8).contains(&self.data_bits) {
            return Err(ConnectionError::InvalidParameters {
                reason: format!("invalid data bits: {}", self.data_bits),
            });
        }
        if !(1..=2).contains(&self.stop_bits) {
            return Err(ConnectionError::InvalidParameters {
                reason: format!("invalid stop bits: {}", self.stop_bits),
            });
        }
        Ok(())
    }
}

impl fmt::Display for ConnectionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parity = match self.parity {
            Parity::None => 'N',
            Parity::Even => 'E',
            Parity::Odd => 'O',
        };
        write!(
            f,
            "{} @ {} {}{}{}",
            self.port_name, self.baud_rate, self.data_bits, parity, self.stop_bits
        )
    }
}
