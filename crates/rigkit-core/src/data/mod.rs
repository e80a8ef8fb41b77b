//! Data models for the controller link
//!
//! This module provides:
//! - Serial connection configuration snapshots
//! - The Disconnected/Connected state of the link
//! - Decoded text lines received from the controller
//! - Test-run parameters supplied by the run-lifecycle store

mod connection;

pub use connection::{ConnectionConfig, FlowControl, Parity, DEFAULT_BAUD_RATE, DEFAULT_PORT_NAME};

use serde::{Deserialize, Serialize};
use std::fmt;

/// State of the serial link
///
/// Errors are reported as transient events and never become a state of
/// their own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ConnectionState {
    /// Port closed (initial state)
    #[default]
    Disconnected,
    /// Port open and ready for communication
    Connected,
}

impl ConnectionState {
    /// Check if the link is open
    pub fn is_connected(&self) -> bool {
        matches!(self, Self::Connected)
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disconnected => write!(f, "Disconnected"),
            Self::Connected => write!(f, "Connected"),
        }
    }
}

/// One decoded line of text received from the controller.
///
/// The LF terminator and at most one trailing CR have been removed. Any
/// invalid UTF-8 in the original bytes has been replaced with U+FFFD.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Line(String);

impl Line {
    /// Wrap already-decoded text
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    /// Borrow the line text
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Take ownership of the line text
    pub fn into_string(self) -> String {
        self.0
    }

    /// Check if the line has no text
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Line {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Line {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for Line {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for Line {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// Axis homed while preparing a test run
pub const DEFAULT_HOMING_AXIS: &str = "Z";

/// Parameters for starting a test run.
///
/// Supplied already validated by the run-lifecycle store; the link layer
/// only formats them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestParameters {
    /// Carriage speed in cm/s
    pub speed_cm_s: f64,
    /// Stroke length in mm
    pub stroke_length_mm: u32,
    /// Clamp force in grams
    pub clamp_force_g: u32,
    /// Water temperature in degrees Celsius
    pub water_temp_c: i32,
    /// Number of cycles to perform
    pub cycles: u32,
}
