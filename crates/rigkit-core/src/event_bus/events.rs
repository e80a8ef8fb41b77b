//! Event type definitions for link notifications.

use serde::{Deserialize, Serialize};

use crate::data::Line;

/// Notification published by the controller link
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LinkEvent {
    /// A complete line was decoded from the receive stream
    LineReceived(Line),
    /// A human-readable failure reason (failed open or driver fault)
    Error(String),
    /// The connection state may have changed; observers re-query it
    ConnectionChanged,
}

impl LinkEvent {
    /// Get the category of this event
    pub fn category(&self) -> EventCategory {
        match self {
            LinkEvent::LineReceived(_) => EventCategory::Line,
            LinkEvent::Error(_) => EventCategory::Error,
            LinkEvent::ConnectionChanged => EventCategory::Connection,
        }
    }

    /// Get a short description of this event for logging
    pub fn description(&self) -> String {
        match self {
            LinkEvent::LineReceived(line) => format!("Line received: {}", line),
            LinkEvent::Error(reason) => format!("Error: {}", reason),
            LinkEvent::ConnectionChanged => "Connection state changed".to_string(),
        }
    }
}

/// Event category for filtering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventCategory {
    /// Decoded lines
    Line,
    /// Error notifications
    Error,
    /// Connection-state changes
    Connection,
}

impl std::fmt::Display for EventCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventCategory::Line => write!(f, "Line"),
            EventCategory::Error => write!(f, "Error"),
            EventCategory::Connection => write!(f, "Connection"),
        }
    }
}
