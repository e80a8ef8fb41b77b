//! Error handling for RigKit
//!
//! Provides the error types for the controller link:
//! - Connection errors (opening, writing, configuration)
//! - A unified [`Error`] for public APIs
//!
//! Malformed bytes on the receive path are never errors; the line assembler
//! replaces them during decoding.

use thiserror::Error;

/// Connection error type
///
/// Represents errors related to the serial link with the rig controller.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConnectionError {
    /// Failed to open port
    #[error("Failed to open port {port}: {reason}")]
    FailedToOpen {
        /// The name of the port that failed to open.
        port: String,
        /// The driver's diagnostic string.
        reason: String,
    },

    /// A write was attempted while the link is closed
    #[error("Serial link not connected")]
    NotConnected,

    /// The driver rejected a write
    #[error("Write failed: {reason}")]
    WriteFailed {
        /// The reason the write failed.
        reason: String,
    },

    /// Invalid connection parameters
    #[error("Invalid connection parameters: {reason}")]
    InvalidParameters {
        /// The reason the parameters are invalid.
        reason: String,
    },
}

impl ConnectionError {
    /// The human-readable reason carried by this error, as delivered to
    /// error observers.
    pub fn reason(&self) -> String {
        match self {
            Self::FailedToOpen { reason, .. }
            | Self::WriteFailed { reason }
            | Self::InvalidParameters { reason } => reason.clone(),
            Self::NotConnected => self.to_string(),
        }
    }
}

/// Main error type for RigKit
///
/// A unified error type that can represent any error from the link layer.
/// This is the primary error type used in public APIs.
#[derive(Error, Debug)]
pub enum Error {
    /// Connection error
    #[error(transparent)]
    Connection(#[from] ConnectionError),

    /// Standard I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an error from a string message
    pub fn other(msg: impl Into<String>) -> Self {
        Error::Other(msg.into())
    }

    /// Check if this is a connection error
    pub fn is_connection_error(&self) -> bool {
        matches!(self, Error::Connection(_))
    }

    /// Check if this error was caused by writing to a closed link
    pub fn is_not_connected(&self) -> bool {
        matches!(self, Error::Connection(ConnectionError::NotConnected))
    }
}

/// Result type using Error
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_error_display() {
        let err = ConnectionError::FailedToOpen {
            port: "/dev/ttyAMA3".to_string(),
            reason: "No such file or directory".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Failed to open port /dev/ttyAMA3: No such file or directory"
        );
        assert_eq!(err.reason(), "No such file or directory");

        assert_eq!(
            ConnectionError::NotConnected.to_string(),
            "Serial link not connected"
        );
    }

    #[test]
    fn test_error_classification() {
        let err: Error = ConnectionError::NotConnected.into();
        assert!(err.is_connection_error());
        assert!(err.is_not_connected());

        let err: Error = ConnectionError::WriteFailed {
            reason: "broken pipe".to_string(),
        }
        .into();
        assert!(err.is_connection_error());
        assert!(!err.is_not_connected());

        let err = Error::other("something else");
        assert!(!err.is_connection_error());
        assert_eq!(err.to_string(), "something else");
    }

    #[test]
    fn test_io_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::TimedOut, "timed out");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }
}
