//! # RigKit
//!
//! Host-side command and telemetry link for a bench test rig controller:
//! - Serial transport with event-driven reads
//! - LF-delimited line framing and CRLF-terminated commands
//! - Connection state machine with explicit reconfiguration
//! - Ordered observer notifications for lines, errors, and state changes
//! - Multi-step test-run sequences
//!
//! ## Architecture
//!
//! RigKit is organized as a workspace with multiple crates:
//!
//! 1. **rigkit-core** - Connection config, lines, errors, event dispatcher
//! 2. **rigkit-communication** - Transport, framing, commands, controller, sequencer
//! 3. **rigkit-settings** - Persisted link and sequencer settings
//! 4. **rigkit** - This crate: re-exports, logging setup, and the CLI

pub mod cli;

pub use rigkit_communication::{
    encode_line, list_ports, Command, LineAssembler, ParseVerbError, ReadableSink,
    RigController, SerialPortInfo, SerialTransport, Teardown, TestSequencer, Transport, Verb,
};

pub use rigkit_core::{
    ConnectionConfig, ConnectionError, ConnectionState, Error, EventCategory, EventDispatcher,
    EventFilter, FlowControl, Line, LinkEvent, Parity, Result, SubscriptionId, TestParameters,
};

pub use rigkit_settings::{default_config_path, Config, SequencerSettings, SettingsError};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Build date (set at compile time)
pub const BUILD_DATE: &str = env!("BUILD_DATE");

/// Initialize logging with the default configuration
///
/// Sets up structured logging with:
/// - Output on stderr, leaving stdout for received lines
/// - RUST_LOG environment variable support (default level: info)
/// - Target, thread, and line number in each record
///
/// Calling it again once a subscriber is installed does nothing.
pub fn init_logging() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(tracing::Level::INFO.to_string()));

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_level(true)
        .with_thread_ids(true)
        .with_thread_names(true)
        .with_line_number(true);

    if tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()
        .is_err()
    {
        tracing::debug!("Logging already initialized");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_logging_twice() {
        assert!(init_logging().is_ok());
        assert!(init_logging().is_ok());
    }

    #[test]
    fn test_version_info() {
        assert!(!VERSION.is_empty());
        assert!(!BUILD_DATE.is_empty());
    }
}
