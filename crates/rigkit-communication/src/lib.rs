//! # RigKit Communication
//!
//! The command/telemetry protocol layer for the rig controller:
//! - Serial transport with an event-driven reader thread
//! - LF-delimited line framing of the receive stream
//! - Typed command encoding with fixed numeric precision
//! - Connection state machine and fire-and-forget command sending
//! - Ordered multi-step sequences for test runs

pub mod communication;
pub mod controller;
pub mod protocol;
pub mod sequencer;

pub use communication::{
    serial::{list_ports, SerialPortInfo, SerialTransport},
    ReadableSink, Teardown, Transport,
};
pub use controller::RigController;
pub use protocol::{encode_line, Command, LineAssembler, ParseVerbError, Verb};
pub use sequencer::TestSequencer;
