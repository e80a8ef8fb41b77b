//! # RigKit Core
//!
//! Core types, errors, and event dispatch shared by the RigKit crates.
//! Provides the connection configuration and state model, the decoded
//! [`Line`] type, and the observer interface used to deliver lines, errors,
//! and connection-state changes to the integrating application.

pub mod data;
pub mod error;
pub mod event_bus;

pub use data::{
    ConnectionConfig, ConnectionState, FlowControl, Line, Parity, TestParameters,
    DEFAULT_BAUD_RATE, DEFAULT_HOMING_AXIS, DEFAULT_PORT_NAME,
};

pub use error::{ConnectionError, Error, Result};

pub use event_bus::{
    EventCategory, EventDispatcher, EventDispatcherConfig, EventFilter, LinkEvent,
    SubscriptionId,
};
