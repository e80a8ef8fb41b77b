//! RigKit Settings Crate
//!
//! Persists the serial link configuration and sequencer defaults as JSON or
//! TOML in the platform configuration directory.

pub mod config;
pub mod error;

pub use config::{default_config_path, Config, SequencerSettings, DEFAULT_HOMING_AXIS};
pub use error::{SettingsError, SettingsResult};
