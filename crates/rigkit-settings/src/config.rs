//! Configuration and settings management for RigKit
//!
//! Supports JSON and TOML file formats, chosen by file extension, stored in
//! the platform configuration directory by default.
//!
//! Configuration is organized into sections:
//! - Connection settings (port, baud rate, framing)
//! - Sequencer defaults (homing axis used during test preparation)

use crate::error::{SettingsError, SettingsResult};
pub use rigkit_core::DEFAULT_HOMING_AXIS;
use rigkit_core::ConnectionConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application directory name under the platform config directory
const APP_DIR: &str = "rigkit";

/// Default config file name
const CONFIG_FILE: &str = "config.toml";

/// File formats understood by [`Config::load_from_file`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Json,
    Toml,
}

impl Format {
    fn from_path(path: &Path) -> SettingsResult<Self> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Ok(Format::Json),
            Some("toml") => Ok(Format::Toml),
            other => Err(SettingsError::UnsupportedFormat(
                other.unwrap_or("<none>").to_string(),
            )),
        }
    }
}

/// Test sequencer defaults
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SequencerSettings {
    /// Axis homed while preparing a test run
    pub homing_axis: String,
}

impl Default for SequencerSettings {
    fn default() -> Self {
        Self {
            homing_axis: DEFAULT_HOMING_AXIS.to_string(),
        }
    }
}

/// Complete application configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// Serial link settings
    pub connection: ConnectionConfig,
    /// Sequencer defaults
    pub sequencer: SequencerSettings,
}

impl Config {
    /// Create new config with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Load config from file (JSON or TOML)
    pub fn load_from_file(path: &Path) -> SettingsResult<Self> {
        let format = Format::from_path(path)?;
        let content = std::fs::read_to_string(path)?;

        let config: Self = match format {
            Format::Json => serde_json::from_str(&content)?,
            Format::Toml => toml::from_str(&content)?,
        };

        config.validate()?;
        tracing::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Save config to file (JSON or TOML), creating parent directories
    pub fn save_to_file(&self, path: &Path) -> SettingsResult<()> {
        self.validate()?;

        let content = match Format::from_path(path)? {
            Format::Json => serde_json::to_string_pretty(self)?,
            Format::Toml => toml::to_string_pretty(self)?,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;

        tracing::info!("Saved config to {}", path.display());
        Ok(())
    }

    /// Load from `path` if it exists, otherwise fall back to defaults
    pub fn load_or_default(path: &Path) -> SettingsResult<Self> {
        if path.exists() {
            Self::load_from_file(path)
        } else {
            tracing::debug!("No config at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> SettingsResult<()> {
        self.connection.validate()?;

        if self.sequencer.homing_axis.trim().is_empty() {
            return Err(SettingsError::InvalidSetting {
                key: "sequencer.homing_axis".to_string(),
                reason: "must not be empty".to_string(),
            });
        }

        Ok(())
    }
}

/// Default config location: `<platform config dir>/rigkit/config.toml`
pub fn default_config_path() -> SettingsResult<PathBuf> {
    dirs::config_dir()
        .map(|dir| dir.join(APP_DIR).join(CONFIG_FILE))
        .ok_or_else(|| {
            SettingsError::ConfigDirectory("platform config directory not found".to_string())
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rigkit_core::{FlowControl, Parity};
    use tempfile::TempDir;

    fn custom() -> Config {
        let mut config = Config::new();
        config.connection = ConnectionConfig::new("/dev/ttyUSB1", 57_600);
        config.connection.parity = Parity::Even;
        config.connection.flow_control = FlowControl::Hardware;
        config.sequencer.homing_axis = "Y".to_string();
        config
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.connection.port_name, "/dev/ttyAMA3");
        assert_eq!(config.connection.baud_rate, 115_200);
        assert_eq!(config.sequencer.homing_axis, "Z");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_toml_file_roundtrip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        custom().save_to_file(&path).unwrap();
        let loaded = Config::load_from_file(&path).unwrap();

        assert_eq!(loaded, custom());
    }

    #[test]
    fn test_json_file_roundtrip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");

        custom().save_to_file(&path).unwrap();
        let loaded = Config::load_from_file(&path).unwrap();

        assert_eq!(loaded, custom());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[connection]\nbaud_rate = 9600\n").unwrap();

        let loaded = Config::load_from_file(&path).unwrap();

        assert_eq!(loaded.connection.baud_rate, 9600);
        assert_eq!(loaded.connection.port_name, "/dev/ttyAMA3");
        assert_eq!(loaded.sequencer.homing_axis, "Z");
    }

    #[test]
    fn test_unsupported_extension() {
        let err = Config::new()
            .save_to_file(Path::new("config.yaml"))
            .unwrap_err();
        assert!(matches!(err, SettingsError::UnsupportedFormat(ref ext) if ext == "yaml"));
    }

    #[test]
    fn test_invalid_values_rejected() {
        let mut config = Config::new();
        config.connection.baud_rate = 0;
        assert!(matches!(
            config.validate(),
            Err(SettingsError::InvalidSetting { .. })
        ));

        let mut config = Config::new();
        config.sequencer.homing_axis = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_file_is_not_loaded() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[connection]\nport_name = \"\"\n").unwrap();
        assert!(Config::load_from_file(&path).is_err());

        std::fs::write(&path, "not = [valid").unwrap();
        assert!(matches!(
            Config::load_from_file(&path),
            Err(SettingsError::TomlError(_))
        ));
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let dir = TempDir::new().unwrap();
        let config = Config::load_or_default(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_default_config_path_shape() {
        if let Ok(path) = default_config_path() {
            assert!(path.ends_with("rigkit/config.toml"));
        }
    }
}
