//! Support code for the `rigkit` command line client.
//!
//! Settings resolve in three layers: built-in defaults, then the config
//! file, then command line flags.

use anyhow::{anyhow, bail, Context};
use rigkit_communication::{Command, SerialPortInfo, Verb};
use rigkit_settings::{default_config_path, Config};
use std::path::Path;
use std::str::FromStr;

/// Resolve the effective configuration.
///
/// An explicit `config_path` must exist. Without one, the default location
/// is used when present.
pub fn resolve_config(
    config_path: Option<&Path>,
    port: Option<String>,
    baud: Option<u32>,
) -> anyhow::Result<Config> {
    let mut config = match config_path {
        Some(path) => Config::load_from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => match default_config_path() {
            Ok(path) => Config::load_or_default(&path)
                .with_context(|| format!("Failed to load config from {}", path.display()))?,
            Err(e) => {
                tracing::debug!("{}; using defaults", e);
                Config::default()
            }
        },
    };

    if let Some(port) = port {
        config.connection.port_name = port;
    }
    if let Some(baud) = baud {
        config.connection.baud_rate = baud;
    }
    config.validate()?;
    Ok(config)
}

/// Render a port listing as a JSON array
pub fn ports_json(ports: &[SerialPortInfo]) -> anyhow::Result<String> {
    serde_json::to_string_pretty(ports).context("Failed to serialize port list")
}

/// `key=value` arguments of a command typed on the command line
struct Params<'a> {
    verb: Verb,
    pairs: Vec<(&'a str, &'a str)>,
}

impl<'a> Params<'a> {
    fn parse(verb: Verb, args: &'a [String]) -> anyhow::Result<Self> {
        let pairs = args
            .iter()
            .map(|arg| {
                arg.split_once('=')
                    .ok_or_else(|| anyhow!("expected key=value, got '{}'", arg))
            })
            .collect::<anyhow::Result<Vec<_>>>()?;
        Ok(Self { verb, pairs })
    }

    fn raw(&self, key: &str) -> anyhow::Result<&'a str> {
        self.pairs
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| *v)
            .ok_or_else(|| anyhow!("{} requires {}=<value>", self.verb, key))
    }

    fn value<T>(&self, key: &str) -> anyhow::Result<T>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        let raw = self.raw(key)?;
        raw.parse()
            .map_err(|e| anyhow!("invalid {} '{}': {}", key, raw, e))
    }

    fn flag(&self, key: &str) -> anyhow::Result<bool> {
        match self.raw(key)?.to_ascii_lowercase().as_str() {
            "1" | "true" | "on" => Ok(true),
            "0" | "false" | "off" => Ok(false),
            other => bail!("invalid {} '{}': expected 1 or 0", key, other),
        }
    }
}

/// Build a command from a verb keyword and `key=value` arguments.
pub fn parse_command(verb: &str, args: &[String]) -> anyhow::Result<Command> {
    let verb: Verb = verb.parse()?;
    let p = Params::parse(verb, args)?;

    let command = match verb {
        Verb::Ping => Command::Ping,
        Verb::GetStatus => Command::GetStatus,
        Verb::ClearFault => Command::ClearFault,
        Verb::Estop => Command::estop(p.flag("state")?),
        Verb::Home => Command::home(p.raw("axis")?),
        Verb::MoveAbs => Command::move_abs(
            p.raw("axis")?,
            p.value("pos")?,
            p.value("vel")?,
            p.value("accel")?,
        ),
        Verb::MoveVel => Command::move_vel(p.raw("axis")?, p.value("vel")?),
        Verb::HeaterSet => Command::heater_set(p.value("setpoint")?),
        Verb::SetFan => Command::set_fan(p.value("pwm")?),
        Verb::StartJob => Command::start_job(p.raw("job_id")?),
        Verb::AbortJob => Command::AbortJob,
        Verb::StartStream => Command::start_stream(p.value("rate_hz")?),
        Verb::StopStream => Command::StopStream,
        Verb::SetClamp => Command::set_clamp(p.flag("state")?),
        Verb::SetCarriage => Command::set_carriage(p.flag("state")?),
        Verb::TestStart => Command::TestStart {
            speed: p.value("speed")?,
            stroke_length: p.value("stroke_length")?,
            clamp_force: p.value("clamp_force")?,
            water_temp: p.value("water_temp")?,
            cycles: p.value("cycles")?,
        },
        Verb::TestPause => Command::TestPause,
        Verb::TestStop => Command::TestStop,
        Verb::TestPrep => Command::TestPrep,
        Verb::JogUp => Command::jog_up(p.raw("axis")?),
        Verb::JogDown => Command::jog_down(p.raw("axis")?),
        Verb::JogStop => Command::jog_stop(p.raw("axis")?),
    };
    Ok(command)
}
