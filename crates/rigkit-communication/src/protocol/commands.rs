//! Commands understood by the rig controller firmware.
//!
//! The controller supports several categories of commands:
//! - Link and fault handling (ping, status, e-stop)
//! - Motion (homing, absolute and velocity moves, jogging)
//! - Heater, fan, clamp, and carriage actuators
//! - Jobs, telemetry streaming, and test runs
//!
//! Numeric parameters are formatted with a fixed precision per field, so the
//! same command always produces the same line.

use super::encode_line;
use rigkit_core::TestParameters;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Prefix of every command line except `PING`
pub const COMMAND_PREFIX: &str = "CMD";

/// Keywords naming the actions the controller understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verb {
    /// Liveness check (`PING`)
    Ping,
    /// Request a status line (`GET_STATUS`)
    GetStatus,
    /// Clear a latched fault (`CLEAR_FAULT`)
    ClearFault,
    /// Engage or release the emergency stop (`ESTOP`)
    Estop,
    /// Home one axis (`HOME`)
    Home,
    /// Absolute move (`MOVE_ABS`)
    MoveAbs,
    /// Constant-velocity move (`MOVE_VEL`)
    MoveVel,
    /// Heater setpoint (`HEATER_SET`)
    HeaterSet,
    /// Fan PWM duty (`SET_FAN`)
    SetFan,
    /// Start a stored job (`START_JOB`)
    StartJob,
    /// Abort the running job (`ABORT_JOB`)
    AbortJob,
    /// Start streaming telemetry (`START_STREAM`)
    StartStream,
    /// Stop streaming telemetry (`STOP_STREAM`)
    StopStream,
    /// Open or close the clamp (`SET_CLAMP`)
    SetClamp,
    /// Move the carriage into or out of the water (`SET_CARRIAGE`)
    SetCarriage,
    /// Start a test run (`TEST_START`)
    TestStart,
    /// Pause the test run (`TEST_PAUSE`)
    TestPause,
    /// Stop the test run (`TEST_STOP`)
    TestStop,
    /// Firmware-side test preparation (`TEST_PREP`)
    TestPrep,
    /// Jog an axis up (`JOG_UP`)
    JogUp,
    /// Jog an axis down (`JOG_DOWN`)
    JogDown,
    /// Stop jogging an axis (`JOG_STOP`)
    JogStop,
}

impl Verb {
    /// Every verb, in protocol table order
    pub const ALL: [Verb; 22] = [
        Verb::Ping,
        Verb::GetStatus,
        Verb::ClearFault,
        Verb::Estop,
        Verb::Home,
        Verb::MoveAbs,
        Verb::MoveVel,
        Verb::HeaterSet,
        Verb::SetFan,
        Verb::StartJob,
        Verb::AbortJob,
        Verb::StartStream,
        Verb::StopStream,
        Verb::SetClamp,
        Verb::SetCarriage,
        Verb::TestStart,
        Verb::TestPause,
        Verb::TestStop,
        Verb::TestPrep,
        Verb::JogUp,
        Verb::JogDown,
        Verb::JogStop,
    ];

    /// Get the keyword used on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            Verb::Ping => "PING",
            Verb::GetStatus => "GET_STATUS",
            Verb::ClearFault => "CLEAR_FAULT",
            Verb::Estop => "ESTOP",
            Verb::Home => "HOME",
            Verb::MoveAbs => "MOVE_ABS",
            Verb::MoveVel => "MOVE_VEL",
            Verb::HeaterSet => "HEATER_SET",
            Verb::SetFan => "SET_FAN",
            Verb::StartJob => "START_JOB",
            Verb::AbortJob => "ABORT_JOB",
            Verb::StartStream => "START_STREAM",
            Verb::StopStream => "STOP_STREAM",
            Verb::SetClamp => "SET_CLAMP",
            Verb::SetCarriage => "SET_CARRIAGE",
            Verb::TestStart => "TEST_START",
            Verb::TestPause => "TEST_PAUSE",
            Verb::TestStop => "TEST_STOP",
            Verb::TestPrep => "TEST_PREP",
            Verb::JogUp => "JOG_UP",
            Verb::JogDown => "JOG_DOWN",
            Verb::JogStop => "JOG_STOP",
        }
    }

    /// Whether the line carries the `CMD` prefix
    pub fn is_prefixed(&self) -> bool {
        !matches!(self, Verb::Ping)
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a keyword names no known verb
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown verb: {0}")]
pub struct ParseVerbError(pub String);

impl FromStr for Verb {
    type Err = ParseVerbError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_uppercase().replace('-', "_");
        Verb::ALL
            .iter()
            .copied()
            .find(|verb| verb.as_str() == wanted)
            .ok_or_else(|| ParseVerbError(s.to_string()))
    }
}

/// A command with its parameters already validated for the wire.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    // ========== Link ==========
    /// Liveness check.
    Ping,

    /// Request a status line.
    GetStatus,

    /// Clear a latched fault.
    ClearFault,

    /// Engage (`true`) or release (`false`) the emergency stop.
    Estop {
        /// Emergency stop engaged
        engaged: bool,
    },

    // ========== Motion ==========
    /// Home an axis.
    Home {
        /// Axis identifier, passed through verbatim
        axis: String,
    },

    /// Move an axis to an absolute position.
    MoveAbs {
        /// Axis identifier
        axis: String,
        /// Target position
        pos: f64,
        /// Velocity
        vel: f64,
        /// Acceleration
        accel: f64,
    },

    /// Move an axis at constant velocity (negative reverses).
    MoveVel {
        /// Axis identifier
        axis: String,
        /// Velocity
        vel: f64,
    },

    /// Start jogging an axis up.
    JogUp {
        /// Axis identifier
        axis: String,
    },

    /// Start jogging an axis down.
    JogDown {
        /// Axis identifier
        axis: String,
    },

    /// Stop jogging an axis.
    JogStop {
        /// Axis identifier
        axis: String,
    },

    // ========== Actuators ==========
    /// Heater setpoint in degrees.
    HeaterSet {
        /// Setpoint
        setpoint: f64,
    },

    /// Fan PWM duty.
    SetFan {
        /// Duty, 0 (off) to 255 (full)
        pwm: u8,
    },

    /// Close (`true`) or open (`false`) the clamp.
    SetClamp {
        /// Clamp closed
        closed: bool,
    },

    /// Lower the carriage into (`true`) or out of (`false`) the water.
    SetCarriage {
        /// Carriage in the water
        in_water: bool,
    },

    // ========== Jobs and streaming ==========
    /// Start a stored job.
    StartJob {
        /// Job identifier
        job_id: String,
    },

    /// Abort the running job.
    AbortJob,

    /// Start streaming telemetry.
    StartStream {
        /// Update rate in Hz
        rate_hz: u32,
    },

    /// Stop streaming telemetry.
    StopStream,

    // ========== Test runs ==========
    /// Start a test run.
    TestStart {
        /// Speed in cm/s
        speed: f64,
        /// Stroke length in mm
        stroke_length: u32,
        /// Clamp force in grams
        clamp_force: u32,
        /// Water temperature in degrees Celsius
        water_temp: i32,
        /// Number of cycles
        cycles: u32,
    },

    /// Pause the test run.
    TestPause,

    /// Stop the test run.
    TestStop,

    /// Firmware-side test preparation.
    TestPrep,
}

fn flag(value: bool) -> u8 {
    u8::from(value)
}

impl Command {
    /// Emergency stop command
    pub fn estop(engaged: bool) -> Self {
        Command::Estop { engaged }
    }

    /// Home command for `axis`
    pub fn home(axis: impl Into<String>) -> Self {
        Command::Home { axis: axis.into() }
    }

    /// Absolute move command
    pub fn move_abs(axis: impl Into<String>, pos: f64, vel: f64, accel: f64) -> Self {
        Command::MoveAbs {
            axis: axis.into(),
            pos,
            vel,
            accel,
        }
    }

    /// Velocity move command
    pub fn move_vel(axis: impl Into<String>, vel: f64) -> Self {
        Command::MoveVel {
            axis: axis.into(),
            vel,
        }
    }

    /// Jog-up command
    pub fn jog_up(axis: impl Into<String>) -> Self {
        Command::JogUp { axis: axis.into() }
    }

    /// Jog-down command
    pub fn jog_down(axis: impl Into<String>) -> Self {
        Command::JogDown { axis: axis.into() }
    }

    /// Jog-stop command
    pub fn jog_stop(axis: impl Into<String>) -> Self {
        Command::JogStop { axis: axis.into() }
    }

    /// Heater setpoint command
    pub fn heater_set(setpoint: f64) -> Self {
        Command::HeaterSet { setpoint }
    }

    /// Fan command; `pwm` is clamped to 0..=255.
    pub fn set_fan(pwm: i64) -> Self {
        let clamped = pwm.clamp(0, u8::MAX as i64) as u8;
        Command::SetFan { pwm: clamped }
    }

    /// Clamp command
    pub fn set_clamp(closed: bool) -> Self {
        Command::SetClamp { closed }
    }

    /// Carriage command
    pub fn set_carriage(in_water: bool) -> Self {
        Command::SetCarriage { in_water }
    }

    /// Start-job command
    pub fn start_job(job_id: impl Into<String>) -> Self {
        Command::StartJob {
            job_id: job_id.into(),
        }
    }

    /// Start-stream command
    pub fn start_stream(rate_hz: u32) -> Self {
        Command::StartStream { rate_hz }
    }

    /// Test-start command from run parameters
    pub fn test_start(params: &TestParameters) -> Self {
        Command::TestStart {
            speed: params.speed_cm_s,
            stroke_length: params.stroke_length_mm,
            clamp_force: params.clamp_force_g,
            water_temp: params.water_temp_c,
            cycles: params.cycles,
        }
    }

    /// Get the verb of this command
    pub fn verb(&self) -> Verb {
        match self {
            Command::Ping => Verb::Ping,
            Command::GetStatus => Verb::GetStatus,
            Command::ClearFault => Verb::ClearFault,
            Command::Estop { .. } => Verb::Estop,
            Command::Home { .. } => Verb::Home,
            Command::MoveAbs { .. } => Verb::MoveAbs,
            Command::MoveVel { .. } => Verb::MoveVel,
            Command::JogUp { .. } => Verb::JogUp,
            Command::JogDown { .. } => Verb::JogDown,
            Command::JogStop { .. } => Verb::JogStop,
            Command::HeaterSet { .. } => Verb::HeaterSet,
            Command::SetFan { .. } => Verb::SetFan,
            Command::SetClamp { .. } => Verb::SetClamp,
            Command::SetCarriage { .. } => Verb::SetCarriage,
            Command::StartJob { .. } => Verb::StartJob,
            Command::AbortJob => Verb::AbortJob,
            Command::StartStream { .. } => Verb::StartStream,
            Command::StopStream => Verb::StopStream,
            Command::TestStart { .. } => Verb::TestStart,
            Command::TestPause => Verb::TestPause,
            Command::TestStop => Verb::TestStop,
            Command::TestPrep => Verb::TestPrep,
        }
    }

    /// The `key=value` parameters, formatted for the wire
    fn parameters(&self) -> Option<String> {
        let params = match self {
            Command::Ping
            | Command::GetStatus
            | Command::ClearFault
            | Command::AbortJob
            | Command::StopStream
            | Command::TestPause
            | Command::TestStop
            | Command::TestPrep => return None,

            Command::Estop { engaged } => format!("state={}", flag(*engaged)),
            Command::SetClamp { closed } => format!("state={}", flag(*closed)),
            Command::SetCarriage { in_water } => format!("state={}", flag(*in_water)),

            Command::Home { axis }
            | Command::JogUp { axis }
            | Command::JogDown { axis }
            | Command::JogStop { axis } => format!("axis={}", axis),

            Command::MoveAbs {
                axis,
                pos,
                vel,
                accel,
            } => format!("axis={} pos={:.3} vel={:.3} accel={:.3}", axis, pos, vel, accel),
            Command::MoveVel { axis, vel } => format!("axis={} vel={:.3}", axis, vel),

            Command::HeaterSet { setpoint } => format!("setpoint={:.1}", setpoint),
            Command::SetFan { pwm } => format!("pwm={}", pwm),

            Command::StartJob { job_id } => format!("job_id={}", job_id),
            Command::StartStream { rate_hz } => format!("rate_hz={}", rate_hz),

            Command::TestStart {
                speed,
                stroke_length,
                clamp_force,
                water_temp,
                cycles,
            } => format!(
                "speed={:.2} stroke_length={} clamp_force={} water_temp={} cycles={}",
                speed, stroke_length, clamp_force, water_temp, cycles
            ),
        };
        Some(params)
    }

    /// Get the command line without the terminator.
    pub fn to_command_string(&self) -> String {
        let verb = self.verb();
        let head = if verb.is_prefixed() {
            format!("{} {}", COMMAND_PREFIX, verb)
        } else {
            verb.to_string()
        };
        match self.parameters() {
            Some(params) => format!("{} {}", head, params),
            None => head,
        }
    }

    /// Encode the command as bytes to send, including the `\r\n` terminator.
    pub fn encode(&self) -> Vec<u8> {
        encode_line(&self.to_command_string())
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_command_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_ping_is_unprefixed() {
        assert_eq!(Command::Ping.to_command_string(), "PING");
        assert_eq!(Command::Ping.encode(), b"PING\r\n");
    }

    #[test]
    fn test_encode_parameterless_commands() {
        assert_eq!(Command::GetStatus.to_command_string(), "CMD GET_STATUS");
        assert_eq!(Command::ClearFault.to_command_string(), "CMD CLEAR_FAULT");
        assert_eq!(Command::AbortJob.to_command_string(), "CMD ABORT_JOB");
        assert_eq!(Command::StopStream.to_command_string(), "CMD STOP_STREAM");
        assert_eq!(Command::TestPause.to_command_string(), "CMD TEST_PAUSE");
        assert_eq!(Command::TestStop.to_command_string(), "CMD TEST_STOP");
        assert_eq!(Command::TestPrep.to_command_string(), "CMD TEST_PREP");
    }

    #[test]
    fn test_encode_estop() {
        assert_eq!(Command::estop(true).to_command_string(), "CMD ESTOP state=1");
        assert_eq!(Command::estop(false).to_command_string(), "CMD ESTOP state=0");
    }

    #[test]
    fn test_encode_move_abs_fixed_precision() {
        let cmd = Command::move_abs("X", 1.0, 2.5, 0.333333);
        assert_eq!(
            cmd.to_command_string(),
            "CMD MOVE_ABS axis=X pos=1.000 vel=2.500 accel=0.333"
        );
    }

    #[test]
    fn test_encode_move_vel_negative() {
        let cmd = Command::move_vel("Z", -12.3456);
        assert_eq!(cmd.to_command_string(), "CMD MOVE_VEL axis=Z vel=-12.346");
    }

    #[test]
    fn test_encode_heater_one_decimal() {
        assert_eq!(
            Command::heater_set(37.25).to_command_string(),
            "CMD HEATER_SET setpoint=37.2"
        );
        assert_eq!(
            Command::heater_set(40.0).to_command_string(),
            "CMD HEATER_SET setpoint=40.0"
        );
    }

    #[test]
    fn test_fan_pwm_is_clamped() {
        assert_eq!(Command::set_fan(-10), Command::SetFan { pwm: 0 });
        assert_eq!(Command::set_fan(300), Command::SetFan { pwm: 255 });
        assert_eq!(Command::set_fan(128), Command::SetFan { pwm: 128 });
        assert_eq!(Command::set_fan(i64::MIN), Command::SetFan { pwm: 0 });
        assert_eq!(
            Command::set_fan(300).to_command_string(),
            "CMD SET_FAN pwm=255"
        );
    }

    #[test]
    fn test_encode_axis_passthrough() {
        assert_eq!(Command::home("Z").to_command_string(), "CMD HOME axis=Z");
        assert_eq!(
            Command::jog_up("lift").to_command_string(),
            "CMD JOG_UP axis=lift"
        );
        assert_eq!(
            Command::jog_down("Z").to_command_string(),
            "CMD JOG_DOWN axis=Z"
        );
        assert_eq!(
            Command::jog_stop("Z").to_command_string(),
            "CMD JOG_STOP axis=Z"
        );
    }

    #[test]
    fn test_encode_clamp_and_carriage() {
        assert_eq!(
            Command::set_clamp(true).to_command_string(),
            "CMD SET_CLAMP state=1"
        );
        assert_eq!(
            Command::set_carriage(false).to_command_string(),
            "CMD SET_CARRIAGE state=0"
        );
    }

    #[test]
    fn test_encode_jobs_and_streaming() {
        assert_eq!(
            Command::start_job("wash-7").to_command_string(),
            "CMD START_JOB job_id=wash-7"
        );
        assert_eq!(
            Command::start_stream(20).to_command_string(),
            "CMD START_STREAM rate_hz=20"
        );
    }

    #[test]
    fn test_encode_test_start() {
        let params = TestParameters {
            speed_cm_s: 2.5,
            stroke_length_mm: 120,
            clamp_force_g: 500,
            water_temp_c: 37,
            cycles: 1000,
        };
        assert_eq!(
            Command::test_start(&params).to_command_string(),
            "CMD TEST_START speed=2.50 stroke_length=120 clamp_force=500 water_temp=37 cycles=1000"
        );
    }

    #[test]
    fn test_verb_parse() {
        assert_eq!("MOVE_ABS".parse::<Verb>(), Ok(Verb::MoveAbs));
        assert_eq!("move-abs".parse::<Verb>(), Ok(Verb::MoveAbs));
        assert_eq!(" ping ".parse::<Verb>(), Ok(Verb::Ping));
        assert_eq!(
            "FLY".parse::<Verb>(),
            Err(ParseVerbError("FLY".to_string()))
        );
    }

    #[test]
    fn test_every_verb_has_distinct_keyword() {
        let mut keywords: Vec<&str> = Verb::ALL.iter().map(Verb::as_str).collect();
        keywords.sort_unstable();
        keywords.dedup();
        assert_eq!(keywords.len(), Verb::ALL.len());
    }
}
