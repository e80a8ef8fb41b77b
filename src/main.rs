use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rigkit::cli::{parse_command, ports_json, resolve_config};
use rigkit::{init_logging, list_ports, Config, LinkEvent, RigController, TestParameters, TestSequencer};
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::broadcast::{self, error::RecvError};

#[derive(Parser)]
#[command(name = "rigkit", version)]
#[command(long_version = concat!(env!("CARGO_PKG_VERSION"), " (built ", env!("BUILD_DATE"), ")"))]
#[command(about = "Command and telemetry client for the test rig controller", long_about = None)]
struct Cli {
    /// Serial port (overrides the config file)
    #[arg(long, global = true)]
    port: Option<String>,

    /// Baud rate (overrides the config file)
    #[arg(long, global = true)]
    baud: Option<u32>,

    /// Config file (.toml or .json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List candidate serial ports
    Ports {
        /// Print the listing as JSON
        #[arg(long)]
        json: bool,
    },

    /// Send one command, e.g. `send MOVE_ABS axis=X pos=10 vel=5 accel=1`
    Send {
        /// Command verb
        verb: String,

        /// Parameters as key=value
        args: Vec<String>,

        /// How long to print replies, in milliseconds
        #[arg(long, default_value = "500")]
        wait: u64,
    },

    /// Send a raw text line
    Raw {
        /// Line to send; CRLF is appended
        line: String,

        /// How long to print replies, in milliseconds
        #[arg(long, default_value = "500")]
        wait: u64,
    },

    /// Print received lines until Ctrl-C
    Monitor {
        /// Stop after this many seconds
        #[arg(long)]
        duration: Option<u64>,
    },

    /// Move the carriage out of the water and home
    Prep {
        /// Axis to home (overrides the config file)
        #[arg(long)]
        axis: Option<String>,
    },

    /// Start a test run
    TestStart {
        /// Carriage speed in cm/s
        #[arg(long)]
        speed: f64,

        /// Stroke length in mm
        #[arg(long)]
        stroke_length: u32,

        /// Clamp force in grams
        #[arg(long)]
        clamp_force: u32,

        /// Water temperature in degrees Celsius
        #[arg(long, allow_negative_numbers = true)]
        water_temp: i32,

        /// Number of cycles
        #[arg(long)]
        cycles: u32,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging()?;

    let cli = Cli::parse();
    if let Commands::Ports { json } = cli.command {
        return print_ports(json);
    }

    let config = resolve_config(cli.config.as_deref(), cli.port, cli.baud)?;

    match cli.command {
        Commands::Ports { .. } => Ok(()),
        Commands::Send { verb, args, wait } => {
            let command = parse_command(&verb, &args)?;
            let (controller, mut rx) = connect(&config)?;
            controller.send(&command)?;
            print_events(&mut rx, Some(Duration::from_millis(wait))).await;
            Ok(())
        }
        Commands::Raw { line, wait } => {
            let (controller, mut rx) = connect(&config)?;
            controller.send_line(&line)?;
            print_events(&mut rx, Some(Duration::from_millis(wait))).await;
            Ok(())
        }
        Commands::Monitor { duration } => {
            let (_controller, mut rx) = connect(&config)?;
            print_events(&mut rx, duration.map(Duration::from_secs)).await;
            Ok(())
        }
        Commands::Prep { axis } => {
            let (controller, mut rx) = connect(&config)?;
            let axis = axis.unwrap_or_else(|| config.sequencer.homing_axis.clone());
            TestSequencer::new(&controller)
                .with_homing_axis(axis)
                .prepare_test_run()?;
            print_events(&mut rx, Some(Duration::from_millis(500))).await;
            Ok(())
        }
        Commands::TestStart {
            speed,
            stroke_length,
            clamp_force,
            water_temp,
            cycles,
        } => {
            let params = TestParameters {
                speed_cm_s: speed,
                stroke_length_mm: stroke_length,
                clamp_force_g: clamp_force,
                water_temp_c: water_temp,
                cycles,
            };
            let (controller, mut rx) = connect(&config)?;
            TestSequencer::new(&controller).start_test(&params)?;
            print_events(&mut rx, Some(Duration::from_millis(500))).await;
            Ok(())
        }
    }
}

fn print_ports(json: bool) -> Result<()> {
    let ports = list_ports().context("Failed to enumerate serial ports")?;
    if json {
        println!("{}", ports_json(&ports)?);
        return Ok(());
    }
    if ports.is_empty() {
        println!("No serial ports found");
    }
    for port in ports {
        match (port.vid, port.pid) {
            (Some(vid), Some(pid)) => println!(
                "{}\t{}\t{:04x}:{:04x}",
                port.port_name, port.description, vid, pid
            ),
            _ => println!("{}\t{}", port.port_name, port.description),
        }
    }
    Ok(())
}

/// Open the link, subscribing before the port opens so no line is missed
fn connect(config: &Config) -> Result<(RigController, broadcast::Receiver<LinkEvent>)> {
    let controller = RigController::serial(config.connection.clone());
    let rx = controller.events().receiver();
    controller
        .open()
        .with_context(|| format!("Failed to connect to {}", config.connection.port_name))?;
    Ok((controller, rx))
}

/// Print link events until `window` elapses (or forever), or Ctrl-C
async fn print_events(rx: &mut broadcast::Receiver<LinkEvent>, window: Option<Duration>) {
    let deadline = async {
        match window {
            Some(window) => tokio::time::sleep(window).await,
            None => std::future::pending().await,
        }
    };
    tokio::pin!(deadline);

    loop {
        tokio::select! {
            _ = &mut deadline => break,
            _ = tokio::signal::ctrl_c() => break,
            event = rx.recv() => match event {
                Ok(LinkEvent::LineReceived(line)) => println!("{}", line),
                Ok(LinkEvent::Error(reason)) => eprintln!("error: {}", reason),
                Ok(LinkEvent::ConnectionChanged) => {}
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!("Monitor lagged, {} event(s) skipped", skipped);
                }
                Err(RecvError::Closed) => break,
            },
        }
    }
}
