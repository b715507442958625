//! # SCARA Controller
//!
//! Reads one command per line from the serial link, drives the three stepper
//! axes and the gripper servo, and answers on the same link.
//!
//! Runs against the simulated HAL; `--simulate-travel` makes it trip the
//! travel limits when an axis leaves the configured workspace.

use clap::Parser;
use scara_common::config::{ConfigError, ConfigLoader, ControllerConfig, LogLevel};
use scara_common::consts::DEFAULT_CONFIG_PATH;
use scara_common::units::UnitConverter;
use scara_controller::controller::Controller;
use scara_controller::cycle::CycleRunner;
use scara_controller::hal::SimulatedHal;
use scara_controller::link::SerialLink;
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::{error, info, warn, Level};
use tracing_subscriber::EnvFilter;

/// SCARA Controller: motion control and serial command protocol
#[derive(Parser, Debug)]
#[command(name = "scara_controller")]
#[command(version)]
#[command(about = "Non-blocking SCARA motion controller with a line-based serial protocol")]
struct Args {
    /// Path to the controller configuration TOML.
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Serial device; `-` uses stdin/stdout. Overrides `[serial] port`.
    #[arg(short, long)]
    port: Option<String>,

    /// Trip the simulated travel limits outside the workspace.
    #[arg(long)]
    simulate_travel: bool,

    /// Print the effective configuration as TOML and exit.
    #[arg(long)]
    print_config: bool,

    /// Enable verbose logging (DEBUG level).
    #[arg(short, long)]
    verbose: bool,

    /// Output logs in JSON format.
    #[arg(long)]
    json: bool,
}

fn main() {
    let args = Args::parse();
    let config = load_config(&args);
    setup_tracing(&args, config.as_ref().map(|c| c.shared.log_level).ok());

    info!("SCARA Controller v{} starting...", env!("CARGO_PKG_VERSION"));

    let result = config
        .map_err(|e| Box::new(e) as Box<dyn std::error::Error>)
        .and_then(|config| run(&args, config));
    if let Err(e) = result {
        error!("FATAL: {e}");
        process::exit(1);
    }

    info!("SCARA Controller shutdown complete");
}

/// A missing file at the default path means "run on defaults"; anything else
/// the operator pointed at must load.
fn load_config(args: &Args) -> Result<ControllerConfig, ConfigError> {
    match ControllerConfig::load(&args.config) {
        Err(ConfigError::FileNotFound) if args.config.as_os_str() == DEFAULT_CONFIG_PATH => {
            Ok(ControllerConfig::default())
        }
        other => other,
    }
}

fn run(args: &Args, mut config: ControllerConfig) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(port) = &args.port {
        config.serial.port = port.clone();
    }
    config.validate()?;

    if args.print_config {
        print!("{}", config.to_toml_string()?);
        return Ok(());
    }

    info!(
        "Config OK: service={}, port={}, baud={}, cycle_time={}µs",
        config.shared.service_name,
        config.serial.port,
        config.serial.baud_rate,
        config.cycle.cycle_time_us,
    );

    let mut hal = SimulatedHal::new();
    if args.simulate_travel {
        hal = hal.with_travel(&config.workspace, &UnitConverter::new(&config.mechanics));
        info!("Simulated travel limits enabled");
    } else {
        warn!("Simulated HAL without travel limits");
    }

    let controller = Controller::new(&config)?;
    let link = SerialLink::open(&config.serial.port, config.serial.baud_rate)?;

    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        info!("Received shutdown signal");
        r.store(false, Ordering::SeqCst);
    })?;

    let mut runner = CycleRunner::new(
        controller,
        hal,
        link,
        Duration::from_micros(config.cycle.cycle_time_us),
        running,
    )?;
    if let Err(e) = runner.run() {
        error!("Control loop error: {e}");
        return Err(Box::new(e) as Box<dyn std::error::Error>);
    }

    Ok(())
}

fn setup_tracing(args: &Args, configured: Option<LogLevel>) {
    let level = if args.verbose {
        Level::DEBUG
    } else {
        match configured.unwrap_or_default() {
            LogLevel::Trace => Level::TRACE,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Info => Level::INFO,
            LogLevel::Warn => Level::WARN,
            LogLevel::Error => Level::ERROR,
        }
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    // stdout may be the serial link; logs always go to stderr.
    if args.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .compact()
            .init();
    }
}
