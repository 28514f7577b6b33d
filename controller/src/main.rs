//! Cartreader daemon
//!
//! Bridges the cartridge reader on the serial port to the emulation
//! frontend. Runs until SIGINT/SIGTERM or until the serial link fails.
//!
//! # Usage
//!
//! ```bash
//! # Defaults, or ~/.config/cartreader/config.toml when present
//! cartreader
//!
//! # Different port, debug logging
//! cartreader --device /dev/ttyUSB0 --verbose
//!
//! # Dump the effective configuration as TOML
//! cartreader --print-config
//! ```

use std::path::PathBuf;
use std::sync::mpsc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;

use cartreader::{
    HostSystem, RomDetailsFile, ShellLauncher, SysProcessControl, TemperatureSource, gpio, link,
    sensor, signals,
};
use cartreader_core::validator::{FsRomStore, Validator};
use cartreader_core::{Config, Controller, Dispatcher, Sequencer, config, transport};

/// Cartridge reader controller for RetroPie
#[derive(Parser)]
#[command(name = "cartreader")]
#[command(about = "Cartridge reader controller for RetroPie")]
#[command(version)]
struct Cli {
    /// Configuration file (default: platform config dir)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Serial device, overrides the configuration
    #[arg(short, long)]
    device: Option<String>,

    /// Log at debug level unless RUST_LOG is set
    #[arg(short, long)]
    verbose: bool,

    /// Print the effective configuration and exit
    #[arg(long)]
    print_config: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .init();

    let mut config = config::load(cli.config.as_deref()).context("Failed to load configuration")?;
    if let Some(device) = cli.device {
        config.link.device = device;
    }

    if cli.print_config {
        print!("{}", config.to_toml());
        return Ok(());
    }

    run(config)
}

fn run(config: Config) -> Result<()> {
    let (reader, writer) = link::open(&config.link)?;
    let (events, queue) = mpsc::channel();

    let dispatcher = Dispatcher::new(
        Validator::new(
            config.supported_systems(),
            config.paths.roms_root.clone(),
            config.launch.emulator_command.clone(),
        ),
        Box::new(FsRomStore),
        config.policy.failed_read,
    );
    let sequencer = Sequencer::new(
        config.sequencer_settings(),
        Box::new(SysProcessControl::from_config(&config)),
        Box::new(ShellLauncher::from_config(&config)),
        Box::new(RomDetailsFile::from_config(&config)),
    );
    let mut controller = Controller::new(
        dispatcher,
        sequencer,
        Box::new(writer),
        Box::new(HostSystem::from_config(&config)),
    );

    if config.fan.enabled {
        match TemperatureSource::detect() {
            Some(source) => {
                tracing::info!(?source, "Fan control enabled");
                controller = controller.with_fan(config.fan_controller());
                sensor::spawn_poller(
                    source,
                    Duration::from_secs(config.fan.poll_interval_secs),
                    events.clone(),
                );
            }
            None => tracing::warn!("No temperature source found, fan control disabled"),
        }
    }

    // Held for the lifetime of the loop; dropping releases the liveness pin
    let _pins = gpio::attach(&config.gpio, events.clone()).context("Failed to set up GPIO")?;
    signals::spawn_listener(events.clone()).context("Failed to start signal listener")?;
    transport::spawn_reader(reader, events);

    controller
        .announce_ready()
        .context("Failed to announce ready")?;
    tracing::info!(systems = config.systems.supported.len(), "Waiting for cartridges");

    controller.run(&queue)?;
    tracing::info!("Controller stopped");
    Ok(())
}
