//! `starcar`: bring-up and diagnostics for the STAR car hardware layer.
//!
//! ```text
//! starcar [--config car.json] [--dev] demo          exercise both actuators
//! starcar [--config car.json] [--dev] sonar -n 10   print median distances
//! starcar [--config car.json] [--dev] state         print one car snapshot
//! ```
//!
//! `--dev` (or `DEV=1`) selects the mock driver set regardless of the
//! configuration file.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use starcar::adapters::hardware::{DynCar, build_car};
use starcar::adapters::log_sink::LogEventSink;
use starcar::adapters::mock::MockCamera;
use starcar::config::CarConfig;
use starcar::drivers::steering::DEFAULT_TURN;
use starcar::drivers::throttle::DEFAULT_STEP;

#[derive(Parser)]
#[command(name = "starcar")]
#[command(version)]
#[command(about = "STAR car actuator / sensor bring-up", long_about = None)]
struct Cli {
    /// JSON configuration file (defaults apply for missing fields)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Use the mock driver set
    #[arg(long, env = "DEV", value_parser = clap::builder::BoolishValueParser::new())]
    dev: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ramp the throttle backwards and forwards, then sweep the steering
    Demo,

    /// Print front/rear median sonar distances
    Sonar {
        /// Number of readings to print
        #[arg(short = 'n', long, default_value_t = 10)]
        count: u32,
    },

    /// Print one car-state snapshot
    State,
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => CarConfig::load(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => CarConfig::default(),
    };
    if cli.dev {
        config.development = true;
    }

    let mut car = build_car(&config).context("building car")?;
    let outcome = match cli.command {
        Commands::Demo => demo(&mut car),
        Commands::Sonar { count } => sonar(&mut car, count),
        Commands::State => state(&mut car),
    };
    finish(outcome, car.shutdown())
}

/// The command's own failure wins; a shutdown failure behind it is logged.
fn finish(outcome: Result<()>, shutdown: starcar::Result<()>) -> Result<()> {
    match (outcome, shutdown) {
        (Err(e), Err(s)) => {
            error!("shutdown after failed command also failed: {s}");
            Err(e)
        }
        (Err(e), Ok(())) => Err(e),
        (Ok(()), shutdown) => shutdown.context("shutting down"),
    }
}

fn demo(car: &mut DynCar) -> Result<()> {
    info!("--- backwards ---");
    for _ in 0..10 {
        car.throttle_mut().decelerate(DEFAULT_STEP)?;
    }
    info!("--- forwards ---");
    for _ in 0..20 {
        car.throttle_mut().accelerate(DEFAULT_STEP)?;
    }
    info!("--- stop ---");
    car.throttle_mut().reset()?;
    info!("--- left ---");
    for _ in 0..10 {
        car.steering_mut().turn_left(DEFAULT_TURN)?;
    }
    info!("--- right ---");
    for _ in 0..20 {
        car.steering_mut().turn_right(DEFAULT_TURN)?;
    }
    info!("--- reset ---");
    car.steering_mut().reset()?;
    Ok(())
}

fn sonar(car: &mut DynCar, count: u32) -> Result<()> {
    let mut camera = MockCamera::new();
    for i in 0..count {
        let state = car.get_state(&mut camera).context("reading sonars")?;
        println!(
            "{i:>3}: front {:>7.1}  rear {:>7.1}",
            state.front_distance, state.rear_distance
        );
    }
    Ok(())
}

fn state(car: &mut DynCar) -> Result<()> {
    // The camera pipeline runs in its own process; frames here are synthetic.
    let mut camera = MockCamera::new();
    let state = car
        .sample(&mut camera, &mut LogEventSink::new())
        .context("sampling car state")?;
    let (h, w, c) = state.frame.shape();
    println!("sensors: {:?}", state.sensors());
    println!("frame:   {h}x{w}x{c}");
    Ok(())
}
