/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

use std::path::PathBuf;
use std::process;
use std::time::{Duration, SystemTime};

use anyhow::{Context, Result};
use clap::Parser;
use tokio::sync::broadcast::error::RecvError;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use pollio::config::ConfigManager;
use pollio::connection::DeviceConnection;
use pollio::event::EventKind;
use pollio::point::{AttributeId, AttributeValue};
use pollio::runtime::{build_runtime, Runtime};

/// Used when no `--config` is given: one device, one input, one output.
const DEMO_CONFIG: &str = r#"
cycle_ms: 100
devices:
  demo:
    description: "Built-in demo device"
points:
  level:
    device: demo
    direction: input
    data_type: f64
    initial: 42.0
  setpoint:
    device: demo
    direction: output
    data_type: i32
"#;

// ── CLI argument definition ───────────────────────────────────────────────────

/// Runs configured I/O points against simulated devices.
///
/// Example:
///   pollio --config demos/line.yaml --cycles 50 --log-level debug
#[derive(Debug, Parser)]
#[command(
    name = "pollio",
    about = "Polled I/O point runtime over simulated devices",
    long_about = None,
)]
struct Cli {
    /// Path to the YAML device / point configuration.
    #[arg(short = 'c', long = "config")]
    config: Option<PathBuf>,

    /// Number of cycles to run; 0 runs until Ctrl-C.
    #[arg(short = 'n', long = "cycles", default_value_t = 0)]
    cycles: u64,

    /// Cycle period in milliseconds; overrides `cycle_ms` from the file.
    #[arg(long = "cycle-ms")]
    cycle_ms: Option<u64>,

    /// Log filter used when RUST_LOG is not set.
    #[arg(short = 'l', long = "log-level", default_value = "info")]
    log_level: String,
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Level is controlled by the RUST_LOG env-var (e.g. RUST_LOG=debug),
    // falling back to --log-level.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level)),
        )
        .init();

    info!("pollio starting up...");
    info!(
        config    = ?cli.config,
        cycles    = cli.cycles,
        cycle_ms  = ?cli.cycle_ms,
        "Configuration"
    );

    if let Err(e) = run(cli).await {
        error!("pollio failed: {:#}", e);
        process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    // ── Load configuration ────────────────────────────────────────────────────
    let mut config = ConfigManager::new();
    match &cli.config {
        Some(path) => config.load_from_file(path)?,
        None => {
            warn!("No configuration file provided, using the built-in demo configuration");
            config
                .load_from_str(DEMO_CONFIG)
                .context("Built-in demo configuration is invalid")?;
        }
    }

    let mut runtime = build_runtime(&config)?;
    if let Some(ms) = cli.cycle_ms {
        anyhow::ensure!(ms > 0, "--cycle-ms must be greater than zero");
        runtime.set_cycle_period(Duration::from_millis(ms));
    }

    spawn_change_loggers(&runtime);

    // ── Cycle loop ────────────────────────────────────────────────────────────
    let mut interval = tokio::time::interval(runtime.cycle_period());
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    interval.tick().await;
    runtime.start(SystemTime::now())?;

    loop {
        tokio::select! {
            _ = interval.tick() => {
                let cycle = runtime.run_cycle(SystemTime::now())?;
                drive_outputs(&runtime, cycle);
                log_points(&runtime, cycle);
                if cli.cycles != 0 && cycle >= cli.cycles {
                    info!(cycle, "cycle limit reached");
                    break;
                }
            }
            result = &mut ctrl_c => {
                result.context("Cannot listen for Ctrl-C")?;
                info!("Ctrl-C received");
                break;
            }
        }
    }

    runtime.shutdown(SystemTime::now())?;
    for (name, device) in runtime.devices() {
        info!(
            device = %name,
            connected = device.connected(),
            "final device state"
        );
    }
    info!("pollio stopped after {} cycle(s)", runtime.scheduler().cycle());
    Ok(())
}

/// Schedules the cycle number into every writable point.
fn drive_outputs(runtime: &Runtime, cycle: u64) {
    for (name, point) in runtime.points() {
        if !point.direction().is_writable() {
            continue;
        }
        let value = point.data_type().value_from_number(cycle as f64);
        if let Err(e) = point.write_attribute(AttributeId::Value, value) {
            warn!(point = %name, "cannot schedule write: {}", e);
        }
    }
}

fn log_points(runtime: &Runtime, cycle: u64) {
    for (name, point) in runtime.points() {
        let read = |attribute| point.read_attribute(attribute).ok();
        if let (
            Some(AttributeValue::Data(value)),
            Some(AttributeValue::Quality(quality)),
            Some(AttributeValue::ErrorCode(error)),
        ) = (
            read(AttributeId::Value),
            read(AttributeId::Quality),
            read(AttributeId::Error),
        ) {
            debug!(cycle, point = %name, %value, ?quality, error, "snapshot");
        }
    }
}

/// One tokio task per point, logging its `changed` notifications.
fn spawn_change_loggers(runtime: &Runtime) {
    for (name, point) in runtime.points() {
        let Some(event) = point.event(EventKind::Changed) else {
            continue;
        };
        let mut rx = event.subscribe();
        let name = name.clone();
        tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(notice) => info!(point = %name, at = ?notice.timestamp, "changed"),
                    Err(RecvError::Lagged(missed)) => {
                        warn!(point = %name, missed, "change logger lagging")
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        });
    }
}
