/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Wiring a loaded configuration into devices, points and a scheduler.
//!
//! Every configured device becomes a [`Device`] over a [`SimulatedLink`];
//! every point becomes an [`Input`] or [`Output`] of its data type over a
//! [`Register`].  Tasks are registered device first, then points in name
//! order:
//!
//! ```text
//!   plc01.reconnect   plc02.reconnect   counter.read   temperature.read
//!   valve.read        valve.write       …
//! ```
//!
//! The [`Runtime`] owns the points; the scheduler only holds weak task
//! handles.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::config::{ConfigManager, PointConfig, PointDirection};
use crate::connection::DeviceConnection;
use crate::device::Device;
use crate::point::{Input, IoPoint, Output};
use crate::scheduler::{CycleScheduler, SchedulerError};
use crate::sim::{Register, SimulatedLink, Stimulus};
use crate::task::TaskHandle;
use crate::value::{DataType, PointValue};

pub struct Runtime {
    cycle_period: Duration,
    devices: BTreeMap<String, Arc<Device>>,
    links: BTreeMap<String, Arc<SimulatedLink>>,
    points: BTreeMap<String, Arc<dyn IoPoint>>,
    registers: BTreeMap<String, Arc<dyn Stimulus>>,
    scheduler: CycleScheduler,
}

impl Runtime {
    pub fn cycle_period(&self) -> Duration {
        self.cycle_period
    }

    pub fn set_cycle_period(&mut self, period: Duration) {
        self.cycle_period = period;
    }

    pub fn device(&self, name: &str) -> Option<&Arc<Device>> {
        self.devices.get(name)
    }

    pub fn devices(&self) -> &BTreeMap<String, Arc<Device>> {
        &self.devices
    }

    /// The simulated link under `device`.
    pub fn link(&self, device: &str) -> Option<&Arc<SimulatedLink>> {
        self.links.get(device)
    }

    pub fn point(&self, name: &str) -> Option<&Arc<dyn IoPoint>> {
        self.points.get(name)
    }

    pub fn points(&self) -> &BTreeMap<String, Arc<dyn IoPoint>> {
        &self.points
    }

    /// The simulated register behind `point`.
    pub fn register(&self, point: &str) -> Option<&Arc<dyn Stimulus>> {
        self.registers.get(point)
    }

    pub fn scheduler(&self) -> &CycleScheduler {
        &self.scheduler
    }

    pub fn start(&mut self, timestamp: SystemTime) -> Result<(), SchedulerError> {
        self.scheduler.start(timestamp)
    }

    pub fn run_cycle(&mut self, timestamp: SystemTime) -> Result<u64, SchedulerError> {
        self.scheduler.run_cycle(timestamp)
    }

    pub fn shutdown(&mut self, timestamp: SystemTime) -> Result<(), SchedulerError> {
        self.scheduler.shutdown(timestamp)
    }
}

impl std::fmt::Debug for Runtime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Runtime")
            .field("cycle_period", &self.cycle_period)
            .field("devices", &self.devices.keys().collect::<Vec<_>>())
            .field("points", &self.points.keys().collect::<Vec<_>>())
            .field("scheduler", &self.scheduler)
            .finish()
    }
}

/// A built point, its register and the tasks it offers.
struct BuiltPoint {
    point: Arc<dyn IoPoint>,
    register: Arc<dyn Stimulus>,
    tasks: Vec<TaskHandle>,
}

fn build_point<T: PointValue>(config: &PointConfig, device: &Arc<Device>, fail_every: u32) -> BuiltPoint {
    let register = Arc::new(Register::new(T::from_number(config.initial)));
    register.fail_every(fail_every);
    let connection: Arc<dyn DeviceConnection> = device.clone();

    match config.direction {
        PointDirection::Input => {
            let input = Input::<T>::new(config.name.clone(), connection, register.clone());
            let tasks = vec![input.read_task()];
            BuiltPoint {
                point: input,
                register,
                tasks,
            }
        }
        PointDirection::Output => {
            let output = Output::<T>::new(config.name.clone(), connection, register.clone());
            let tasks = vec![output.read_task(), output.write_task()];
            BuiltPoint {
                point: output,
                register,
                tasks,
            }
        }
    }
}

/// Builds a runtime from a loaded configuration.
///
/// # Errors
/// The configuration is not loaded, or a task could not be registered.
pub fn build_runtime(config: &ConfigManager) -> Result<Runtime> {
    anyhow::ensure!(config.is_loaded(), "runtime configuration is not loaded");

    let mut scheduler = CycleScheduler::new();
    let mut devices = BTreeMap::new();
    let mut links = BTreeMap::new();

    for (name, device_config) in config.devices() {
        let link = Arc::new(SimulatedLink::new());
        let device = Device::new(name.clone(), link.clone());
        scheduler
            .add_task(
                format!("{name}.reconnect"),
                Box::new(device.reconnect_task()),
            )
            .with_context(|| format!("Cannot register reconnect task of device '{name}'"))?;
        debug!(device = %name, description = %device_config.description, "device built");
        devices.insert(name.clone(), device);
        links.insert(name.clone(), link);
    }

    let mut points = BTreeMap::new();
    let mut registers = BTreeMap::new();

    for (name, point_config) in config.points() {
        let device = devices
            .get(&point_config.device)
            .with_context(|| format!("point '{name}' refers to unknown device '{}'", point_config.device))?;
        let fail_every = config
            .device(&point_config.device)
            .map(|d| d.fail_after)
            .unwrap_or_default();

        let built = match point_config.data_type {
            DataType::Bool => build_point::<bool>(point_config, device, fail_every),
            DataType::I32 => build_point::<i32>(point_config, device, fail_every),
            DataType::U32 => build_point::<u32>(point_config, device, fail_every),
            DataType::F32 => build_point::<f32>(point_config, device, fail_every),
            DataType::F64 => build_point::<f64>(point_config, device, fail_every),
        };

        for task in built.tasks {
            let label = task.label();
            scheduler
                .add_task(label.clone(), Box::new(task))
                .with_context(|| format!("Cannot register task '{label}'"))?;
        }
        points.insert(name.clone(), built.point);
        registers.insert(name.clone(), built.register);
    }

    info!(
        devices = devices.len(),
        points = points.len(),
        tasks = scheduler.task_count(),
        "runtime built"
    );

    Ok(Runtime {
        cycle_period: Duration::from_millis(config.cycle_ms()),
        devices,
        links,
        points,
        registers,
        scheduler,
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────
