/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Runtime configuration loading and management.
//!
//! The expected YAML structure is:
//! ```yaml
//! cycle_ms: 100
//! devices:
//!   plc01:
//!     description: "Line controller"
//!     fail_after: 0
//! points:
//!   temperature:
//!     device: plc01
//!     direction: input
//!     data_type: f64
//!     initial: 20.5
//! ```
//!
//! Maps are kept in `BTreeMap`s so that iteration order, and therefore task
//! order in the scheduler, is alphabetical and repeatable.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::value::DataType;

/// Cycle period used when the file does not set `cycle_ms`.
pub const DEFAULT_CYCLE_MS: u64 = 100;

// ── Private YAML deserialization types ────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    #[serde(default = "default_cycle_ms")]
    cycle_ms: u64,
    #[serde(default)]
    devices: BTreeMap<String, DeviceEntry>,
    #[serde(default)]
    points: BTreeMap<String, PointEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct DeviceEntry {
    description: Option<String>,
    /// Every n-th read of every register on this device fails.
    #[serde(default)]
    fail_after: u32,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct PointEntry {
    device: String,
    direction: PointDirection,
    data_type: DataType,
    initial: Option<f64>,
}

fn default_cycle_ms() -> u64 {
    DEFAULT_CYCLE_MS
}

// ── Public data structures ────────────────────────────────────────────────────

/// Which kind of point a configuration entry creates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PointDirection {
    /// An [`Input`](crate::point::Input): read task only.
    Input,
    /// An [`Output`](crate::point::Output): read and write tasks.
    Output,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeviceConfig {
    pub name: String,
    pub description: String,
    /// `0` = never fail.
    pub fail_after: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PointConfig {
    pub name: String,
    pub device: String,
    pub direction: PointDirection,
    pub data_type: DataType,
    /// Initial register value; `0` when absent.
    pub initial: f64,
}

// ── ConfigManager ─────────────────────────────────────────────────────────────

#[derive(Debug)]
pub struct ConfigManager {
    cycle_ms: u64,
    devices: BTreeMap<String, DeviceConfig>,
    points: BTreeMap<String, PointConfig>,
    /// Set after a successful load.
    loaded: bool,
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self {
            cycle_ms: DEFAULT_CYCLE_MS,
            devices: BTreeMap::new(),
            points: BTreeMap::new(),
            loaded: false,
        }
    }
}

impl ConfigManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses `path` and replaces everything previously loaded.
    ///
    /// # Errors
    /// The file cannot be read, the YAML is invalid (including an unknown
    /// `data_type` or `direction`), or a point names an undeclared device.
    /// On error the manager is left empty and not loaded.
    pub fn load_from_file(&mut self, path: &Path) -> Result<()> {
        info!("Loading runtime configuration from: {}", path.display());
        self.reset();

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Cannot open configuration file: {}", path.display()))?;

        self.load_from_str(&content)
            .with_context(|| format!("Invalid configuration file: {}", path.display()))
    }

    /// Same as [`load_from_file`](Self::load_from_file) for YAML already in
    /// memory.
    pub fn load_from_str(&mut self, content: &str) -> Result<()> {
        self.reset();

        let file: ConfigFile =
            serde_yaml::from_str(content).context("Failed to parse YAML configuration")?;

        if file.cycle_ms == 0 {
            bail!("cycle_ms must be greater than zero");
        }

        for (name, entry) in &file.points {
            if !file.devices.contains_key(&entry.device) {
                bail!("point '{}' refers to unknown device '{}'", name, entry.device);
            }
        }

        for (name, entry) in file.devices {
            let device = DeviceConfig {
                name: name.clone(),
                description: entry.description.unwrap_or_default(),
                fail_after: entry.fail_after,
            };
            debug!(
                "  Device: {} | fail_after: {} | {}",
                device.name, device.fail_after, device.description
            );
            self.devices.insert(name, device);
        }

        for (name, entry) in file.points {
            let point = PointConfig {
                name: name.clone(),
                device: entry.device,
                direction: entry.direction,
                data_type: entry.data_type,
                initial: entry.initial.unwrap_or_default(),
            };
            debug!(
                "  Point: {} | device: {} | {:?} {}",
                point.name, point.device, point.direction, point.data_type
            );
            self.points.insert(name, point);
        }

        if self.points.is_empty() {
            warn!("No points found in configuration; the scheduler will only run device tasks");
        }

        self.cycle_ms = file.cycle_ms;
        self.loaded = true;

        info!(
            cycle_ms = self.cycle_ms,
            devices = self.devices.len(),
            points = self.points.len(),
            "Successfully loaded runtime configuration"
        );
        Ok(())
    }

    fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn cycle_ms(&self) -> u64 {
        self.cycle_ms
    }

    pub fn device(&self, name: &str) -> Option<&DeviceConfig> {
        self.devices.get(name)
    }

    pub fn devices(&self) -> &BTreeMap<String, DeviceConfig> {
        &self.devices
    }

    pub fn point(&self, name: &str) -> Option<&PointConfig> {
        self.points.get(name)
    }

    pub fn points(&self) -> &BTreeMap<String, PointConfig> {
        &self.points
    }

    /// Points wired to `device`, in name order.
    pub fn points_of<'a>(&'a self, device: &'a str) -> impl Iterator<Item = &'a PointConfig> {
        self.points.values().filter(move |p| p.device == device)
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    /// Helper: write a YAML string to a temp file and return it.
    fn yaml_tempfile(content: &str) -> NamedTempFile {
        let mut f = NamedTempFile::new().unwrap();
        f.write_all(content.as_bytes()).unwrap();
        f
    }

    const LINE: &str = r#"
cycle_ms: 50
devices:
  plc01:
    description: "Line controller"
  plc02:
    fail_after: 4
points:
  temperature:
    device: plc01
    direction: input
    data_type: f64
    initial: 20.5
  valve:
    device: plc01
    direction: output
    data_type: bool
  counter:
    device: plc02
    direction: input
    data_type: u32
"#;

    #[test]
    fn load_full_yaml() {
        let f = yaml_tempfile(LINE);
        let mut mgr = ConfigManager::new();
        mgr.load_from_file(f.path()).unwrap();

        assert!(mgr.is_loaded());
        assert_eq!(mgr.cycle_ms(), 50);
        assert_eq!(mgr.devices().len(), 2);
        assert_eq!(mgr.points().len(), 3);

        let plc01 = mgr.device("plc01").unwrap();
        assert_eq!(plc01.description, "Line controller");
        assert_eq!(plc01.fail_after, 0);
        assert_eq!(mgr.device("plc02").unwrap().fail_after, 4);

        let temp = mgr.point("temperature").unwrap();
        assert_eq!(temp.direction, PointDirection::Input);
        assert_eq!(temp.data_type, DataType::F64);
        assert_eq!(temp.initial, 20.5);

        let valve = mgr.point("valve").unwrap();
        assert_eq!(valve.direction, PointDirection::Output);
        assert_eq!(valve.initial, 0.0, "absent initial defaults to zero");

        let names: Vec<_> = mgr.points_of("plc01").map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["temperature", "valve"]);
    }

    #[test]
    fn cycle_ms_defaults_when_absent() {
        let mut mgr = ConfigManager::new();
        mgr.load_from_str("devices: {}\n").unwrap();
        assert_eq!(mgr.cycle_ms(), DEFAULT_CYCLE_MS);
        assert!(mgr.points().is_empty());
    }

    #[test]
    fn unknown_device_is_rejected() {
        let yaml = r#"
devices: {}
points:
  p:
    device: ghost
    direction: input
    data_type: i32
"#;
        let mut mgr = ConfigManager::new();
        let err = mgr.load_from_str(yaml).unwrap_err();
        assert!(err.to_string().contains("ghost"));
        assert!(!mgr.is_loaded());
    }

    #[test]
    fn unknown_data_type_is_rejected() {
        let yaml = r#"
devices:
  d: {}
points:
  p:
    device: d
    direction: input
    data_type: string
"#;
        let mut mgr = ConfigManager::new();
        assert!(mgr.load_from_str(yaml).is_err());
    }

    #[test]
    fn zero_cycle_is_rejected() {
        let mut mgr = ConfigManager::new();
        assert!(mgr.load_from_str("cycle_ms: 0\n").is_err());
    }

    #[test]
    fn missing_file_returns_error() {
        let mut mgr = ConfigManager::new();
        let result = mgr.load_from_file(Path::new("/nonexistent/path/pollio.yaml"));
        assert!(result.is_err());
        assert!(!mgr.is_loaded());
    }

    #[test]
    fn malformed_yaml_returns_error() {
        let f = yaml_tempfile("this is: not: valid: yaml: content:::");
        let mut mgr = ConfigManager::new();
        assert!(mgr.load_from_file(f.path()).is_err());
        assert!(!mgr.is_loaded());
    }

    #[test]
    fn reload_replaces_previous_configuration() {
        let f1 = yaml_tempfile(LINE);
        let f2 = yaml_tempfile("cycle_ms: 10\ndevices:\n  other: {}\n");

        let mut mgr = ConfigManager::new();
        mgr.load_from_file(f1.path()).unwrap();
        assert!(mgr.point("temperature").is_some());

        mgr.load_from_file(f2.path()).unwrap();
        assert!(mgr.point("temperature").is_none(), "old points must be gone");
        assert!(mgr.device("plc01").is_none());
        assert_eq!(mgr.cycle_ms(), 10);
    }

    #[test]
    fn failed_reload_leaves_manager_empty() {
        let f = yaml_tempfile(LINE);
        let mut mgr = ConfigManager::new();
        mgr.load_from_file(f.path()).unwrap();

        assert!(mgr.load_from_str("cycle_ms: 0\n").is_err());
        assert!(!mgr.is_loaded());
        assert!(mgr.points().is_empty());
    }
}
