/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Reference device connection.
//!
//! [`Device`] implements [`DeviceConnection`] on top of a [`Link`] (the
//! physical open/close).  It is what the binary and the integration tests
//! wire points to.
//!
//! # Policy
//! | Situation | Reaction |
//! |---|---|
//! | first `request_connect` while down | try to open the link right away |
//! | `request_connect` while down, not first | try again |
//! | last `request_disconnect` | close the link, fan out `NotConnected` |
//! | `report_error` with a connection-level error | close the link, fan out the error |
//! | `report_error` with an operation error | log only |
//! | [`maintain`](Device::maintain) while requested and down | try to open the link |
//!
//! Sinks are notified only when `connected()` actually flips, so a point can
//! never see more "no error" notifications than successful (re)connections.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::SystemTime;

use tracing::{debug, info, warn};

use crate::connection::{DeviceConnection, ErrorSink, ErrorSinkRegistry};
use crate::error::PointError;
use crate::state::StateBlock;
use crate::task::{ExecutionContext, StageStatus, Task};

/// Physical connection underneath a [`Device`].
///
/// Calls are serialised by the device.
pub trait Link: Send + Sync {
    fn open(&self) -> Result<(), PointError>;

    fn close(&self);
}

/// Published connection state of a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceSnapshot {
    /// When the link was last opened successfully.
    pub connection_time: Option<SystemTime>,
    /// Why the device is down, or `None` while connected.
    pub error: Option<PointError>,
}

impl Default for DeviceSnapshot {
    fn default() -> Self {
        Self {
            connection_time: None,
            error: Some(PointError::NotConnected),
        }
    }
}

pub struct Device {
    name: String,
    link: Arc<dyn Link>,
    /// Outstanding connect requests.  Also serialises every transition.
    requests: Mutex<usize>,
    connected: AtomicBool,
    state: StateBlock<DeviceSnapshot>,
    sinks: ErrorSinkRegistry,
}

impl Device {
    pub fn new(name: impl Into<String>, link: Arc<dyn Link>) -> Arc<Self> {
        Arc::new(Self {
            name: name.into(),
            link,
            requests: Mutex::new(0),
            connected: AtomicBool::new(false),
            state: StateBlock::default(),
            sinks: ErrorSinkRegistry::new(),
        })
    }

    pub fn snapshot(&self) -> DeviceSnapshot {
        self.state.read_snapshot()
    }

    /// Connect requests not yet matched by a disconnect request.
    pub fn connect_requests(&self) -> usize {
        *self.lock()
    }

    pub fn error_sink_count(&self) -> usize {
        self.sinks.len()
    }

    /// Re-opens the link if someone wants the device up and it is down.
    pub fn maintain(&self, timestamp: SystemTime) {
        let requests = self.lock();
        if *requests > 0 && !self.connected() {
            self.try_open(timestamp);
        }
    }

    /// The `reconnect` task that calls [`maintain`](Self::maintain) every
    /// cycle.
    pub fn reconnect_task(self: &Arc<Self>) -> DeviceTask {
        DeviceTask {
            device: Arc::downgrade(self),
        }
    }

    fn lock(&self) -> MutexGuard<'_, usize> {
        self.requests.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Caller holds `requests`.
    fn try_open(&self, timestamp: SystemTime) {
        match self.link.open() {
            Ok(()) => {
                self.state.publish(DeviceSnapshot {
                    connection_time: Some(timestamp),
                    error: None,
                });
                self.connected.store(true, Ordering::Release);
                let notified = self.sinks.notify(timestamp, None);
                info!(device = %self.name, points = notified, "device connected");
            }
            Err(error) => {
                self.state.update(|s| s.error = Some(error));
                debug!(device = %self.name, %error, "connect attempt failed");
            }
        }
    }

    /// Caller holds `requests`.
    fn drop_connection(&self, timestamp: SystemTime, error: PointError) {
        if !self.connected.swap(false, Ordering::AcqRel) {
            return;
        }
        self.link.close();
        self.state.update(|s| s.error = Some(error));
        let notified = self.sinks.notify(timestamp, Some(error));
        if error == PointError::NotConnected {
            info!(device = %self.name, points = notified, "device disconnected");
        } else {
            warn!(device = %self.name, points = notified, %error, "device connection lost");
        }
    }
}

impl DeviceConnection for Device {
    fn name(&self) -> &str {
        &self.name
    }

    fn request_connect(&self, timestamp: SystemTime) {
        let mut requests = self.lock();
        *requests += 1;
        if *requests == 1 {
            debug!(device = %self.name, "connection requested");
        }
        if !self.connected() {
            self.try_open(timestamp);
        }
    }

    fn request_disconnect(&self, timestamp: SystemTime) {
        let mut requests = self.lock();
        if *requests == 0 {
            warn!(device = %self.name, "disconnect requested without matching connect");
            return;
        }
        *requests -= 1;
        if *requests == 0 {
            self.drop_connection(timestamp, PointError::NotConnected);
        }
    }

    fn connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    fn report_error(&self, timestamp: SystemTime, error: PointError, source: &str) {
        if error.is_connection_level() {
            let _requests = self.lock();
            warn!(device = %self.name, point = source, %error, "point reported connection failure");
            self.drop_connection(timestamp, error);
        } else {
            debug!(device = %self.name, point = source, %error, "point reported operation failure");
        }
    }

    fn add_error_sink(&self, sink: Weak<dyn ErrorSink>) {
        self.sinks.add(sink);
    }
}

impl std::fmt::Debug for Device {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Device")
            .field("name", &self.name)
            .field("connected", &self.connected())
            .field("state", &self.snapshot())
            .finish()
    }
}

// ── DeviceTask ────────────────────────────────────────────────────────────────

/// Scheduler task that keeps a device's link open while it is wanted.
pub struct DeviceTask {
    device: Weak<Device>,
}

impl DeviceTask {
    pub fn device_name(&self) -> Option<String> {
        self.device.upgrade().map(|d| d.name.clone())
    }
}

impl Task for DeviceTask {
    fn prepare_pre_operational(&self, _context: &ExecutionContext) -> StageStatus {
        // Points request the connection themselves.
        StageStatus::Ready
    }

    fn operational(&self, context: &ExecutionContext) {
        if let Some(device) = self.device.upgrade() {
            device.maintain(context.scheduled_time());
        }
    }

    fn prepare_post_operational(&self, _context: &ExecutionContext) -> StageStatus {
        StageStatus::Ready
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
