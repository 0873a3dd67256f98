/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! I/O points.
//!
//! | Point | States | Tasks | Direction |
//! |---|---|---|---|
//! | [`Input<T>`] | read | `read` | `Input` |
//! | [`Output<T>`] | read + write + pending slot | `read`, `write` | `InputOutput` |
//!
//! Both register themselves as error sinks with their device connection at
//! construction, and expose discovery through [`IoPoint`]: attribute, event
//! and task names are resolved to enum ids once; reads and writes after that
//! never touch a string.

pub mod attribute;
pub mod input;
pub mod output;

pub use attribute::{Access, AttributeId, AttributeValue, INPUT_ATTRIBUTES, OUTPUT_ATTRIBUTES};
pub use input::Input;
pub use output::Output;

use std::time::SystemTime;

use tracing::warn;

use crate::connection::DeviceConnection;
use crate::error::{error_code, AccessError, PointError};
use crate::event::{Event, EventKind};
use crate::state::ReadState;
use crate::task::{TaskHandle, TaskKind};
use crate::value::{DataType, DataValue, PointValue};

// ── Transport ─────────────────────────────────────────────────────────────────

/// Reads one point's value from the device.
///
/// Called on the scheduler thread only while the connection reports itself
/// connected.
pub trait ReadChannel<T>: Send + Sync {
    fn read(&self) -> Result<T, PointError>;
}

/// Reads and writes one point's value.
pub trait WriteChannel<T>: ReadChannel<T> {
    fn write(&self, value: T) -> Result<(), PointError>;
}

// ── Direction ─────────────────────────────────────────────────────────────────

/// Outputs read back what they write, so every writable point is also
/// readable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Input,
    InputOutput,
}

impl Direction {
    pub fn is_writable(self) -> bool {
        self == Direction::InputOutput
    }
}

// ── IoPoint ───────────────────────────────────────────────────────────────────

/// Type-erased view of a point used by the surrounding framework.
pub trait IoPoint: Send + Sync {
    fn name(&self) -> &str;

    fn direction(&self) -> Direction;

    fn data_type(&self) -> DataType;

    /// Every attribute this point provides.
    fn attributes(&self) -> &'static [AttributeId];

    fn read_attribute(&self, attribute: AttributeId) -> Result<AttributeValue, AccessError>;

    /// Writes a value through an attribute.  Only `value` of a writable point
    /// accepts writes; the value is scheduled, not written synchronously.
    fn write_attribute(&self, attribute: AttributeId, value: DataValue)
        -> Result<(), AccessError>;

    fn event(&self, kind: EventKind) -> Option<&Event>;

    /// Tasks this point offers to the scheduler.
    fn task_kinds(&self) -> &'static [TaskKind];

    fn task(&self, kind: TaskKind) -> Option<TaskHandle>;

    fn access(&self, attribute: AttributeId) -> Option<Access> {
        if !self.attributes().contains(&attribute) {
            return None;
        }
        if attribute == AttributeId::Value && self.direction().is_writable() {
            Some(Access::ReadWrite)
        } else {
            Some(Access::ReadOnly)
        }
    }

    fn resolve_attribute(&self, name: &str) -> Option<AttributeId> {
        AttributeId::from_name(name).filter(|a| self.attributes().contains(a))
    }

    fn resolve_event(&self, name: &str) -> Option<&Event> {
        EventKind::from_name(name).and_then(|kind| self.event(kind))
    }

    fn resolve_task(&self, name: &str) -> Option<TaskHandle> {
        TaskKind::from_name(name).and_then(|kind| self.task(kind))
    }
}

// ── Shared read-side helpers ──────────────────────────────────────────────────

/// Runs one read and publishes the outcome; failures are also reported to
/// the device connection.
fn read_into<T: PointValue>(
    name: &str,
    device: &dyn DeviceConnection,
    state: &ReadState<T>,
    timestamp: SystemTime,
    read: impl FnOnce() -> Result<T, PointError>,
) {
    match read() {
        Ok(value) => state.update_value(timestamp, value),
        Err(error) => {
            warn!(point = name, device = device.name(), %error, "read failed");
            state.update_error(timestamp, error);
            device.report_error(timestamp, error, name);
        }
    }
}

/// Read handle for the attributes backed by a read state.
fn read_state_attribute<T: PointValue>(
    state: &ReadState<T>,
    attribute: AttributeId,
) -> Option<AttributeValue> {
    let snap = state.snapshot();
    match attribute {
        AttributeId::Value => Some(AttributeValue::Data(snap.value.into_data())),
        AttributeId::UpdateTime => Some(AttributeValue::Time(snap.update_time)),
        AttributeId::ChangeTime => Some(AttributeValue::Time(snap.change_time)),
        AttributeId::Quality => Some(AttributeValue::Quality(snap.quality)),
        AttributeId::Error => Some(AttributeValue::ErrorCode(error_code(snap.error))),
        AttributeId::WriteTime | AttributeId::WriteError => None,
    }
}

// ── Test doubles ──────────────────────────────────────────────────────────────
