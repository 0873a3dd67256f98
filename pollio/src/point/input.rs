/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Input points: a read state driven by the `read` task.

use std::sync::{Arc, Weak};
use std::time::SystemTime;

use tracing::debug;

use crate::connection::{DeviceConnection, ErrorSink};
use crate::error::{AccessError, PointError};
use crate::event::{Event, EventKind};
use crate::state::{ReadSnapshot, ReadState};
use crate::task::{ExecutionContext, ReadTaskTarget, TaskHandle, TaskKind};
use crate::value::{DataType, DataValue, PointValue};

use super::{
    read_into, read_state_attribute, AttributeId, AttributeValue, Direction, IoPoint,
    ReadChannel, INPUT_ATTRIBUTES,
};

pub struct Input<T: PointValue> {
    name: String,
    this: Weak<Self>,
    device: Arc<dyn DeviceConnection>,
    channel: Arc<dyn ReadChannel<T>>,
    state: ReadState<T>,
}

impl<T: PointValue> Input<T> {
    /// Creates the input and registers it as an error sink of `device`.
    pub fn new(
        name: impl Into<String>,
        device: Arc<dyn DeviceConnection>,
        channel: Arc<dyn ReadChannel<T>>,
    ) -> Arc<Self> {
        let input = Arc::new_cyclic(|this| Self {
            name: name.into(),
            this: this.clone(),
            device,
            channel,
            state: ReadState::new(),
        });

        // Registered only once the Arc exists, so a transition fanned out
        // from another thread can never find a dead weak reference.
        let sink: Weak<dyn ErrorSink> = input.this.clone();
        input.device.add_error_sink(sink);

        debug!(
            point = %input.name,
            device = input.device.name(),
            data_type = %T::DATA_TYPE,
            "input created"
        );
        input
    }

    /// The last published value (may be stale; check [`snapshot`](Self::snapshot)).
    pub fn value(&self) -> T {
        self.state.snapshot().value
    }

    pub fn snapshot(&self) -> ReadSnapshot<T> {
        self.state.snapshot()
    }

    pub fn state(&self) -> &ReadState<T> {
        &self.state
    }

    pub fn read_task(&self) -> TaskHandle {
        let target: Weak<dyn ReadTaskTarget> = self.this.clone();
        TaskHandle::read(self.name.clone(), target)
    }

    fn read(&self, timestamp: SystemTime) {
        read_into(&self.name, &*self.device, &self.state, timestamp, || {
            self.channel.read()
        });
    }
}

impl<T: PointValue> ReadTaskTarget for Input<T> {
    fn request_connect(&self, timestamp: SystemTime) {
        self.device.request_connect(timestamp);
    }

    fn request_disconnect(&self, timestamp: SystemTime) {
        self.device.request_disconnect(timestamp);
    }

    fn perform_read_task(&self, context: &ExecutionContext) {
        // While disconnected the state keeps whatever the connection last
        // told us; there is nothing to read.
        if !self.device.connected() {
            return;
        }
        self.read(context.scheduled_time());
    }
}

impl<T: PointValue> ErrorSink for Input<T> {
    fn connection_state_changed(&self, timestamp: SystemTime, error: Option<PointError>) {
        // Not reported back to the device: that is where this came from.
        self.state.update_connection(timestamp, error);
    }
}

impl<T: PointValue> IoPoint for Input<T> {
    fn name(&self) -> &str {
        &self.name
    }

    fn direction(&self) -> Direction {
        Direction::Input
    }

    fn data_type(&self) -> DataType {
        T::DATA_TYPE
    }

    fn attributes(&self) -> &'static [AttributeId] {
        INPUT_ATTRIBUTES
    }

    fn read_attribute(&self, attribute: AttributeId) -> Result<AttributeValue, AccessError> {
        read_state_attribute(&self.state, attribute).ok_or_else(|| AccessError::NotSupported {
            point: self.name.clone(),
            attribute,
        })
    }

    fn write_attribute(&self, attribute: AttributeId, _value: DataValue) -> Result<(), AccessError> {
        if INPUT_ATTRIBUTES.contains(&attribute) {
            Err(AccessError::ReadOnly {
                point: self.name.clone(),
                attribute,
            })
        } else {
            Err(AccessError::NotSupported {
                point: self.name.clone(),
                attribute,
            })
        }
    }

    fn event(&self, kind: EventKind) -> Option<&Event> {
        self.state.event(kind)
    }

    fn task_kinds(&self) -> &'static [TaskKind] {
        &[TaskKind::Read]
    }

    fn task(&self, kind: TaskKind) -> Option<TaskHandle> {
        match kind {
            TaskKind::Read => Some(self.read_task()),
            TaskKind::Write => None,
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
