/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Output points: read back like an input, plus a write state and a
//! last-write-wins pending value drained by the `write` task.

use std::sync::{Arc, Weak};
use std::time::SystemTime;

use tracing::{debug, warn};

use crate::connection::{DeviceConnection, ErrorSink};
use crate::error::{error_code, AccessError, PointError};
use crate::event::{Event, EventKind};
use crate::slot::PendingSlot;
use crate::state::{ReadSnapshot, ReadState, WriteSnapshot, WriteState};
use crate::task::{
    ExecutionContext, ReadTaskTarget, TaskHandle, TaskKind, WriteTaskTarget,
};
use crate::value::{DataType, DataValue, PointValue};

use super::{
    read_into, read_state_attribute, AttributeId, AttributeValue, Direction, IoPoint,
    WriteChannel, OUTPUT_ATTRIBUTES,
};

pub struct Output<T: PointValue> {
    name: String,
    this: Weak<Self>,
    device: Arc<dyn DeviceConnection>,
    channel: Arc<dyn WriteChannel<T>>,
    read_state: ReadState<T>,
    write_state: WriteState,
    pending: PendingSlot<T>,
}

impl<T: PointValue> Output<T> {
    /// Creates the output and registers it as an error sink of `device`.
    pub fn new(
        name: impl Into<String>,
        device: Arc<dyn DeviceConnection>,
        channel: Arc<dyn WriteChannel<T>>,
    ) -> Arc<Self> {
        let output = Arc::new_cyclic(|this| Self {
            name: name.into(),
            this: this.clone(),
            device,
            channel,
            read_state: ReadState::new(),
            write_state: WriteState::new(),
            pending: PendingSlot::new(),
        });

        let sink: Weak<dyn ErrorSink> = output.this.clone();
        output.device.add_error_sink(sink);

        debug!(
            point = %output.name,
            device = output.device.name(),
            data_type = %T::DATA_TYPE,
            "output created"
        );
        output
    }

    /// Schedules `value` to be written by the next `write` cycle.
    ///
    /// Callable from any thread; replaces a value that has not been written
    /// yet.
    pub fn write(&self, value: T) {
        self.pending.enqueue(value);
    }

    /// `true` while a scheduled value waits for the `write` task.
    pub fn has_pending_write(&self) -> bool {
        self.pending.is_pending()
    }

    /// The last value read back from the device.
    pub fn value(&self) -> T {
        self.read_state.snapshot().value
    }

    pub fn snapshot(&self) -> ReadSnapshot<T> {
        self.read_state.snapshot()
    }

    pub fn write_snapshot(&self) -> WriteSnapshot {
        self.write_state.snapshot()
    }

    pub fn read_state(&self) -> &ReadState<T> {
        &self.read_state
    }

    pub fn write_state(&self) -> &WriteState {
        &self.write_state
    }

    pub fn read_task(&self) -> TaskHandle {
        let target: Weak<dyn ReadTaskTarget> = self.this.clone();
        TaskHandle::read(self.name.clone(), target)
    }

    pub fn write_task(&self) -> TaskHandle {
        let target: Weak<dyn WriteTaskTarget> = self.this.clone();
        TaskHandle::write(self.name.clone(), target)
    }

    fn transmit(&self, timestamp: SystemTime, value: T) {
        match self.channel.write(value) {
            Ok(()) => self.write_state.update(timestamp, Ok(())),
            Err(error) => self.handle_write_error(timestamp, error),
        }
    }

    fn handle_write_error(&self, timestamp: SystemTime, error: PointError) {
        warn!(point = %self.name, device = self.device.name(), %error, "write failed");
        self.write_state.update(timestamp, Err(error));
        self.device.report_error(timestamp, error, &self.name);
    }
}

impl<T: PointValue> ReadTaskTarget for Output<T> {
    fn request_connect(&self, timestamp: SystemTime) {
        self.device.request_connect(timestamp);
    }

    fn request_disconnect(&self, timestamp: SystemTime) {
        self.device.request_disconnect(timestamp);
    }

    fn perform_read_task(&self, context: &ExecutionContext) {
        if !self.device.connected() {
            return;
        }
        read_into(
            &self.name,
            &*self.device,
            &self.read_state,
            context.scheduled_time(),
            || self.channel.read(),
        );
    }
}

impl<T: PointValue> WriteTaskTarget for Output<T> {
    fn request_connect(&self, timestamp: SystemTime) {
        self.device.request_connect(timestamp);
    }

    fn request_disconnect(&self, timestamp: SystemTime) {
        self.device.request_disconnect(timestamp);
    }

    fn perform_write_task(&self, context: &ExecutionContext) {
        let Some(value) = self.pending.dequeue() else {
            return;
        };

        // Pending values are not kept across a disconnected period: the
        // value is consumed here and never written.
        if !self.device.connected() {
            debug!(point = %self.name, ?value, "device not connected, dropping pending write");
            return;
        }

        self.transmit(context.scheduled_time(), value);
    }
}

impl<T: PointValue> ErrorSink for Output<T> {
    fn connection_state_changed(&self, timestamp: SystemTime, error: Option<PointError>) {
        // Only the read state mirrors the connection; the write state holds
        // the result of the last write, which a connection error does not
        // change.
        self.read_state.update_connection(timestamp, error);
    }
}

impl<T: PointValue> IoPoint for Output<T> {
    fn name(&self) -> &str {
        &self.name
    }

    fn direction(&self) -> Direction {
        Direction::InputOutput
    }

    fn data_type(&self) -> DataType {
        T::DATA_TYPE
    }

    fn attributes(&self) -> &'static [AttributeId] {
        OUTPUT_ATTRIBUTES
    }

    fn read_attribute(&self, attribute: AttributeId) -> Result<AttributeValue, AccessError> {
        match attribute {
            AttributeId::WriteTime => Ok(AttributeValue::Time(self.write_snapshot().write_time)),
            AttributeId::WriteError => Ok(AttributeValue::ErrorCode(error_code(
                self.write_snapshot().write_error,
            ))),
            other => read_state_attribute(&self.read_state, other).ok_or_else(|| {
                AccessError::NotSupported {
                    point: self.name.clone(),
                    attribute: other,
                }
            }),
        }
    }

    fn write_attribute(&self, attribute: AttributeId, value: DataValue) -> Result<(), AccessError> {
        if attribute != AttributeId::Value {
            return Err(AccessError::ReadOnly {
                point: self.name.clone(),
                attribute,
            });
        }
        let value = T::from_data(value).ok_or_else(|| AccessError::TypeMismatch {
            point: self.name.clone(),
            expected: T::DATA_TYPE,
            actual: value.data_type(),
        })?;
        self.write(value);
        Ok(())
    }

    fn event(&self, kind: EventKind) -> Option<&Event> {
        self.read_state
            .event(kind)
            .or_else(|| self.write_state.event(kind))
    }

    fn task_kinds(&self) -> &'static [TaskKind] {
        &[TaskKind::Read, TaskKind::Write]
    }

    fn task(&self, kind: TaskKind) -> Option<TaskHandle> {
        match kind {
            TaskKind::Read => Some(self.read_task()),
            TaskKind::Write => Some(self.write_task()),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
