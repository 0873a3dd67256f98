/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! The `write` task.

use std::time::SystemTime;

use super::{ExecutionContext, StageStatus, Task};

/// What a point must provide to be driven by a [`WriteTask`].
pub trait WriteTaskTarget: Send + Sync {
    fn request_connect(&self, timestamp: SystemTime);

    fn request_disconnect(&self, timestamp: SystemTime);

    /// Drains the pending value and writes it if the connection is up.
    fn perform_write_task(&self, context: &ExecutionContext);
}

pub struct WriteTask<'a, P: ?Sized> {
    target: &'a P,
}

impl<'a, P: WriteTaskTarget + ?Sized> WriteTask<'a, P> {
    pub fn new(target: &'a P) -> Self {
        Self { target }
    }
}

impl<P: WriteTaskTarget + ?Sized> Task for WriteTask<'_, P> {
    fn prepare_pre_operational(&self, context: &ExecutionContext) -> StageStatus {
        self.target.request_connect(context.scheduled_time());

        // Flush anything scheduled before the point went live.
        self.operational(context);

        StageStatus::Ready
    }

    fn operational(&self, context: &ExecutionContext) {
        self.target.perform_write_task(context);
    }

    fn prepare_post_operational(&self, context: &ExecutionContext) -> StageStatus {
        self.target.request_disconnect(context.scheduled_time());
        StageStatus::Ready
    }
}
