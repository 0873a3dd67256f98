/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! The `read` task.

use std::time::SystemTime;

use super::{ExecutionContext, StageStatus, Task};

/// What a point must provide to be driven by a [`ReadTask`].
pub trait ReadTaskTarget: Send + Sync {
    fn request_connect(&self, timestamp: SystemTime);

    fn request_disconnect(&self, timestamp: SystemTime);

    /// Reads the value if the connection is up and publishes the outcome.
    fn perform_read_task(&self, context: &ExecutionContext);
}

pub struct ReadTask<'a, P: ?Sized> {
    target: &'a P,
}

impl<'a, P: ReadTaskTarget + ?Sized> ReadTask<'a, P> {
    pub fn new(target: &'a P) -> Self {
        Self { target }
    }
}

impl<P: ReadTaskTarget + ?Sized> Task for ReadTask<'_, P> {
    fn prepare_pre_operational(&self, context: &ExecutionContext) -> StageStatus {
        self.target.request_connect(context.scheduled_time());

        // Read once so the state is initialised before consumers see it.
        self.operational(context);

        // Ready even if the read failed: trying again right away is unlikely
        // to do any better, and the failure is already in the state.
        StageStatus::Ready
    }

    fn operational(&self, context: &ExecutionContext) {
        self.target.perform_read_task(context);
    }

    fn prepare_post_operational(&self, context: &ExecutionContext) -> StageStatus {
        self.target.request_disconnect(context.scheduled_time());
        StageStatus::Ready
    }
}
