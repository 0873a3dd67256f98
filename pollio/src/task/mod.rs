/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Per-cycle stage drivers bound to one I/O point.
//!
//! ```text
//!   PreOperational ──► Operational (every cycle) ──► PostOperational
//!   request_connect     read / drain + write          request_disconnect
//!   + one attempt
//! ```
//!
//! # Ownership model
//! A task holds nothing but a borrow of its point: [`ReadTask`] and
//! [`WriteTask`] are built on the stack for one stage call and dropped right
//! after.  The scheduler keeps a [`TaskHandle`] instead, which refers to the
//! point weakly.  The point owns all of its state; a handle whose point has
//! been dropped simply does nothing.

pub mod read;
pub mod write;

pub use read::{ReadTask, ReadTaskTarget};
pub use write::{WriteTask, WriteTaskTarget};

use std::sync::Weak;
use std::time::SystemTime;

use tracing::trace;

// ── Stage / status / context ──────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    PreOperational,
    Operational,
    PostOperational,
}

impl Stage {
    pub const ALL: [Stage; 3] = [
        Stage::PreOperational,
        Stage::Operational,
        Stage::PostOperational,
    ];
}

/// Result of a stage preparation step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageStatus {
    /// Done; the scheduler may move the task on.
    Ready,
    /// Call the stage again next cycle.
    Pending,
}

/// Per-call information supplied by the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecutionContext {
    scheduled_time: SystemTime,
    cycle: u64,
}

impl ExecutionContext {
    pub fn new(scheduled_time: SystemTime, cycle: u64) -> Self {
        Self {
            scheduled_time,
            cycle,
        }
    }

    /// The time this cycle was scheduled for; used for every timestamp the
    /// task publishes.
    pub fn scheduled_time(&self) -> SystemTime {
        self.scheduled_time
    }

    pub fn cycle(&self) -> u64 {
        self.cycle
    }
}

// ── Task ──────────────────────────────────────────────────────────────────────

/// Callbacks the scheduler invokes, at most one at a time per task.
pub trait Task: Send + Sync {
    fn stages(&self) -> &'static [Stage] {
        &Stage::ALL
    }

    /// Called once when entering the pre-operational stage.
    fn prepare_pre_operational(&self, context: &ExecutionContext) -> StageStatus;

    /// Called every cycle while the task is pre-operational.
    fn pre_operational(&self, context: &ExecutionContext) -> StageStatus {
        self.operational(context);
        StageStatus::Ready
    }

    /// Called every cycle while the task is operational.
    fn operational(&self, context: &ExecutionContext);

    /// Called once when entering the post-operational stage.
    fn prepare_post_operational(&self, context: &ExecutionContext) -> StageStatus;
}

// ── TaskKind ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskKind {
    Read,
    Write,
}

impl TaskKind {
    /// The name under which the framework resolves this task.
    pub fn name(self) -> &'static str {
        match self {
            TaskKind::Read => "read",
            TaskKind::Write => "write",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "read" => Some(TaskKind::Read),
            "write" => Some(TaskKind::Write),
            _ => None,
        }
    }
}

// ── TaskHandle ────────────────────────────────────────────────────────────────

enum Binding {
    Read(Weak<dyn ReadTaskTarget>),
    Write(Weak<dyn WriteTaskTarget>),
}

/// A task as stored by the scheduler: the point (weakly) plus which task.
pub struct TaskHandle {
    point: String,
    binding: Binding,
}

impl TaskHandle {
    pub fn read(point: impl Into<String>, target: Weak<dyn ReadTaskTarget>) -> Self {
        Self {
            point: point.into(),
            binding: Binding::Read(target),
        }
    }

    pub fn write(point: impl Into<String>, target: Weak<dyn WriteTaskTarget>) -> Self {
        Self {
            point: point.into(),
            binding: Binding::Write(target),
        }
    }

    pub fn kind(&self) -> TaskKind {
        match self.binding {
            Binding::Read(_) => TaskKind::Read,
            Binding::Write(_) => TaskKind::Write,
        }
    }

    pub fn point_name(&self) -> &str {
        &self.point
    }

    /// `"<point>.<task>"`, used in logs.
    pub fn label(&self) -> String {
        format!("{}.{}", self.point, self.kind().name())
    }

    /// Returns `false` once the point has been dropped.
    pub fn is_alive(&self) -> bool {
        match &self.binding {
            Binding::Read(w) => w.strong_count() > 0,
            Binding::Write(w) => w.strong_count() > 0,
        }
    }

    /// Runs `f` against a task borrowed from the live point, or returns
    /// `None` if the point is gone.
    fn with_task<R>(&self, f: impl FnOnce(&dyn Task) -> R) -> Option<R> {
        let result = match &self.binding {
            Binding::Read(weak) => weak.upgrade().map(|point| f(&ReadTask::new(&*point))),
            Binding::Write(weak) => weak.upgrade().map(|point| f(&WriteTask::new(&*point))),
        };
        if result.is_none() {
            trace!(point = %self.point, "point dropped, skipping task");
        }
        result
    }
}

impl std::fmt::Debug for TaskHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskHandle")
            .field("point", &self.point)
            .field("kind", &self.kind())
            .field("alive", &self.is_alive())
            .finish()
    }
}

impl Task for TaskHandle {
    fn prepare_pre_operational(&self, context: &ExecutionContext) -> StageStatus {
        self.with_task(|t| t.prepare_pre_operational(context))
            .unwrap_or(StageStatus::Ready)
    }

    fn pre_operational(&self, context: &ExecutionContext) -> StageStatus {
        self.with_task(|t| t.pre_operational(context))
            .unwrap_or(StageStatus::Ready)
    }

    fn operational(&self, context: &ExecutionContext) {
        self.with_task(|t| t.operational(context));
    }

    fn prepare_post_operational(&self, context: &ExecutionContext) -> StageStatus {
        self.with_task(|t| t.prepare_post_operational(context))
            .unwrap_or(StageStatus::Ready)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
